//! CSV dataset loading. the only column that must exist is the structure
//! column; the passthrough columns are optional and parsed leniently, with
//! anything absent or unparseable carried as None

use std::path::Path;

use log::debug;

use crate::Error;

/// the required structure-notation column
pub const SMILES_COLUMN: &str = "SMILES_ISO";

const SID_COLUMN: &str = "PUBCHEM_SID";
const CID_COLUMN: &str = "PUBCHEM_CID";
const PERMEABILITY_COLUMN: &str = "Permeability";
const OUTCOME_COLUMN: &str = "PUBCHEM_ACTIVITY_OUTCOME";

/// one dataset row, keyed by its 0-based position in the file
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub index: usize,
    pub smiles: String,
    pub sid: Option<i64>,
    pub cid: Option<i64>,
    pub permeability: Option<f64>,
    pub outcome: Option<String>,
}

pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Record>, Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let smiles_idx = position(SMILES_COLUMN).ok_or_else(|| {
        Error::SchemaError(format!("CSV must contain a '{SMILES_COLUMN}' column"))
    })?;
    let sid_idx = position(SID_COLUMN);
    let cid_idx = position(CID_COLUMN);
    let permeability_idx = position(PERMEABILITY_COLUMN);
    let outcome_idx = position(OUTCOME_COLUMN);

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };
        records.push(Record {
            index,
            smiles: field(Some(smiles_idx)).unwrap_or_default().to_owned(),
            sid: field(sid_idx).and_then(|s| s.parse().ok()),
            cid: field(cid_idx).and_then(|s| s.parse().ok()),
            permeability: field(permeability_idx).and_then(|s| s.parse().ok()),
            outcome: field(outcome_idx).map(str::to_owned),
        });
    }

    debug!("loaded {} records", records.len());

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn write_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("simsearch-table-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_records() {
        let path = write_csv(
            "full.csv",
            "SMILES_ISO,PUBCHEM_SID,PUBCHEM_CID,Permeability,PUBCHEM_ACTIVITY_OUTCOME\n\
             CCO,1001,702,1.5,Active\n\
             c1ccccc1,1002,241,-0.2,Inactive\n",
        );
        let records = load_csv(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            Record {
                index: 0,
                smiles: "CCO".to_owned(),
                sid: Some(1001),
                cid: Some(702),
                permeability: Some(1.5),
                outcome: Some("Active".to_owned()),
            }
        );
        assert_eq!(records[1].index, 1);
    }

    #[test]
    fn missing_structure_column_is_a_schema_error() {
        let path = write_csv("noschema.csv", "SMILES,Permeability\nCCO,1.0\n");
        let err = load_csv(&path).unwrap_err();
        assert!(matches!(err, Error::SchemaError(_)));
        assert_eq!(
            err.to_string(),
            "CSV must contain a 'SMILES_ISO' column"
        );
    }

    #[test]
    fn passthrough_columns_are_optional_and_lenient() {
        let path = write_csv(
            "lenient.csv",
            "SMILES_ISO,PUBCHEM_SID\nCCO,not-a-number\nCCN,\n",
        );
        let records = load_csv(&path).unwrap();
        assert_eq!(records[0].sid, None);
        assert_eq!(records[1].sid, None);
        assert_eq!(records[0].cid, None);
        assert_eq!(records[0].outcome, None);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_csv("/no/such/file.csv").is_err());
    }
}
