//! fingerprint-based similarity search over a CSV of molecules: parse a
//! query SMILES, score every parseable row with Tanimoto over Morgan
//! fingerprints, and keep the top K

use std::path::Path;

use log::{debug, info};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use thiserror::Error;

use chem::fingerprint::{tanimoto, DEFAULT_N_BITS, DEFAULT_RADIUS};
use chem::Molecule;
use table::Record;

pub mod chem;
pub mod table;

pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Error)]
pub enum Error {
    /// a query SMILES failed to parse
    #[error("{0}")]
    InvalidInput(String),

    /// the dataset is missing a required column
    #[error("{0}")]
    SchemaError(String),

    #[error("{0}")]
    Csv(#[from] csv::Error),
}

/// Morgan fingerprinting knobs shared by the scorer and the ranker
#[derive(Clone, Copy, Debug)]
pub struct FingerprintParams {
    pub radius: u32,
    pub n_bits: usize,
}

impl Default for FingerprintParams {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            n_bits: DEFAULT_N_BITS,
        }
    }
}

/// one ranked result. serialized field names follow the dataset's column
/// names so the JSON output matches the upstream consumer
#[derive(Clone, Debug, Serialize)]
pub struct Hit {
    pub index: usize,
    #[serde(rename = "SMILES_ISO")]
    pub smiles: String,
    pub similarity: f64,
    #[serde(rename = "PUBCHEM_SID")]
    pub sid: Option<i64>,
    #[serde(rename = "PUBCHEM_CID")]
    pub cid: Option<i64>,
    #[serde(rename = "Permeability")]
    pub permeability: Option<f64>,
    #[serde(rename = "Outcome")]
    pub outcome: Option<String>,
}

fn parse_mol(smiles: &str) -> Result<Molecule, Error> {
    Molecule::from_smiles(smiles).map_err(|e| Error::InvalidInput(e.to_string()))
}

fn check_params(params: FingerprintParams) -> Result<(), Error> {
    if params.n_bits == 0 {
        return Err(Error::InvalidInput(
            "fingerprint length must be at least one bit".to_owned(),
        ));
    }
    Ok(())
}

/// Tanimoto similarity between two SMILES strings. fails with
/// [Error::InvalidInput] if either side does not parse
pub fn similarity(
    smiles_a: &str,
    smiles_b: &str,
    params: FingerprintParams,
) -> Result<f64, Error> {
    check_params(params)?;
    let a = parse_mol(smiles_a)?.morgan_fingerprint(params.radius, params.n_bits);
    let b = parse_mol(smiles_b)?.morgan_fingerprint(params.radius, params.n_bits);
    Ok(tanimoto(&a, &b))
}

/// rank the dataset at `csv_path` against `query` and return the `k` most
/// similar rows, highest first. the query is validated before the table is
/// touched; rows that fail to parse are skipped, not fatal. ties keep their
/// original row order because the sort is stable
pub fn top_k_similar(
    query: &str,
    csv_path: impl AsRef<Path>,
    k: usize,
    params: FingerprintParams,
) -> Result<Vec<Hit>, Error> {
    check_params(params)?;
    let query_mol = Molecule::from_smiles(query)
        .map_err(|_| Error::InvalidInput("Invalid query SMILES".to_owned()))?;
    let query_fp = query_mol.morgan_fingerprint(params.radius, params.n_bits);

    let records = table::load_csv(csv_path)?;
    info!("scoring {} records", records.len());

    let score = |record: Record| -> Option<Hit> {
        let mol = match Molecule::from_smiles(&record.smiles) {
            Ok(mol) => mol,
            Err(e) => {
                debug!("skipping row {}: {e}", record.index);
                return None;
            }
        };
        let fp = mol.morgan_fingerprint(params.radius, params.n_bits);
        Some(Hit {
            index: record.index,
            smiles: record.smiles,
            similarity: tanimoto(&query_fp, &fp),
            sid: record.sid,
            cid: record.cid,
            permeability: record.permeability,
            outcome: record.outcome,
        })
    };

    // rayon keeps the row order through collect, so the stable sort below
    // sees rows in file order
    let mut hits: Vec<Hit> = records.into_par_iter().filter_map(score).collect();
    hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    hits.truncate(k);

    debug!("returning {} hits", hits.len());

    Ok(hits)
}
