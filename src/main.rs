use clap::Parser;
use log::trace;
use serde_json::json;
use simsearch::{top_k_similar, FingerprintParams};

/// Compute the top-K most similar molecules to a query SMILES from a CSV
/// dataset.
#[derive(Parser)]
struct Cli {
    /// The query SMILES string.
    #[arg(short, long)]
    smiles: String,

    /// The path to the CSV file containing a SMILES_ISO column.
    #[arg(short, long, default_value = "permeability.csv")]
    csv: String,

    /// Morgan fingerprinting radius.
    #[arg(short, long, default_value_t = 2)]
    radius: u32,

    /// The fingerprint length in bits.
    #[arg(short = 'b', long, default_value_t = 2048)]
    n_bits: usize,

    /// The number of results to return.
    #[arg(short = 'k', long, default_value_t = 5)]
    top: usize,

    /// The number of threads to use. Defaults to the number of logical CPUs as
    /// detected by rayon.
    #[arg(short, long, default_value_t = 0)]
    threads: usize,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
        .unwrap();

    trace!("querying {} against {}", cli.smiles, cli.csv);

    let params = FingerprintParams {
        radius: cli.radius,
        n_bits: cli.n_bits,
    };
    match top_k_similar(&cli.smiles, &cli.csv, cli.top, params) {
        Ok(results) => println!("{}", json!({ "results": results })),
        Err(e) => {
            println!("{}", json!({ "error": e.to_string() }));
            std::process::exit(1);
        }
    }
}
