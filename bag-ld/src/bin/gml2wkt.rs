//! Conversion d'un GML de panden BAG (RD) en Linked Data (GML + WKT, RD + WGS84)
//!
//! Codes de sortie: 0 succès ou aide, 1 option inconnue, 2 fichier manquant,
//! 3 échec de la conversion.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use bag_ld::cli::{init_logging, load_env};
use bag_ld::Config;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;

/// Convertit le GML <INPUT> de bâtiments BAG en RD vers <OUTPUT> en Linked Data,
/// avec GML et WKT, en RD et en WGS84
#[derive(Parser)]
#[command(name = "gml2wkt")]
#[command(author, version)]
#[command(
    about = "Converts the GML <input-file> with BAG buildings in RD into the <output-file> containing Linked Data, using both GML and WKT, and using both RD and WGS84."
)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Fichier d'entrée (GML ou GeoJSON)
    input: PathBuf,

    /// Fichier de sortie (`-` pour la sortie standard)
    output: PathBuf,
}

fn main() -> ExitCode {
    load_env();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                ErrorKind::MissingRequiredArgument => 2,
                _ => 1,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.verbose);

    let config = match Config::from_env().context("Failed to load configuration") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::from(3);
        }
    };

    info!(input = %cli.input.display(), output = %cli.output.display(), "Conversion");
    match bag_ld::convert(&cli.input, &cli.output, &config) {
        Ok(report) => {
            info!(summary = %report.summary(), "Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(3)
        }
    }
}
