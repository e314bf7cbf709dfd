//! Liste des formats vectoriels lisibles
//!
//! Codes de sortie: 0 succès ou aide, 1 `-e` combiné à `-p`, 2 option inconnue,
//! 3 erreur d'exécution, 4 erreur inattendue.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::panic;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use bag_ld::cli::{init_logging, load_env};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::debug;

/// Affiche ou exporte les formats vectoriels disponibles
#[derive(Parser)]
#[command(name = "drivers")]
#[command(author, version)]
#[command(about = "Prints or exports the vector drivers that are supported on the current system.")]
struct Cli {
    /// Exporter les noms des drivers dans <FILE>
    #[arg(short = 'e', value_name = "FILE", conflicts_with = "print")]
    export: Option<PathBuf>,

    /// Afficher les noms des drivers sur la sortie standard (défaut)
    #[arg(short = 'p')]
    print: bool,

    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Écrit les noms courts triés, un par ligne
fn write_driver_names<W: Write>(out: &mut W) -> Result<()> {
    let registry = vectordata::register_all();
    for name in registry.names_sorted() {
        writeln!(out, "{}", name)?;
    }
    out.flush()?;
    Ok(())
}

fn export_driver_names(path: &Path) -> Result<()> {
    let file = File::create(path).context(format!("Failed to create {}", path.display()))?;
    write_driver_names(&mut BufWriter::new(file))
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.export {
        Some(path) => {
            debug!(path = %path.display(), "Exporting driver names");
            export_driver_names(path)
        }
        None => {
            debug!(explicit = cli.print, "Printing driver names");
            write_driver_names(&mut io::stdout().lock())
        }
    }
}

fn main() -> ExitCode {
    load_env();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                ErrorKind::ArgumentConflict => 1,
                _ => 2,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.verbose);

    match panic::catch_unwind(|| run(&cli)) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            eprintln!("{:#}", e);
            ExitCode::from(3)
        }
        Err(_) => {
            eprintln!("An unknown error occurred.");
            ExitCode::from(4)
        }
    }
}
