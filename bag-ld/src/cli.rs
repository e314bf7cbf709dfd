//! Initialisation commune des binaires: `.env` et logging

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Charge `.env` depuis le répertoire courant, sinon depuis celui du binaire
pub fn load_env() {
    if dotenvy::dotenv().is_err() {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Configure le logging sur stderr
///
/// `RUST_LOG` fait foi; sans lui, seuls les warnings sont affichés pour que
/// la sortie standard reste exploitable.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
