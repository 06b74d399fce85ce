//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `citestore_core` linkage without the reference manager UI.
//! - Optionally open a store file and list its citekeys.
//!
//! Usage: `citestore_cli [DB_PATH]`
//!
//! With a store path, core logs go to `logs/` next to the store file.

use citestore_core::db::open_db;
use citestore_core::{
    default_log_level, init_logging, ReferenceRepository, SqliteReferenceRepository,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const LOG_DIR_NAME: &str = "logs";

fn main() -> ExitCode {
    println!("citestore_core ping={}", citestore_core::ping());
    println!("citestore_core version={}", citestore_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match list_citekeys(Path::new(&db_path)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn list_citekeys(db_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = std::env::current_dir()?.join(db_path);
    let log_dir = log_dir_for(&db_path);
    init_logging(default_log_level(), &log_dir.to_string_lossy())?;

    let conn = open_db(&db_path)?;
    let repo = SqliteReferenceRepository::try_new(&conn)?;

    let references = repo.get_all()?;
    println!("references={}", references.len());
    for reference in references {
        println!("{}", reference.citekey);
    }
    Ok(())
}

fn log_dir_for(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .unwrap_or_else(|| Path::new("/"))
        .join(LOG_DIR_NAME)
}
