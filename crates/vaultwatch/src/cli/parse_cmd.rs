//! `vaultwatch parse <file>`: run extraction over saved page markup.

use crate::cli::output;
use crate::error::Error;
use crate::extraction::{extract_positions, Position};
use anyhow::Result;
use std::path::Path;

/// Read an HTML file and extract its positions.
pub fn load(file: &Path) -> crate::Result<Vec<Position>> {
    let html = std::fs::read_to_string(file).map_err(|source| Error::Input {
        path: file.to_path_buf(),
        source,
    })?;
    Ok(extract_positions(&html))
}

/// Run the parse command.
pub fn run(file: &Path, json: bool) -> Result<()> {
    let positions = load(file)?;

    if json {
        output::print_json(&serde_json::to_value(&positions)?);
    } else {
        print!("{}", output::render_positions(&positions));
        eprintln!("  {} positions in {}", positions.len(), file.display());
    }
    Ok(())
}
