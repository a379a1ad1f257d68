//! Runs a binding pass end to end.
//!
//! This crate is responsible for:
//! - Sequencing extraction, type checking, proxy generation and emission
//! - Aborting with every diagnostic when any stage reports an error
//! - Writing the generated units to the output directory

mod error;
mod generator;
mod output;

use std::path::PathBuf;

use mobind_source::{BindOptions, Diagnostics, ExportData};

pub use error::{DriverError, DriverResult};
pub use generator::{Generation, Generator};
pub use output::write_units;

/// Files written by [`bind`] and the warnings of the run.
#[derive(Debug)]
pub struct BindReport {
    pub written: Vec<PathBuf>,
    pub diagnostics: Diagnostics,
}

/// Generates bindings for `data` and writes them to `options.out_dir`.
pub fn bind(options: BindOptions, data: &ExportData) -> DriverResult<BindReport> {
    let generator = Generator::new(options);
    let generation = generator.generate(data)?;
    let written = write_units(&generation.units, &generator.options().out_dir)?;
    Ok(BindReport {
        written,
        diagnostics: generation.diagnostics,
    })
}
