use std::fs;
use std::path::{Path, PathBuf};

use mobind_codegen::UnitSet;

use crate::error::{DriverError, DriverResult};

fn create_parent(path: &Path) -> DriverResult<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| DriverError::io(parent, e)),
        None => Ok(()),
    }
}

/// Writes every unit under `out_dir` and returns the written paths.
///
/// Units are first written to a staging directory inside `out_dir` and only
/// renamed into place once all of them were written, so a failed write
/// leaves previous output untouched.
pub fn write_units(units: &UnitSet, out_dir: &Path) -> DriverResult<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| DriverError::io(out_dir, e))?;
    let staging = tempfile::Builder::new()
        .prefix(".mobind-")
        .tempdir_in(out_dir)
        .map_err(|e| DriverError::io(out_dir, e))?;

    for unit in units.iter() {
        let path = staging.path().join(&unit.path);
        create_parent(&path)?;
        fs::write(&path, &unit.contents).map_err(|e| DriverError::io(&unit.path, e))?;
    }

    let mut written = Vec::with_capacity(units.len());
    for unit in units.iter() {
        let target = out_dir.join(&unit.path);
        create_parent(&target)?;
        fs::rename(staging.path().join(&unit.path), &target)
            .map_err(|e| DriverError::io(&target, e))?;
        log::debug!("Wrote {}", target.display());
        written.push(target);
    }
    Ok(written)
}
