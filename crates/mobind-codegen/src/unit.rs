use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mobind_source::Backend;

/// Directory, relative to the output root, of every file that is compiled
/// together with the source package: the JNI unit, the Objective-C files
/// and the Go export layer.
pub const GLUE_DIR: &str = "src/gobind";

/// One generated source file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionUnit {
    pub backend: Backend,
    pub path: PathBuf,
    pub contents: String,
}

impl EmissionUnit {
    pub fn new(backend: Backend, path: impl Into<PathBuf>, contents: String) -> Self {
        EmissionUnit {
            backend,
            path: path.into(),
            contents,
        }
    }
}

/// The units of a run, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitSet {
    units: BTreeMap<PathBuf, EmissionUnit>,
}

impl UnitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit, returning the one it replaced at the same path.
    pub fn insert(&mut self, unit: EmissionUnit) -> Option<EmissionUnit> {
        self.units.insert(unit.path.clone(), unit)
    }

    pub fn extend(&mut self, units: impl IntoIterator<Item = EmissionUnit>) {
        for unit in units {
            self.insert(unit);
        }
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&EmissionUnit> {
        self.units.get(path.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmissionUnit> {
        self.units.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.units.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl IntoIterator for UnitSet {
    type Item = EmissionUnit;
    type IntoIter = std::collections::btree_map::IntoValues<PathBuf, EmissionUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.into_values()
    }
}
