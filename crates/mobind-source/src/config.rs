use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// A code generation target.
///
/// `Go` is the source-side glue layer that is compiled back into the
/// library; it is selected like any other backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Java,
    ObjC,
    Go,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Java, Backend::ObjC, Backend::Go];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Java => "java",
            Backend::ObjC => "objc",
            Backend::Go => "go",
        }
    }

    /// Parses a comma separated selector such as `java,objc`. The result is
    /// sorted and free of duplicates so option order never changes output.
    pub fn parse_list(selector: &str) -> Result<Vec<Backend>, SourceError> {
        let mut backends = Vec::new();
        for part in selector.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            backends.push(part.parse()?);
        }
        if backends.is_empty() {
            return Err(SourceError::InvalidTarget(selector.to_string()));
        }
        backends.sort();
        backends.dedup();
        Ok(backends)
    }
}

impl FromStr for Backend {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "java" => Ok(Backend::Java),
            "objc" => Ok(Backend::ObjC),
            "go" => Ok(Backend::Go),
            other => Err(SourceError::InvalidTarget(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which thread a call into a target-side implementation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadAffinity {
    /// Run on whichever thread made the call.
    #[default]
    Caller,
    /// Redispatch onto the runtime's main/owner thread.
    Main,
}

/// Options for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOptions {
    /// Requested backends, sorted.
    pub targets: Vec<Backend>,
    /// Java package prefix; `go` yields `go.<pkg>`.
    pub java_package_prefix: String,
    /// Objective-C symbol prefix; `Go` yields `GoTestpkg...`.
    pub objc_prefix: String,
    /// Where emission units are written.
    pub out_dir: PathBuf,
    pub java_thread: ThreadAffinity,
    pub objc_thread: ThreadAffinity,
    /// Include the generator version in file banners.
    pub version_banner: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        BindOptions {
            targets: vec![Backend::Java, Backend::ObjC, Backend::Go],
            java_package_prefix: String::new(),
            objc_prefix: String::new(),
            out_dir: PathBuf::from("."),
            java_thread: ThreadAffinity::Caller,
            objc_thread: ThreadAffinity::Caller,
            version_banner: true,
        }
    }
}

impl BindOptions {
    pub fn thread_affinity(&self, backend: Backend) -> ThreadAffinity {
        match backend {
            Backend::Java => self.java_thread,
            Backend::ObjC => self.objc_thread,
            Backend::Go => ThreadAffinity::Caller,
        }
    }

    pub fn wants(&self, backend: Backend) -> bool {
        self.targets.contains(&backend)
    }

    /// Loads options from a `bind.toml`, starting from the defaults.
    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file: BindConfigFile = toml::from_str(&text)?;
        let mut options = BindOptions::default();
        file.apply(&mut options)?;
        log::debug!("Loaded bind options from {}: {:?}", path.display(), options);
        Ok(options)
    }
}

/// On-disk form of `bind.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindConfigFile {
    #[serde(default)]
    pub bind: BindSection,
    #[serde(default)]
    pub java: JavaSection,
    #[serde(default)]
    pub objc: ObjcSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindSection {
    /// Comma separated backend selector.
    #[serde(default)]
    pub targets: Option<String>,
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    #[serde(default)]
    pub version_banner: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JavaSection {
    #[serde(default)]
    pub package_prefix: Option<String>,
    #[serde(default)]
    pub thread: Option<ThreadAffinity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjcSection {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub thread: Option<ThreadAffinity>,
}

impl BindConfigFile {
    pub fn apply(&self, options: &mut BindOptions) -> Result<(), SourceError> {
        if let Some(targets) = &self.bind.targets {
            options.targets = Backend::parse_list(targets)?;
        }
        if let Some(out_dir) = &self.bind.out_dir {
            options.out_dir = out_dir.clone();
        }
        if let Some(banner) = self.bind.version_banner {
            options.version_banner = banner;
        }
        if let Some(prefix) = &self.java.package_prefix {
            options.java_package_prefix = prefix.clone();
        }
        if let Some(thread) = self.java.thread {
            options.java_thread = thread;
        }
        if let Some(prefix) = &self.objc.prefix {
            options.objc_prefix = prefix.clone();
        }
        if let Some(thread) = self.objc.thread {
            options.objc_thread = thread;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_selector() {
        assert_eq!(
            Backend::parse_list("objc, java,objc").unwrap(),
            vec![Backend::Java, Backend::ObjC]
        );
        assert!(matches!(
            Backend::parse_list("java,swift"),
            Err(SourceError::InvalidTarget(t)) if t == "swift"
        ));
        assert!(Backend::parse_list(" , ").is_err());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let file: BindConfigFile = toml::from_str(
            r#"
            [bind]
            targets = "java,go"
            out_dir = "gen"

            [java]
            package_prefix = "org.example"

            [objc]
            prefix = "EX"
            thread = "main"
            "#,
        )
        .unwrap();
        let mut options = BindOptions::default();
        file.apply(&mut options).unwrap();
        assert_eq!(options.targets, vec![Backend::Java, Backend::Go]);
        assert_eq!(options.out_dir, PathBuf::from("gen"));
        assert_eq!(options.java_package_prefix, "org.example");
        assert_eq!(options.objc_prefix, "EX");
        assert_eq!(options.thread_affinity(Backend::ObjC), ThreadAffinity::Main);
        assert_eq!(options.thread_affinity(Backend::Java), ThreadAffinity::Caller);
    }

    #[test]
    fn loads_options_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bind.toml");
        std::fs::write(&path, "[java]\nthread = \"main\"\n").unwrap();
        let options = BindOptions::from_file(&path).unwrap();
        assert_eq!(options.java_thread, ThreadAffinity::Main);
        assert_eq!(options.targets, BindOptions::default().targets);
    }
}
