pub mod bind;
pub mod check;

use std::path::{Path, PathBuf};

use clap::Args;
use mobind_source::{Backend, BindDiagnostic, BindOptions, Diagnostics, ExportData};

use crate::error::{CliError, CliResult};

/// Read when `--config` is not given, if present.
const DEFAULT_CONFIG: &str = "bind.toml";

/// Flags shared by every generation command.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Export metadata document describing the bound packages
    #[arg(value_name = "METADATA")]
    pub metadata: PathBuf,

    /// Comma separated target backends (java, objc, go)
    #[arg(short, long, value_name = "TARGETS")]
    pub target: Option<String>,

    /// Java package prefix of the generated classes
    #[arg(long, value_name = "PACKAGE")]
    pub javapkg: Option<String>,

    /// Objective-C name prefix of the generated types
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Generation options file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl CommonArgs {
    /// Options from the config file with command line flags applied on top.
    pub fn options(&self) -> CliResult<BindOptions> {
        let mut options = match &self.config {
            Some(path) if !path.exists() => {
                return Err(CliError::MissingConfig { path: path.clone() })
            }
            Some(path) => BindOptions::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG).exists() => {
                BindOptions::from_file(Path::new(DEFAULT_CONFIG))?
            }
            None => BindOptions::default(),
        };
        if let Some(target) = &self.target {
            options.targets = Backend::parse_list(target)?;
        }
        if let Some(javapkg) = &self.javapkg {
            options.java_package_prefix = javapkg.clone();
        }
        if let Some(prefix) = &self.prefix {
            options.objc_prefix = prefix.clone();
        }
        Ok(options)
    }

    pub fn metadata(&self) -> CliResult<ExportData> {
        Ok(ExportData::from_path(&self.metadata)?)
    }
}

/// Renders warnings of a successful run.
pub fn report_warnings(diagnostics: &Diagnostics) {
    for warning in diagnostics.warnings() {
        eprintln!("{:?}", miette::Report::new(BindDiagnostic::clone(warning)));
    }
}
