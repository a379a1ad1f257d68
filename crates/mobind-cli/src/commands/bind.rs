use std::path::PathBuf;

use clap::Args;
use mobind_driver::bind;

use super::{report_warnings, CommonArgs};
use crate::error::CliResult;

#[derive(Args, Debug)]
pub struct BindArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

pub fn handle_bind(args: BindArgs) -> CliResult<()> {
    let mut options = args.common.options()?;
    if let Some(output) = args.output {
        options.out_dir = output;
    }
    let data = args.common.metadata()?;
    let out_dir = options.out_dir.clone();

    let report = bind(options, &data)?;
    report_warnings(&report.diagnostics);
    println!("Wrote {} file(s) to {}", report.written.len(), out_dir.display());
    Ok(())
}
