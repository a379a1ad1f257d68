use clap::Args;
use mobind_driver::Generator;

use super::{report_warnings, CommonArgs};
use crate::error::CliResult;

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

pub fn handle_check(args: CheckArgs) -> CliResult<()> {
    let options = args.common.options()?;
    let data = args.common.metadata()?;

    let diagnostics = Generator::new(options).check(&data)?;
    report_warnings(&diagnostics);
    println!(
        "Checked {} package(s): no errors, {} warning(s)",
        data.packages.len(),
        diagnostics.warnings().count()
    );
    Ok(())
}
