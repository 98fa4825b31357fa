use std::path::PathBuf;

use crate::opt_common::*;

use clap::Parser;
use dijetmerge::sigma::SIGMA_SUMMARY_FILE;

/// Collect the generator cross sections from `*.out` log files
#[derive(Debug, Parser)]
#[clap(about, author, version)]
pub(crate) struct Opt {
    /// Root directory to search for log files.
    #[clap(long, short, value_parser)]
    pub(crate) directory: PathBuf,

    /// Output file.
    #[clap(long, short, default_value = SIGMA_SUMMARY_FILE, value_parser)]
    pub(crate) output: PathBuf,

    #[clap(flatten)]
    pub(crate) log: LogOpt,
}
