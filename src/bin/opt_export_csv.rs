use std::path::PathBuf;

use crate::opt_common::*;

use clap::Parser;
use dijetmerge::source::{EXPORT_FILE, MERGED_NTUPLE, MERGED_TUPLE_FILE};

/// Export a merged event table as comma-separated values
#[derive(Debug, Parser)]
#[clap(about, author, version)]
pub(crate) struct Opt {
    /// Output file.
    #[clap(long, short, default_value = EXPORT_FILE, value_parser)]
    pub(crate) outfile: PathBuf,

    /// Name of the event table to export.
    #[clap(long, default_value = MERGED_NTUPLE)]
    pub(crate) table: String,

    #[clap(flatten)]
    pub(crate) log: LogOpt,

    /// Input file.
    #[clap(name = "INFILE", default_value = MERGED_TUPLE_FILE, value_parser)]
    pub(crate) infile: PathBuf,
}
