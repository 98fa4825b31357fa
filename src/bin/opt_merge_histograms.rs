use std::path::PathBuf;

use crate::opt_common::*;

use clap::Parser;
use dijetmerge::compression::Compression;
use dijetmerge::source::MERGED_HISTOGRAM_FILE;

/// Sum the histograms of many run outputs bin by bin
#[derive(Debug, Parser)]
#[clap(about, author, version)]
pub(crate) struct Opt {
    /// Output file.
    #[clap(long, short, default_value = MERGED_HISTOGRAM_FILE, value_parser)]
    pub(crate) outfile: PathBuf,

    #[clap(long, value_parser = parse_compr, help = COMPRESSION_HELP)]
    pub(crate) compression: Option<Compression>,

    #[clap(flatten)]
    pub(crate) log: LogOpt,

    #[clap(flatten)]
    pub(crate) sources: SourceOpt,
}
