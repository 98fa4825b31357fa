use std::path::PathBuf;

use crate::opt_common::*;

use clap::Parser;
use dijetmerge::compression::Compression;
use dijetmerge::source::{MERGED_NTUPLE, MERGED_TUPLE_FILE, RUN_NTUPLE};

/// Concatenate the event tables of many run outputs
#[derive(Debug, Parser)]
#[clap(about, author, version)]
pub(crate) struct Opt {
    /// Output file.
    #[clap(long, short, default_value = MERGED_TUPLE_FILE, value_parser)]
    pub(crate) outfile: PathBuf,

    /// Name of the event table in each input file.
    #[clap(long, default_value = RUN_NTUPLE)]
    pub(crate) table: String,

    /// Name of the merged event table.
    #[clap(long, default_value = MERGED_NTUPLE)]
    pub(crate) merged_table: String,

    #[clap(long, value_parser = parse_compr, help = COMPRESSION_HELP)]
    pub(crate) compression: Option<Compression>,

    #[clap(flatten)]
    pub(crate) log: LogOpt,

    #[clap(flatten)]
    pub(crate) sources: SourceOpt,
}
