use std::path::PathBuf;

use crate::opt_common::*;

use clap::Parser;
use dijetmerge::compression::Compression;
use dijetmerge::pthat::COMBINED_FILE;

/// Combine the histograms of pT-hat bins weighted by their scale factors
#[derive(Debug, Parser)]
#[clap(about, author, version)]
pub(crate) struct Opt {
    /// Configuration file listing the pT-hat bins (YAML or JSON).
    #[clap(long, short, default_value = "pthat_add_config.json", value_parser)]
    pub(crate) config: PathBuf,

    /// Directory containing the files listed in the configuration.
    ///
    /// Defaults to the directory of the configuration file.
    #[clap(long, value_parser)]
    pub(crate) input_dir: Option<PathBuf>,

    /// Directory for the combined output.
    ///
    /// Defaults to the directory of the configuration file.
    #[clap(long, value_parser)]
    pub(crate) output_dir: Option<PathBuf>,

    /// Name of the combined output file.
    #[clap(long, default_value = COMBINED_FILE)]
    pub(crate) output_name: String,

    #[clap(long, value_parser = parse_compr, help = COMPRESSION_HELP)]
    pub(crate) compression: Option<Compression>,

    #[clap(flatten)]
    pub(crate) log: LogOpt,
}
