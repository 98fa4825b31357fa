use std::path::PathBuf;

use clap::Parser;
use dijetmerge::compression::{Compression, ParseCompressionErr};
use dijetmerge::source::{SourceTemplate, DEFAULT_TEMPLATE};
use dijetmerge::{GIT_BRANCH, GIT_REV, VERSION};
use env_logger::Env;
use log::info;

pub(crate) const COMPRESSION_HELP: &str = "Compress output file.
Possible settings are 'bzip2', 'gzip', 'zstd', 'lz4'.
Compression levels can be set with algorithm_level e.g. 'zstd_5'.
Maximum levels are 'gzip_9', 'zstd_19', 'lz4_16'.";

pub(crate) fn parse_compr(s: &str) -> Result<Compression, ParseCompressionErr> {
    s.parse()
}

#[derive(Debug, Clone, Parser)]
pub(crate) struct LogOpt {
    /// Verbosity level
    #[clap(
        short,
        long,
        default_value = "Info",
        help = "Verbosity level.
Possible values with increasing amount of output are
'off', 'error', 'warn', 'info', 'debug', 'trace'.\n"
    )]
    pub(crate) loglevel: String,
}

impl LogOpt {
    /// Set up logging and announce the running tool
    ///
    /// The `DIJETMERGE_LOG` environment variable takes precedence over
    /// the command line.
    pub(crate) fn init(&self, tool: &str) {
        let env = Env::default().filter_or("DIJETMERGE_LOG", &self.loglevel);
        env_logger::init_from_env(env);

        if let (Some(rev), Some(branch)) = (GIT_REV, GIT_BRANCH) {
            info!("{tool} {VERSION} rev {rev} ({branch})");
        } else {
            info!("{tool} {VERSION}");
        }
    }
}

#[derive(Debug, Clone, Parser)]
pub(crate) struct SourceOpt {
    /// Index of the first run.
    #[clap(long, default_value = "0")]
    pub(crate) first: u32,

    /// Index of the last run.
    #[clap(long, default_value = "99")]
    pub(crate) last: u32,

    /// File name of the run outputs.
    ///
    /// The placeholder `{}` is replaced by the run index.
    #[clap(long, default_value = DEFAULT_TEMPLATE)]
    pub(crate) template: SourceTemplate,

    /// Directory containing the run outputs.
    #[clap(long, default_value = ".")]
    pub(crate) indir: PathBuf,

    /// Input files.
    ///
    /// If given, these are merged in order instead of the files
    /// generated from the template.
    #[clap(name = "INFILES", value_parser)]
    pub(crate) infiles: Vec<PathBuf>,
}

impl SourceOpt {
    pub(crate) fn sources(&self) -> Vec<PathBuf> {
        if self.infiles.is_empty() {
            self.template.paths(&self.indir, self.first..=self.last)
        } else {
            self.infiles.clone()
        }
    }
}
