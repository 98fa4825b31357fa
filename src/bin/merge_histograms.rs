mod opt_common;
mod opt_merge_histograms;

use crate::opt_merge_histograms::Opt;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dijetmerge::prelude::*;
use log::{debug, info, warn};

fn main() -> Result<()> {
    let args = argfile::expand_args_from(
        std::env::args_os(),
        argfile::parse_fromfile,
        argfile::PREFIX,
    )
    .with_context(|| "Failed to read argument file")?;
    let opt = Opt::parse_from(args);
    opt.log.init("dijet-merge-histograms");
    debug!("settings: {:#?}", opt);

    let sources = opt.sources.sources();
    info!("Merging histograms from {} files", sources.len());
    let mut out = RunStore::new();
    let report = merge_histograms(&sources, &mut out)?;
    out.write(&opt.outfile, opt.compression)
        .with_context(|| format!("Failed to write merged histograms to {:?}", opt.outfile))?;
    info!("Wrote {} histograms to {:?}", report.merged.len(), opt.outfile);

    if !report.diagnostics.is_empty() {
        warn!("{} problems while merging:", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            warn!("  {diagnostic}");
        }
    }
    if report.has_failures() {
        for failure in &report.failures {
            log::error!("{failure}");
        }
        bail!("{} histograms could not be merged", report.failures.len());
    }
    Ok(())
}
