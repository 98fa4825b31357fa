mod opt_common;
mod opt_merge_tuples;

use crate::opt_merge_tuples::Opt;

use anyhow::{Context, Result};
use clap::Parser;
use dijetmerge::prelude::*;
use log::{debug, info};

fn main() -> Result<()> {
    let args = argfile::expand_args_from(
        std::env::args_os(),
        argfile::parse_fromfile,
        argfile::PREFIX,
    )
    .with_context(|| "Failed to read argument file")?;
    let opt = Opt::parse_from(args);
    opt.log.init("dijet-merge-tuples");
    debug!("settings: {:#?}", opt);

    let sources = opt.sources.sources();
    info!("Merging event tables from {} files", sources.len());
    let merger = TupleMerger::builder()
        .input_table(opt.table)
        .output_table(opt.merged_table)
        .build();
    let mut out = RunStore::new();
    let summary = merger.merge(&sources, &mut out)?;
    out.write(&opt.outfile, opt.compression)
        .with_context(|| format!("Failed to write merged event table to {:?}", opt.outfile))?;
    info!(
        "Wrote {} events to {:?}",
        summary.total_rows(),
        opt.outfile
    );
    Ok(())
}
