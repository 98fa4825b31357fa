mod opt_common;
mod opt_combine_pthat;

use std::{fs::create_dir_all, path::Path};

use crate::opt_combine_pthat::Opt;

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
    opt.log.init("dijet-combine-pthat");
    debug!("settings: {:#?}", opt);

    let config = PtHatConfig::load(&opt.config)?;
    let config_dir = match opt.config.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let input_dir = opt.input_dir.as_deref().unwrap_or(config_dir);
    let output_dir = opt.output_dir.as_deref().unwrap_or(config_dir);

    let mut out = RunStore::new();
    let report = config.combine(input_dir, &mut out)?;

    create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {output_dir:?}"))?;
    let outfile = output_dir.join(&opt.output_name);
    out.write(&outfile, opt.compression)
        .with_context(|| format!("Failed to write combined histograms to {outfile:?}"))?;
    info!("Wrote {} histograms to {outfile:?}", report.merged.len());

    if !report.diagnostics.is_empty() {
        warn!("{} problems while combining pT-hat bins", report.diagnostics.len());
    }
    if report.has_failures() {
        for failure in &report.failures {
            log::error!("{failure}");
        }
        bail!("{} histograms could not be combined", report.failures.len());
    }
    Ok(())
}
