mod opt_common;
mod opt_sigma_summary;

use std::{fs::File, io::BufWriter};

use crate::opt_sigma_summary::Opt;

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
    opt.log.init("dijet-sigma-summary");
    debug!("settings: {:#?}", opt);

    let records = collect_sigma_records(&opt.directory)?;
    let out = File::create(&opt.output)
        .with_context(|| format!("Failed to create {:?}", opt.output))?;
    write_report(&records, BufWriter::new(out))
        .with_context(|| format!("Failed to write report to {:?}", opt.output))?;
    info!("Report written to {:?}", opt.output);
    Ok(())
}
