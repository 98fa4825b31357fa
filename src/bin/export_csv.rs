mod opt_common;
mod opt_export_csv;

use crate::opt_export_csv::Opt;

use anyhow::{Context, Result};
use clap::Parser;
use dijetmerge::prelude::*;
use log::debug;

fn main() -> Result<()> {
    let args = argfile::expand_args_from(
        std::env::args_os(),
        argfile::parse_fromfile,
        argfile::PREFIX,
    )
    .with_context(|| "Failed to read argument file")?;
    let opt = Opt::parse_from(args);
    opt.log.init("dijet-export-csv");
    debug!("settings: {:#?}", opt);

    export_file(&opt.infile, &opt.table, &opt.outfile).with_context(|| {
        format!(
            "Failed to export `{}` from {:?} to {:?}",
            opt.table, opt.infile, opt.outfile
        )
    })?;
    Ok(())
}
