mod opt_combine_pthat;
mod opt_common;
mod opt_export_csv;
mod opt_merge_histograms;
mod opt_merge_tuples;
mod opt_sigma_summary;

use std::{
    env::var_os,
    fs::{create_dir_all, File},
    io::{stdout, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::{Command, CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, shells::*, Generator};
use dirs::home_dir;
use strum::{Display, EnumString};

#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    EnumString,
    ValueEnum,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "lowercase")]
enum Shell {
    Bash,
    Elvish,
    Fish,
    #[allow(clippy::enum_variant_names)]
    PowerShell,
    Zsh,
}

#[derive(Debug, Parser)]
struct ShellSelect {
    /// Shell for which to generate completions
    ///
    /// If omitted, generate completions for the shell in the `SHELL`
    /// environment variable
    #[clap(value_enum)]
    shell: Option<Shell>,
}

fn commands() -> [(Command, &'static str); 5] {
    [
        (opt_merge_tuples::Opt::command(), "dijet-merge-tuples"),
        (opt_merge_histograms::Opt::command(), "dijet-merge-histograms"),
        (opt_export_csv::Opt::command(), "dijet-export-csv"),
        (opt_combine_pthat::Opt::command(), "dijet-combine-pthat"),
        (opt_sigma_summary::Opt::command(), "dijet-sigma-summary"),
    ]
}

fn gen_completion<S: Copy + Generator, W: Write>(shell: S, mut to: W) {
    for (mut cmd, name) in commands() {
        generate(shell, &mut cmd, name, &mut to);
    }
}

fn main() -> Result<()> {
    let shell = ShellSelect::parse()
        .shell
        .map_or_else(get_login_shell, Ok)
        .context("Failed to determine shell")?;
    eprintln!("Generating {shell} completions");
    match shell {
        Shell::Bash => gen_completion(Bash, gen_bash_outfile()?),
        Shell::Elvish => gen_completion(Elvish, &mut stdout()),
        Shell::Fish => gen_completion(Fish, gen_fish_outfile()?),
        Shell::PowerShell => gen_completion(PowerShell, &mut stdout()),
        Shell::Zsh => gen_completion(Zsh, &mut stdout()),
    }
    Ok(())
}

fn get_login_shell() -> Result<Shell> {
    let shell = var_os("SHELL").ok_or_else(|| anyhow!("SHELL is not set"))?;
    let shell = PathBuf::from(shell);
    let Some(name) = shell.file_name().and_then(|n| n.to_str()) else {
        return Err(anyhow!("Cannot extract shell name from {shell:?}"));
    };
    name.parse::<Shell>()
        .with_context(|| format!("{name} is not a supported shell"))
}

fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = var_os("XDG_DATA_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let mut dir = home_dir().ok_or_else(|| anyhow!("No home directory found"))?;
    dir.push(".local");
    dir.push("share");
    Ok(dir)
}

fn gen_bash_outfile() -> Result<File> {
    let mut outfile = match var_os("BASH_COMPLETION_USER_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => data_dir()?.join("bash-completion"),
    };
    outfile.push("completions");
    outfile.push("dijetmerge.bash");
    create_file(outfile)
}

fn gen_fish_outfile() -> Result<File> {
    let mut outfile = data_dir()?;
    for part in ["fish", "vendor_completions.d", "dijetmerge.fish"] {
        outfile.push(part);
    }
    create_file(outfile)
}

fn create_file<P: AsRef<Path>>(name: P) -> Result<File> {
    let name = name.as_ref();
    if let Some(dir) = name.parent() {
        create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {dir:?}"))?;
    }
    eprintln!("Writing to {name:?}");
    File::create(name).with_context(|| format!("Failed to create {name:?}"))
}
