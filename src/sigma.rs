use std::{
    cmp::Ordering,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use thiserror::Error;

/// Default name of the summary report
pub const SIGMA_SUMMARY_FILE: &str = "sigmaGen_summary.txt";

const LOG_EXTENSION: &str = "out";

lazy_static! {
    static ref SIGMA_RE: Regex = Regex::new(r"(?i)\bsigmaGen:\s*(\S+)\s*mb").unwrap();
    static ref PTHAT_RE: Regex = Regex::new(r"pthat_([0-9]+)(?:_([0-9]+|infy))?").unwrap();
}

/// Generator cross section found in one log file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigmaRecord {
    pub label: String,
    /// Cross section in mb, as printed by the generator
    pub sigma: String,
    pub log_file: PathBuf,
}

/// The value of the last `sigmaGen: <value> mb` statement in `text`
pub fn extract_sigma(text: &str) -> Option<&str> {
    SIGMA_RE
        .captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Name of the nearest enclosing directory mentioning pT-hat
///
/// Falls back to the name of the parent directory.
pub fn pthat_label(log_file: &Path) -> String {
    let Some(parent) = log_file.parent() else {
        return String::new();
    };
    let label = parent
        .ancestors()
        .filter_map(|dir| dir.file_name())
        .map(|name| name.to_string_lossy())
        .find(|name| name.to_lowercase().contains("pthat"));
    match label {
        Some(label) => label.into_owned(),
        None => parent
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Compare labels by their pT-hat range
///
/// Labels without a `pthat_<min>[_<max>]` range come last.
pub fn cmp_labels(a: &str, b: &str) -> Ordering {
    let (a_min, a_max) = label_range(a);
    let (b_min, b_max) = label_range(b);
    a_min
        .total_cmp(&b_min)
        .then_with(|| a_max.total_cmp(&b_max))
        .then_with(|| a.cmp(b))
}

fn label_range(label: &str) -> (f64, f64) {
    let label = label.to_lowercase();
    let Some(captures) = PTHAT_RE.captures(&label) else {
        return (f64::INFINITY, f64::INFINITY);
    };
    let min = captures[1].parse().unwrap_or(f64::INFINITY);
    let max = match captures.get(2).map(|m| m.as_str()) {
        None => min,
        Some("infy") => f64::INFINITY,
        Some(max) => max.parse().unwrap_or(f64::INFINITY),
    };
    (min, max)
}

/// Collect the cross sections from all `*.out` files below `root`
///
/// Files without a `sigmaGen` statement are ignored and unreadable files
/// are skipped with a warning. The records are sorted by pT-hat range,
/// then by path.
pub fn collect_sigma_records(root: &Path) -> Result<Vec<SigmaRecord>, SigmaError> {
    if !root.exists() {
        return Err(SigmaError::NotFound(root.to_owned()));
    }
    if !root.is_dir() {
        return Err(SigmaError::NotADirectory(root.to_owned()));
    }
    let mut logs = Vec::new();
    find_logs(root, &mut logs)?;
    debug!("Found {} log files under {root:?}", logs.len());

    let mut records = Vec::new();
    for log_file in logs {
        let text = match fs::read(&log_file) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                warn!("Failed to read {log_file:?}: {err}");
                continue;
            }
        };
        if let Some(sigma) = extract_sigma(&text) {
            records.push(SigmaRecord {
                label: pthat_label(&log_file),
                sigma: sigma.to_owned(),
                log_file,
            });
        }
    }
    records.sort_by(|a, b| {
        cmp_labels(&a.label, &b.label).then_with(|| a.log_file.cmp(&b.log_file))
    });
    if records.is_empty() {
        warn!("No sigmaGen entries found under {root:?}");
    } else {
        info!("Found {} sigmaGen entries", records.len());
    }
    Ok(records)
}

fn find_logs(dir: &Path, logs: &mut Vec<PathBuf>) -> Result<(), SigmaError> {
    let entries = fs::read_dir(dir).map_err(|err| SigmaError::ReadDir(dir.to_owned(), err))?;
    for entry in entries {
        let path = entry
            .map_err(|err| SigmaError::ReadDir(dir.to_owned(), err))?
            .path();
        if path.is_dir() {
            find_logs(&path, logs)?;
        } else if path.extension().map_or(false, |ext| ext == LOG_EXTENSION) && path.is_file() {
            logs.push(path);
        }
    }
    Ok(())
}

/// Write the records as a tab-separated table with a header line
pub fn write_report<W: Write>(records: &[SigmaRecord], mut out: W) -> std::io::Result<()> {
    writeln!(out, "pthat_label\tsigmaGen_mb\tlog_file")?;
    for record in records {
        writeln!(
            out,
            "{}\t{}\t{}",
            record.label,
            record.sigma,
            record.log_file.display()
        )?;
    }
    out.flush()
}

#[derive(Debug, Error)]
pub enum SigmaError {
    #[error("Directory not found: {0:?}")]
    NotFound(PathBuf),
    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),
    #[error("Failed to read directory {0:?}")]
    ReadDir(PathBuf, #[source] std::io::Error),
}
