use std::{
    cmp::Ordering,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    merge::{combine_weighted_histograms, MergeError, MergeReport},
    store::RunStore,
};

/// Default name of the combined output
pub const COMBINED_FILE: &str = "combined.root";

/// Configuration of the pT-hat bins to combine
///
/// Both YAML and JSON files are accepted.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct PtHatConfig {
    #[serde(default)]
    pub pthat_bins: Vec<PtHatBin>,
}

/// One sample generated in a slice of pT-hat
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PtHatBin {
    pub name: String,
    /// Merged histogram output of the sample, relative to the input directory
    pub file: PathBuf,
    #[serde(default = "default_include")]
    pub include: bool,
    #[serde(default)]
    pub use_scale_factor: bool,
    pub scale_factor: f64,
    #[serde(default)]
    pub range: PtHatRange,
}

fn default_include() -> bool {
    true
}

#[derive(Deserialize, Serialize, Copy, Clone, Debug, Default, PartialEq)]
pub struct PtHatRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PtHatBin {
    /// The weight applied to all histograms of this bin
    pub fn weight(&self) -> f64 {
        if self.use_scale_factor {
            self.scale_factor
        } else {
            1.
        }
    }

    fn cmp_range(&self, other: &Self) -> Ordering {
        let lower = |b: &Self| b.range.min.unwrap_or(f64::NEG_INFINITY);
        let upper = |b: &Self| b.range.max.unwrap_or(f64::INFINITY);
        lower(self)
            .total_cmp(&lower(other))
            .then_with(|| upper(self).total_cmp(&upper(other)))
    }
}

impl PtHatConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|err| ConfigError::Open(path.to_owned(), err))?;
        serde_yaml::from_reader(BufReader::new(file))
            .map_err(|err| ConfigError::Parse(path.to_owned(), err))
    }

    /// All bins, ordered by their pT-hat range
    pub fn sorted_bins(&self) -> Vec<&PtHatBin> {
        self.pthat_bins
            .iter()
            .sorted_by(|a, b| a.cmp_range(b))
            .collect()
    }

    /// Files and weights of the bins to combine, in pT-hat order
    ///
    /// Excluded bins, bins with missing files, and bins with a
    /// non-positive weight are skipped.
    pub fn selected_sources(&self, input_dir: &Path) -> Vec<(PathBuf, f64)> {
        let mut sources = Vec::new();
        for bin in self.sorted_bins() {
            if !bin.include {
                info!("Excluding pT-hat bin {}", bin.name);
                continue;
            }
            let path = input_dir.join(&bin.file);
            if !path.exists() {
                warn!("Skipping pT-hat bin {}: {path:?} not found", bin.name);
                continue;
            }
            let weight = bin.weight();
            if !(weight > 0.) {
                warn!("Skipping pT-hat bin {}: weight {weight} is not positive", bin.name);
                continue;
            }
            info!("Adding pT-hat bin {} with weight {weight}", bin.name);
            sources.push((path, weight));
        }
        sources
    }

    /// Combine the histograms of all selected bins into `out`
    ///
    /// Every histogram found in any selected bin is combined, not only
    /// those of the lowest bin.
    pub fn combine(
        &self,
        input_dir: &Path,
        out: &mut RunStore,
    ) -> Result<MergeReport, CombineError> {
        let sources = self.selected_sources(input_dir);
        if sources.is_empty() {
            return Err(CombineError::NoBins);
        }
        Ok(combine_weighted_histograms(sources, out)?)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to open pT-hat configuration {0:?}")]
    Open(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse pT-hat configuration {0:?}")]
    Parse(PathBuf, #[source] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum CombineError {
    #[error("No pT-hat bin selected")]
    NoBins,
    #[error("Failed to merge pT-hat bins")]
    Merge(#[from] MergeError),
}
