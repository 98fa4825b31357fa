use std::{
    fmt::{self, Display},
    ops::RangeInclusive,
    path::{Path, PathBuf},
    str::FromStr,
};

use thiserror::Error;

/// File name template of the per-run outputs
pub const DEFAULT_TEMPLATE: &str = "AnalysisResults{}.root";

/// Name of the event table in each run output
pub const RUN_NTUPLE: &str = "dijetNtuple";
/// Name of the merged event table
pub const MERGED_NTUPLE: &str = "mergedNtuple";
/// Title of the merged event table
pub const MERGED_NTUPLE_TITLE: &str = "Merged Dijet Ntuple";
/// Default output of the event table merger
pub const MERGED_TUPLE_FILE: &str = "merged_tuple.root";
/// Default output of the histogram merger
pub const MERGED_HISTOGRAM_FILE: &str = "merged_AnalysisResults.root";
/// Default output of the text export
pub const EXPORT_FILE: &str = "dijet_data.csv";

/// A file name with a single `{}` placeholder for the run index
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SourceTemplate {
    prefix: String,
    suffix: String,
}

impl SourceTemplate {
    /// File name for the run with the given index
    pub fn name(&self, index: u32) -> String {
        format!("{}{index}{}", self.prefix, self.suffix)
    }

    /// Paths of all runs with indices in `range`, relative to `dir`
    ///
    /// An empty range gives no paths.
    pub fn paths(&self, dir: &Path, range: RangeInclusive<u32>) -> Vec<PathBuf> {
        range.map(|i| dir.join(self.name(i))).collect()
    }
}

impl Default for SourceTemplate {
    fn default() -> Self {
        DEFAULT_TEMPLATE.parse().unwrap()
    }
}

impl FromStr for SourceTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((prefix, suffix)) = s.split_once("{}") else {
            return Err(TemplateError::NoPlaceholder(s.to_owned()));
        };
        if suffix.contains("{}") {
            return Err(TemplateError::MultiplePlaceholders(s.to_owned()));
        }
        Ok(Self {
            prefix: prefix.to_owned(),
            suffix: suffix.to_owned(),
        })
    }
}

impl Display for SourceTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{}}{}", self.prefix, self.suffix)
    }
}

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum TemplateError {
    #[error("File name template `{0}` has no `{{}}` placeholder")]
    NoPlaceholder(String),
    #[error("File name template `{0}` has more than one `{{}}` placeholder")]
    MultiplePlaceholders(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template() {
        let template = SourceTemplate::default();
        assert_eq!(template.name(17), "AnalysisResults17.root");
        assert_eq!(template.to_string(), DEFAULT_TEMPLATE);
    }

    #[test]
    fn paths() {
        let template: SourceTemplate = "run_{}/out.root".parse().unwrap();
        let paths = template.paths(Path::new("data"), 3..=5);
        assert_eq!(
            paths,
            [
                PathBuf::from("data/run_3/out.root"),
                PathBuf::from("data/run_4/out.root"),
                PathBuf::from("data/run_5/out.root"),
            ]
        );
        #[allow(clippy::reversed_empty_ranges)]
        let empty = template.paths(Path::new("."), 5..=4);
        assert!(empty.is_empty());
    }

    #[test]
    fn invalid_templates() {
        assert_eq!(
            "out.root".parse::<SourceTemplate>(),
            Err(TemplateError::NoPlaceholder("out.root".to_owned()))
        );
        assert!("{}_{}.root".parse::<SourceTemplate>().is_err());
    }
}
