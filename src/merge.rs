use std::{
    collections::HashSet,
    error::Error as StdError,
    fmt::{self, Display},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    histogram::{HistogramError, Histogram},
    progress_bar::{Progress, ProgressBar},
    store::{RunStore, StoreError},
    traits::{AddScaled, Scale},
};

/// A non-fatal problem encountered while merging
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A source other than the first could not be read
    SourceSkipped { source: PathBuf, reason: String },
    /// A source lacks a histogram present in an earlier source
    HistogramMissing { source: PathBuf, name: String },
    /// A histogram exists but could not be decoded
    HistogramUnreadable {
        source: PathBuf,
        name: String,
        reason: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Diagnostic::*;
        match self {
            SourceSkipped { source, reason } => {
                write!(f, "Skipped {source:?}: {reason}")
            }
            HistogramMissing { source, name } => {
                write!(f, "Histogram `{name}` missing in {source:?}")
            }
            HistogramUnreadable { source, name, reason } => {
                write!(f, "Histogram `{name}` in {source:?} unreadable: {reason}")
            }
        }
    }
}

/// A histogram that could not be merged and was dropped
#[derive(Clone, Debug, PartialEq)]
pub struct HistogramFailure {
    pub name: String,
    /// The source whose histogram was incompatible
    pub source: PathBuf,
    pub error: HistogramError,
}

impl Display for HistogramFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Histogram `{}` dropped: incompatible with {:?}: {}",
            self.name, self.source, self.error
        )
    }
}

/// Outcome of a histogram merge
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeReport {
    /// Names of the merged histograms, in order of first appearance
    pub merged: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<HistogramFailure>,
}

impl MergeReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Failed to read first source {0:?}")]
    FirstSource(PathBuf, #[source] StoreError),
    #[error("Failed to store merged histogram")]
    Output(#[source] StoreError),
}

/// Sum all same-named histograms of `sources` bin by bin into `out`
///
/// See [merge_weighted_histograms].
pub fn merge_histograms<I, P>(sources: I, out: &mut RunStore) -> Result<MergeReport, MergeError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    merge_weighted_histograms(sources.into_iter().map(|s| (s, 1.)), out)
}

struct Accumulator {
    name: String,
    hist: Option<Histogram>,
}

/// Which histograms take part in a merge
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Selection {
    /// Only the histograms of the first source
    First,
    /// Every histogram found in any readable source
    Union,
}

/// Sum all same-named histograms of `sources` with the given weights
///
/// The histograms in the first source define what is merged. Contents
/// of each source are scaled by its weight and squared weights by the
/// square of its weight. Unreadable later sources and missing
/// histograms only lead to diagnostics. A histogram with a different
/// kind or binning than the first one is dropped and listed in
/// [MergeReport::failures].
pub fn merge_weighted_histograms<I, P>(
    sources: I,
    out: &mut RunStore,
) -> Result<MergeReport, MergeError>
where
    I: IntoIterator<Item = (P, f64)>,
    P: AsRef<Path>,
{
    merge_selected(sources, out, Selection::First)
}

/// Like [merge_weighted_histograms], but merge every histogram found
/// in any readable source
///
/// A histogram first seen in a later source starts from that source's
/// weighted contents. Earlier sources lacking it are not reported.
pub fn combine_weighted_histograms<I, P>(
    sources: I,
    out: &mut RunStore,
) -> Result<MergeReport, MergeError>
where
    I: IntoIterator<Item = (P, f64)>,
    P: AsRef<Path>,
{
    merge_selected(sources, out, Selection::Union)
}

fn merge_selected<I, P>(
    sources: I,
    out: &mut RunStore,
    selection: Selection,
) -> Result<MergeReport, MergeError>
where
    I: IntoIterator<Item = (P, f64)>,
    P: AsRef<Path>,
{
    let sources: Vec<_> = sources.into_iter().collect();
    let mut report = MergeReport::default();
    let Some(((first, first_weight), rest)) = sources.split_first() else {
        info!("No histogram sources given");
        return Ok(report);
    };
    let first = first.as_ref();
    let store = RunStore::open(first)
        .map_err(|err| MergeError::FirstSource(first.to_owned(), err))?;

    let progress = ProgressBar::new(sources.len() as u64, "files merged:");
    let mut accumulators = Vec::new();
    add_new_histograms(&store, first, *first_weight, &mut accumulators, &mut report);
    drop(store);
    progress.inc(1);

    for (source, weight) in rest {
        let source = source.as_ref();
        if let Some(store) = open_source(source, &mut report) {
            add_store(&store, source, *weight, &mut accumulators, &mut report);
            if selection == Selection::Union {
                add_new_histograms(&store, source, *weight, &mut accumulators, &mut report);
            }
        }
        progress.inc(1);
    }
    progress.finish();

    for acc in accumulators {
        if let Some(hist) = acc.hist {
            out.put_histogram(&acc.name, &hist).map_err(MergeError::Output)?;
            report.merged.push(acc.name);
        }
    }
    info!(
        "Merged {} histograms from {} files",
        report.merged.len(),
        sources.len()
    );
    Ok(report)
}

/// Start accumulating the histograms of `store` that have no accumulator yet
fn add_new_histograms(
    store: &RunStore,
    source: &Path,
    weight: f64,
    accumulators: &mut Vec<Accumulator>,
    report: &mut MergeReport,
) {
    let mut seen = HashSet::new();
    for key in store.keys() {
        if key.hist_kind().is_none() {
            debug!("Ignoring `{}` of class {}", key.name(), key.class());
            continue;
        }
        if !seen.insert(key.name()) {
            warn!("Ignoring duplicate histogram `{}` in {source:?}", key.name());
            continue;
        }
        if accumulators.iter().any(|acc| acc.name == key.name()) {
            continue;
        }
        match store.histogram(key.name()) {
            Ok(mut hist) => {
                if weight != 1. {
                    hist.scale(weight);
                }
                accumulators.push(Accumulator {
                    name: key.name().to_owned(),
                    hist: Some(hist),
                })
            }
            Err(err) => {
                let diagnostic = Diagnostic::HistogramUnreadable {
                    source: source.to_owned(),
                    name: key.name().to_owned(),
                    reason: error_chain(&err),
                };
                warn!("{diagnostic}");
                report.diagnostics.push(diagnostic);
            }
        }
    }
}

fn open_source(source: &Path, report: &mut MergeReport) -> Option<RunStore> {
    match RunStore::open(source) {
        Ok(store) => Some(store),
        Err(err) => {
            let diagnostic = Diagnostic::SourceSkipped {
                source: source.to_owned(),
                reason: error_chain(&err),
            };
            warn!("{diagnostic}");
            report.diagnostics.push(diagnostic);
            None
        }
    }
}

fn add_store(
    store: &RunStore,
    source: &Path,
    weight: f64,
    accumulators: &mut [Accumulator],
    report: &mut MergeReport,
) {
    for acc in accumulators {
        let Some(hist) = acc.hist.as_mut() else {
            continue;
        };
        let other = match store.histogram(&acc.name) {
            Ok(other) => other,
            Err(StoreError::EntryMissing(_)) => {
                let diagnostic = Diagnostic::HistogramMissing {
                    source: source.to_owned(),
                    name: acc.name.clone(),
                };
                warn!("{diagnostic}");
                report.diagnostics.push(diagnostic);
                continue;
            }
            Err(StoreError::WrongClass { found, .. }) => {
                let error = HistogramError::KindMismatch {
                    expected: hist.kind().to_string(),
                    found,
                };
                fail(acc, source, error, report);
                continue;
            }
            Err(err) => {
                let diagnostic = Diagnostic::HistogramUnreadable {
                    source: source.to_owned(),
                    name: acc.name.clone(),
                    reason: error_chain(&err),
                };
                warn!("{diagnostic}");
                report.diagnostics.push(diagnostic);
                continue;
            }
        };
        if let Err(error) = hist.add_scaled(&other, weight) {
            fail(acc, source, error, report);
        }
    }
}

fn fail(acc: &mut Accumulator, source: &Path, error: HistogramError, report: &mut MergeReport) {
    acc.hist = None;
    let failure = HistogramFailure {
        name: acc.name.clone(),
        source: source.to_owned(),
        error,
    };
    warn!("{failure}");
    report.failures.push(failure);
}

fn error_chain(err: &dyn StdError) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        msg += &format!(": {err}");
        source = err.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::histogram::{Axis, Hist1D, Hist2D};

    fn mass_axis() -> Axis {
        Axis::uniform(10, 0., 100.).unwrap()
    }

    fn write_run(dir: &Path, name: &str, masses: &[f64]) -> PathBuf {
        let mut nevent = Hist1D::<f32>::new("Number of events", Axis::uniform(1, 0., 1.).unwrap());
        let mut mass = Hist1D::<f64>::new("Dijet mass", mass_axis());
        let x = Axis::log_spaced(10, 1e-6, 1.).unwrap();
        let mut partonic_x = Hist2D::new("Partonic x", x.clone(), x);
        for &m in masses {
            nevent.fill(0.5, 1.);
            mass.fill(m, 1.);
            partonic_x.fill(m / 1000., m / 2000., 1.);
        }
        let mut store = RunStore::new();
        store.put_histogram("hnevent", &nevent.into()).unwrap();
        store.put_histogram("hDijetMass", &mass.into()).unwrap();
        store.put_histogram("hPartonicX", &partonic_x.into()).unwrap();
        let path = dir.join(name);
        store.write(&path, None).unwrap();
        path
    }

    #[test]
    fn single_source_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_run(dir.path(), "run0.root", &[15., 35., 35., 150.]);
        let mut out = RunStore::new();
        let report = merge_histograms([&source], &mut out).unwrap();
        assert_eq!(report.merged, ["hnevent", "hDijetMass", "hPartonicX"]);
        assert!(report.diagnostics.is_empty());
        assert!(!report.has_failures());
        assert_eq!(out, RunStore::open(&source).unwrap());
    }

    #[test]
    fn order_does_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_run(dir.path(), "a.root", &[5., 15.]);
        let b = write_run(dir.path(), "b.root", &[15., 25., 95.]);
        let c = write_run(dir.path(), "c.root", &[-1., 55.]);

        let mut abc = RunStore::new();
        merge_histograms([&a, &b, &c], &mut abc).unwrap();
        let mut cab = RunStore::new();
        merge_histograms([&c, &a, &b], &mut cab).unwrap();

        let mut ab = RunStore::new();
        merge_histograms([&a, &b], &mut ab).unwrap();
        let ab_path = dir.path().join("ab.root");
        ab.write(&ab_path, None).unwrap();
        let mut ab_c = RunStore::new();
        merge_histograms([&ab_path, &c], &mut ab_c).unwrap();

        for name in ["hnevent", "hDijetMass", "hPartonicX"] {
            let expected = abc.histogram(name).unwrap();
            assert_eq!(cab.histogram(name).unwrap(), expected);
            assert_eq!(ab_c.histogram(name).unwrap(), expected);
        }
        let Histogram::TH1D(mass) = abc.histogram("hDijetMass").unwrap() else {
            panic!("wrong histogram kind");
        };
        assert_eq!(mass.bin_content(0), 1.);
        assert_eq!(mass.bin_content(2), 2.);
        assert_eq!(mass.entries(), 7.);
        assert_eq!(abc.histogram("hnevent").unwrap().integral(), 7.);
    }

    #[test]
    fn tolerate_missing_histogram() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_run(dir.path(), "a.root", &[5.]);
        let mut partial = RunStore::open(&a).unwrap();
        let mut store = RunStore::new();
        for name in ["hnevent", "hPartonicX"] {
            store.put_histogram(name, &partial.histogram(name).unwrap()).unwrap();
        }
        let b = dir.path().join("b.root");
        store.write(&b, None).unwrap();
        partial.put_raw("comment", "TObjString", "no histogram".into());
        partial.write(&a, None).unwrap();

        let mut out = RunStore::new();
        let report = merge_histograms([&a, &b], &mut out).unwrap();
        assert_eq!(
            report.diagnostics,
            [Diagnostic::HistogramMissing {
                source: b.clone(),
                name: "hDijetMass".to_owned()
            }]
        );
        assert_eq!(out.len(), 3);
        assert!(out.key("comment").is_none());
        assert_eq!(out.histogram("hDijetMass").unwrap().integral(), 1.);
        assert_eq!(out.histogram("hnevent").unwrap().integral(), 2.);
    }

    #[test]
    fn skip_unreadable_source() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_run(dir.path(), "a.root", &[5.]);
        let missing = dir.path().join("missing.root");
        let mut out = RunStore::new();
        let report = merge_histograms([&a, &missing], &mut out).unwrap();
        assert!(matches!(
            &report.diagnostics[..],
            [Diagnostic::SourceSkipped { source, .. }] if source == &missing
        ));
        assert_eq!(out.histogram("hnevent").unwrap().integral(), 1.);

        let err = merge_histograms([&missing, &a], &mut RunStore::new()).unwrap_err();
        assert!(matches!(err, MergeError::FirstSource(..)));
    }

    #[test]
    fn binning_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_run(dir.path(), "a.root", &[5.]);
        let mut store = RunStore::open(&a).unwrap();
        let coarse = Hist1D::<f64>::new("Dijet mass", Axis::uniform(5, 0., 100.).unwrap());
        store.put_histogram("hDijetMass", &coarse.into()).unwrap();
        let b = dir.path().join("b.root");
        store.write(&b, None).unwrap();

        let mut out = RunStore::new();
        let report = merge_histograms([&a, &b], &mut out).unwrap();
        assert_eq!(
            report.failures,
            [HistogramFailure {
                name: "hDijetMass".to_owned(),
                source: b,
                error: HistogramError::BinningMismatch,
            }]
        );
        assert!(out.key("hDijetMass").is_none());
        assert_eq!(report.merged, ["hnevent", "hPartonicX"]);
    }

    #[test]
    fn kind_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_run(dir.path(), "a.root", &[5.]);
        let mut store = RunStore::open(&a).unwrap();
        let double = Hist1D::<f64>::new("Number of events", Axis::uniform(1, 0., 1.).unwrap());
        store.put_histogram("hnevent", &double.into()).unwrap();
        let b = dir.path().join("b.root");
        store.write(&b, None).unwrap();

        let mut out = RunStore::new();
        let report = merge_histograms([&a, &b], &mut out).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].error,
            HistogramError::KindMismatch {
                expected: "TH1F".to_owned(),
                found: "TH1D".to_owned()
            }
        );
    }

    #[test]
    fn weighted() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_run(dir.path(), "a.root", &[5.]);
        let b = write_run(dir.path(), "b.root", &[5.]);
        let mut out = RunStore::new();
        merge_weighted_histograms([(&a, 2.), (&b, 3.)], &mut out).unwrap();
        let Histogram::TH1D(mass) = out.histogram("hDijetMass").unwrap() else {
            panic!("wrong histogram kind");
        };
        assert_eq!(mass.bin_content(1), 5.);
        assert_eq!(mass.bin_error(1), 13f64.sqrt());
        assert_eq!(mass.entries(), 2.);
    }

    #[test]
    fn no_sources() {
        let mut out = RunStore::new();
        let report = merge_histograms(Vec::<PathBuf>::new(), &mut out).unwrap();
        assert_eq!(report, MergeReport::default());
        assert!(out.is_empty());
    }

    #[test]
    fn oversized_histogram_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_run(dir.path(), "a.root", &[5.]);
        let mut store = RunStore::open(&a).unwrap();
        let huge: serde_yaml::Value = serde_yaml::from_str(
            "
title: Dijet mass
x: {binning: uniform, nbins: 18446744073709551615, min: 0, max: 100}
entries: 0
sumw: [0.0]
sumw2: [0.0]
",
        )
        .unwrap();
        store.put_raw("hDijetMass", "TH1D", huge);
        let b = dir.path().join("b.root");
        store.write(&b, None).unwrap();

        let mut out = RunStore::new();
        let report = merge_histograms([&a, &b], &mut out).unwrap();
        assert!(matches!(
            &report.diagnostics[..],
            [Diagnostic::HistogramUnreadable { source, name, .. }]
                if source == &b && name == "hDijetMass"
        ));
        assert!(!report.has_failures());
        assert_eq!(report.merged, ["hnevent", "hDijetMass", "hPartonicX"]);
        assert_eq!(out.histogram("hDijetMass").unwrap().integral(), 1.);
        assert_eq!(out.histogram("hnevent").unwrap().integral(), 2.);
    }

    #[test]
    fn duplicate_names_in_first_source() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_run(dir.path(), "a.root", &[5.]);
        let mut doc = serde_yaml::to_value(RunStore::open(&a).unwrap()).unwrap();
        let keys = doc.get_mut("keys").unwrap().as_sequence_mut().unwrap();
        let first = keys[0].clone();
        keys.push(first);
        std::fs::write(&a, serde_yaml::to_string(&doc).unwrap()).unwrap();
        let b = write_run(dir.path(), "b.root", &[5.]);

        let mut out = RunStore::new();
        let report = merge_histograms([&a, &b], &mut out).unwrap();
        assert_eq!(report.merged, ["hnevent", "hDijetMass", "hPartonicX"]);
        assert_eq!(out.len(), 3);
        assert_eq!(out.histogram("hnevent").unwrap().integral(), 2.);
    }

    #[test]
    fn combine_takes_union_of_histograms() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_run(dir.path(), "a.root", &[5.]);
        let b = write_run(dir.path(), "b.root", &[5.]);
        let mut store = RunStore::open(&b).unwrap();
        let mut extra = Hist1D::<f64>::new("Leading jet pT", mass_axis());
        extra.fill(45., 1.);
        store.put_histogram("hLeadingJetPt", &extra.into()).unwrap();
        store.write(&b, None).unwrap();
        let c = write_run(dir.path(), "c.root", &[5.]);

        let mut first_only = RunStore::new();
        let report = merge_weighted_histograms([(&a, 1.), (&b, 1.)], &mut first_only).unwrap();
        assert!(first_only.key("hLeadingJetPt").is_none());
        assert!(report.diagnostics.is_empty());

        let mut out = RunStore::new();
        let report =
            combine_weighted_histograms([(&a, 1.), (&b, 2.), (&c, 4.)], &mut out).unwrap();
        assert_eq!(
            report.merged,
            ["hnevent", "hDijetMass", "hPartonicX", "hLeadingJetPt"]
        );
        assert_eq!(
            report.diagnostics,
            [Diagnostic::HistogramMissing {
                source: c,
                name: "hLeadingJetPt".to_owned()
            }]
        );
        assert_eq!(out.histogram("hLeadingJetPt").unwrap().integral(), 2.);
        assert_eq!(out.histogram("hnevent").unwrap().integral(), 7.);
    }
}
