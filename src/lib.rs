//! `dijetmerge` combines the output of many independent dijet
//! simulation runs.
//!
//! Every run writes one [RunStore](store::RunStore) holding an event
//! table (`dijetNtuple`) and a set of histograms. This crate
//!
//! - concatenates the event tables of many runs ([tuple]),
//! - sums same-named histograms bin by bin ([merge]),
//! - exports a merged event table to CSV ([export]),
//! - combines pT-hat sliced samples with cross-section weights ([pthat]),
//! - summarises the generator cross sections found in run logs ([sigma]).
//!
//! ## Most relevant modules
//!
//! - [prelude] exports the most relevant types and functions
//! - [store] for the on-disk record store
//! - [histogram] and [ntuple] for the stored objects
//! - [source] for enumerating per-run files
//!

/// Output compression
pub mod compression;
/// Event record schema
pub mod event;
/// Export of event tables to delimited text
pub mod export;
/// Histograms with fixed binning
pub mod histogram;
/// Histogram merging
pub mod merge;
/// Event tables
pub mod ntuple;
/// Most important exports
pub mod prelude;
/// Progress bar
pub mod progress_bar;
/// Weighted combination of pT-hat bins
pub mod pthat;
/// Generator cross-section summary
pub mod sigma;
/// Per-run input files
pub mod source;
/// Record store
pub mod store;
/// Common traits
pub mod traits;
/// Event table merging
pub mod tuple;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_REV: Option<&str> = option_env!("VERGEN_GIT_SHA");
pub const GIT_BRANCH: Option<&str> = option_env!("VERGEN_GIT_BRANCH");
