use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::{
    event::NFIELDS,
    ntuple::{BindError, Ntuple},
    progress_bar::{Progress, ProgressBar},
    source::{MERGED_NTUPLE, MERGED_NTUPLE_TITLE, RUN_NTUPLE},
    store::{RunStore, StoreError},
};

/// Concatenates the event tables of many run outputs
///
/// Rows are appended in the order of the sources, and within each
/// source in their stored order. Columns are matched by name.
#[derive(Clone, Debug, TypedBuilder)]
pub struct TupleMerger {
    /// Name of the event table in each source
    #[builder(default = RUN_NTUPLE.to_owned(), setter(into))]
    input_table: String,
    /// Name of the merged table
    #[builder(default = MERGED_NTUPLE.to_owned(), setter(into))]
    output_table: String,
    /// Title of the merged table
    #[builder(default = MERGED_NTUPLE_TITLE.to_owned(), setter(into))]
    title: String,
}

impl Default for TupleMerger {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Summary of a successful event table merge
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TupleMergeSummary {
    /// Number of rows taken from each source, in source order
    pub rows_per_source: Vec<usize>,
}

impl TupleMergeSummary {
    pub fn total_rows(&self) -> usize {
        self.rows_per_source.iter().sum()
    }
}

impl TupleMerger {
    /// Merge the event tables of all `sources` into `out`
    ///
    /// Any source that cannot be read, lacks the event table, or whose
    /// table lacks an event record column aborts the merge. In that case
    /// `out` is not modified.
    pub fn merge<I, P>(
        &self,
        sources: I,
        out: &mut RunStore,
    ) -> Result<TupleMergeSummary, TupleMergeError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let sources: Vec<_> = sources.into_iter().collect();
        let mut merged = Ntuple::with_event_schema(&self.title);
        let mut summary = TupleMergeSummary::default();
        let progress = ProgressBar::new(sources.len() as u64, "files merged:");
        for source in &sources {
            let source = source.as_ref();
            let nrows = self.append(source, &mut merged)?;
            debug!("{nrows} events from {source:?}");
            summary.rows_per_source.push(nrows);
            progress.inc(1);
        }
        progress.finish();
        out.put_ntuple(&self.output_table, &merged)
            .map_err(TupleMergeError::Output)?;
        info!(
            "Merged {} events from {} files",
            summary.total_rows(),
            sources.len()
        );
        Ok(summary)
    }

    fn append(&self, source: &Path, merged: &mut Ntuple) -> Result<usize, TupleMergeError> {
        use TupleMergeError::*;

        let store = RunStore::open(source)
            .map_err(|err| Source(source.to_owned(), err))?;
        let table = store
            .ntuple(&self.input_table)
            .map_err(|err| Source(source.to_owned(), err))?;
        let records = table.bind().map_err(|err| Schema {
            source_file: source.to_owned(),
            table: self.input_table.clone(),
            err,
        })?;
        let nrows = records.len();
        for record in records {
            let row: [f32; NFIELDS] = record.into();
            merged.fill(&row).map_err(|err| Schema {
                source_file: source.to_owned(),
                table: self.output_table.clone(),
                err,
            })?;
        }
        Ok(nrows)
    }
}

#[derive(Debug, Error)]
pub enum TupleMergeError {
    #[error("Failed to read event table from {0:?}")]
    Source(PathBuf, #[source] StoreError),
    #[error("Event table `{table}` in {source_file:?} does not match the event record")]
    Schema {
        source_file: PathBuf,
        table: String,
        #[source]
        err: BindError,
    },
    #[error("Failed to store merged event table")]
    Output(#[source] StoreError),
}
