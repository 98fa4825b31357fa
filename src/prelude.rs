pub use crate::{
    event::EventRecord,
    export::{export_csv, export_file},
    histogram::{Axis, Hist1D, Hist2D, HistKind, Histogram},
    merge::{
        combine_weighted_histograms, merge_histograms, merge_weighted_histograms, MergeReport,
    },
    ntuple::Ntuple,
    pthat::PtHatConfig,
    sigma::{collect_sigma_records, write_report},
    source::SourceTemplate,
    store::RunStore,
    traits::{AddScaled, Scale},
    tuple::TupleMerger,
};
