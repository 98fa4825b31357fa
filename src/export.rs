use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::info;
use thiserror::Error;

use crate::{
    event::{EventRecord, EXPORT_HEADER},
    ntuple::{BindError, Ntuple},
    store::{RunStore, StoreError},
};

/// Write all records of `table` as comma-separated values
///
/// Returns the number of rows written, not counting the header.
pub fn export_csv<W: Write>(table: &Ntuple, mut out: W) -> Result<usize, ExportError> {
    let records = table.bind()?;
    writeln!(out, "{}", EXPORT_HEADER.join(","))?;
    let mut nrows = 0;
    for record in records {
        write_row(&mut out, &record)?;
        nrows += 1;
    }
    out.flush()?;
    Ok(nrows)
}

fn write_row<W: Write>(mut out: W, r: &EventRecord) -> std::io::Result<()> {
    writeln!(
        out,
        "{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{},{}",
        r.event as i32,
        r.dijet_mass,
        r.leading_jet_pt,
        r.subleading_jet_pt,
        r.delta_phi,
        r.delta_eta,
        r.x1,
        r.x2,
        r.parton1_id as i32,
        r.parton2_id as i32,
    )
}

/// Export the event table `table` stored in `input` to the file `output`
pub fn export_file(input: &Path, table: &str, output: &Path) -> Result<usize, ExportError> {
    let store = RunStore::open(input)?;
    let table = store.ntuple(table)?;
    let file = File::create(output).map_err(|err| ExportError::Create(output.to_owned(), err))?;
    let nrows = export_csv(&table, BufWriter::new(file))?;
    info!("Exported {nrows} events to {output:?}");
    Ok(nrows)
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to read event table")]
    Store(#[from] StoreError),
    #[error("Event table does not match the event record")]
    Schema(#[from] BindError),
    #[error("Failed to create {0:?}")]
    Create(PathBuf, #[source] std::io::Error),
    #[error("Failed to write")]
    Write(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::source::MERGED_NTUPLE;

    fn table() -> Ntuple {
        let mut table = Ntuple::with_event_schema("Merged Dijet Ntuple");
        let record: EventRecord =
            [7., 123.456, 50.1, 30.2, 3.14159, 0.01, 0.002, 0.5, 21., -1.].into();
        table.fill_record(&record).unwrap();
        let record: EventRecord =
            [8.9, 80., 45., 35., 2.9, -1.25, 0.1, 0.03, -2.7, 1.].into();
        table.fill_record(&record).unwrap();
        table
    }

    #[test]
    fn format() {
        let mut out = Vec::new();
        let nrows = export_csv(&table(), &mut out).unwrap();
        assert_eq!(nrows, 2);
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            lines,
            [
                "Event,Mass,LeadPt,SubleadPt,DeltaPhi,DeltaEta,x1,x2,Parton1,Parton2",
                "7,123.46,50.10,30.20,3.14,0.01,0.00,0.50,21,-1",
                "8,80.00,45.00,35.00,2.90,-1.25,0.10,0.03,-2,1",
            ]
        );
    }

    #[test]
    fn empty_table() {
        let mut out = Vec::new();
        let nrows = export_csv(&Ntuple::with_event_schema("empty"), &mut out).unwrap();
        assert_eq!(nrows, 0);
        assert_eq!(out.split(|&c| c == b'\n').count(), 2);
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("merged_tuple.root");
        let output = dir.path().join("dijet_data.csv");
        let mut store = RunStore::new();
        store.put_ntuple(MERGED_NTUPLE, &table()).unwrap();
        store.write(&input, None).unwrap();

        assert_eq!(export_file(&input, MERGED_NTUPLE, &output).unwrap(), 2);
        let csv = std::fs::read_to_string(&output).unwrap();
        assert_eq!(csv.lines().count(), 3);

        let err = export_file(&input, "dijetNtuple", &output).unwrap_err();
        assert!(matches!(err, ExportError::Store(StoreError::EntryMissing(_))));
        let err = export_file(&dir.path().join("missing.root"), MERGED_NTUPLE, &output)
            .unwrap_err();
        assert!(matches!(err, ExportError::Store(StoreError::Open(..))));
    }
}
