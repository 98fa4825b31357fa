use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{EventRecord, FIELD_NAMES, NFIELDS};

/// A flat table of single-precision values with named columns
///
/// Every row has exactly one value per column.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Ntuple {
    title: String,
    columns: Vec<String>,
    rows: Vec<Vec<f32>>,
}

impl Ntuple {
    /// Empty table with the given title and column names
    pub fn new<I, S>(title: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.to_owned(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Empty table with the [EventRecord] columns
    pub fn with_event_schema(title: &str) -> Self {
        Self::new(title, FIELD_NAMES)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Append a row
    pub fn fill(&mut self, row: &[f32]) -> Result<(), BindError> {
        if row.len() != self.columns.len() {
            return Err(BindError::RowLength {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row.to_vec());
        Ok(())
    }

    /// Append an event record to a table with [EventRecord] columns
    ///
    /// The values are placed according to the column names, so the
    /// column order of the table does not matter.
    pub fn fill_record(&mut self, record: &EventRecord) -> Result<(), BindError> {
        let binding = RecordBinding::new(self.columns.as_slice())?;
        let values: [f32; NFIELDS] = (*record).into();
        let mut row = vec![0.; self.columns.len()];
        for (field, &col) in binding.columns.iter().enumerate() {
            row[col] = values[field];
        }
        self.fill(&row)
    }

    /// Bind the [EventRecord] fields to the columns of this table
    ///
    /// Fails if a field has no column of the same name or if the table
    /// is malformed.
    pub fn bind(&self) -> Result<BoundRecords<'_>, BindError> {
        self.check_rows()?;
        let binding = RecordBinding::new(self.columns.as_slice())?;
        Ok(BoundRecords { binding, rows: self.rows.iter() })
    }

    pub(crate) fn check_rows(&self) -> Result<(), BindError> {
        let expected = self.columns.len();
        match self.rows.iter().position(|r| r.len() != expected) {
            Some(row) => Err(BindError::RowLength {
                row,
                expected,
                found: self.rows[row].len(),
            }),
            None => Ok(()),
        }
    }
}

/// Column index for each [EventRecord] field
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RecordBinding {
    columns: [usize; NFIELDS],
}

impl RecordBinding {
    /// Look up the [EventRecord] fields by name among `columns`
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Result<Self, BindError> {
        let mut idx = [0; NFIELDS];
        for (field, name) in FIELD_NAMES.iter().enumerate() {
            idx[field] = columns
                .iter()
                .position(|c| c.as_ref() == *name)
                .ok_or_else(|| BindError::MissingColumn(name.to_string()))?;
        }
        Ok(Self { columns: idx })
    }

    /// Read an event record from a row
    ///
    /// The row has to contain all bound columns.
    pub fn read(&self, row: &[f32]) -> EventRecord {
        let mut values = [0.; NFIELDS];
        for (v, &col) in values.iter_mut().zip(self.columns.iter()) {
            *v = row[col];
        }
        values.into()
    }
}

/// Iterator over the rows of a table as [EventRecord]s
#[derive(Clone, Debug)]
pub struct BoundRecords<'a> {
    binding: RecordBinding,
    rows: std::slice::Iter<'a, Vec<f32>>,
}

impl<'a> Iterator for BoundRecords<'a> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| self.binding.read(row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<'a> ExactSizeIterator for BoundRecords<'a> {}

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum BindError {
    #[error("No column named `{0}`")]
    MissingColumn(String),
    #[error("Row {row} has {found} values, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: f32) -> EventRecord {
        [n, 100. + n, 50., 30., 3.1, 0.2, 1e-3, 0.5, 21., -1.].into()
    }

    #[test]
    fn bind_by_name() {
        // same columns in reverse order
        let mut columns = FIELD_NAMES.to_vec();
        columns.reverse();
        let mut table = Ntuple::new("reversed", columns);
        table.fill_record(&record(1.)).unwrap();
        table.fill_record(&record(2.)).unwrap();
        assert_eq!(table.rows().next().unwrap()[0], -1.);

        let records: Vec<_> = table.bind().unwrap().collect();
        assert_eq!(records, vec![record(1.), record(2.)]);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let mut columns = vec!["weight"];
        columns.extend(FIELD_NAMES);
        let mut table = Ntuple::new("extra", columns);
        let mut row = vec![0.5];
        row.extend(<[f32; NFIELDS]>::from(record(3.)));
        table.fill(&row).unwrap();
        assert_eq!(table.bind().unwrap().next(), Some(record(3.)));
    }

    #[test]
    fn missing_column() {
        let table = Ntuple::new("short", FIELD_NAMES[..9].iter().copied());
        assert_eq!(
            table.bind().unwrap_err(),
            BindError::MissingColumn("parton2Id".to_owned())
        );
    }

    #[test]
    fn row_length() {
        let mut table = Ntuple::with_event_schema("t");
        let err = table.fill(&[1., 2.]).unwrap_err();
        assert_eq!(
            err,
            BindError::RowLength { row: 0, expected: NFIELDS, found: 2 }
        );
        assert!(table.is_empty());
    }
}
