use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use audec::auto_decompress;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    compression::{compress_writer, Compression},
    histogram::{DecodeError, HistKind, Histogram},
    ntuple::{BindError, Ntuple},
};

const ROOT_MAGIC_BYTES: [u8; 4] = [b'r', b'o', b'o', b't'];

/// Class name of event tables
pub const NTUPLE_CLASS: &str = "TNtuple";

/// A record store holding the tables and histograms of one run
///
/// Entries are kept in insertion order and have unique names. Each entry
/// carries its class name, so entries of unknown classes can be listed
/// and skipped without being decoded.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct RunStore {
    keys: Vec<Key>,
}

/// A named entry in a [RunStore]
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Key {
    name: String,
    class: String,
    object: serde_yaml::Value,
}

impl Key {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// The histogram kind, if this entry is one of the recognised histograms
    pub fn hist_kind(&self) -> Option<HistKind> {
        HistKind::from_str(&self.class).ok()
    }

    fn decode_histogram(&self) -> Result<Histogram, StoreError> {
        let Some(kind) = self.hist_kind() else {
            return Err(StoreError::WrongClass {
                name: self.name.clone(),
                expected: "histogram".to_owned(),
                found: self.class.clone(),
            });
        };
        Histogram::from_value(kind, self.object.clone()).map_err(|source| {
            StoreError::DecodeHistogram {
                name: self.name.clone(),
                source,
            }
        })
    }

    fn decode_ntuple(&self) -> Result<Ntuple, StoreError> {
        let ntuple: Ntuple = serde_yaml::from_value(self.object.clone())
            .map_err(|source| StoreError::DecodeNtuple {
                name: self.name.clone(),
                source,
            })?;
        ntuple.check_rows().map_err(|source| StoreError::MalformedNtuple {
            name: self.name.clone(),
            source,
        })?;
        Ok(ntuple)
    }
}

impl RunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a store from the file at `path`
    ///
    /// Compressed files are decompressed transparently.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!("Reading {path:?}");
        let file = File::open(path)
            .map_err(|err| StoreError::Open(path.to_owned(), err))?;
        let mut r = auto_decompress(BufReader::new(file));
        let is_root = match r.fill_buf() {
            Ok(bytes) => bytes.starts_with(&ROOT_MAGIC_BYTES),
            Err(err) => return Err(StoreError::Open(path.to_owned(), err)),
        };
        if is_root {
            return Err(StoreError::RootUnsupported(path.to_owned()));
        }
        let store = Self::from_reader(r)
            .map_err(|err| StoreError::Parse(path.to_owned(), err))?;
        trace!("{path:?} has {} entries", store.keys.len());
        Ok(store)
    }

    /// Read an uncompressed store
    pub fn from_reader<R: BufRead>(r: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(r)
    }

    /// Write the store to `path`, replacing any existing file
    pub fn write<P: AsRef<Path>>(
        &self,
        path: P,
        compression: Option<Compression>,
    ) -> Result<(), StoreError> {
        let path = path.as_ref();
        debug!("Writing {} entries to {path:?}", self.keys.len());
        let file = File::create(path)
            .map_err(|err| StoreError::Create(path.to_owned(), err))?;
        let out = compress_writer(BufWriter::new(file), compression)
            .map_err(|err| StoreError::Create(path.to_owned(), err))?;
        self.to_writer(out)
            .map_err(|err| StoreError::Write(path.to_owned(), err))
    }

    /// Write the uncompressed store
    pub fn to_writer<W: Write>(&self, mut w: W) -> Result<(), std::io::Error> {
        serde_yaml::to_writer(&mut w, self)
            .map_err(|e| std::io::Error::new(ErrorKind::Other, e))?;
        w.flush()
    }

    /// All entries in insertion order
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.name == name)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Decode the event table with the given name
    pub fn ntuple(&self, name: &str) -> Result<Ntuple, StoreError> {
        let key = self.key(name).ok_or_else(|| StoreError::EntryMissing(name.to_owned()))?;
        if key.class != NTUPLE_CLASS {
            return Err(StoreError::WrongClass {
                name: name.to_owned(),
                expected: NTUPLE_CLASS.to_owned(),
                found: key.class.clone(),
            });
        }
        key.decode_ntuple()
    }

    /// Decode the histogram with the given name
    pub fn histogram(&self, name: &str) -> Result<Histogram, StoreError> {
        let key = self.key(name).ok_or_else(|| StoreError::EntryMissing(name.to_owned()))?;
        key.decode_histogram()
    }

    pub fn put_ntuple(&mut self, name: &str, ntuple: &Ntuple) -> Result<(), StoreError> {
        let object = serde_yaml::to_value(ntuple).map_err(|source| StoreError::Encode {
            name: name.to_owned(),
            source,
        })?;
        self.put_raw(name, NTUPLE_CLASS, object);
        Ok(())
    }

    pub fn put_histogram(&mut self, name: &str, hist: &Histogram) -> Result<(), StoreError> {
        let object = hist.to_value().map_err(|source| StoreError::Encode {
            name: name.to_owned(),
            source,
        })?;
        self.put_raw(name, &hist.kind().to_string(), object);
        Ok(())
    }

    /// Insert an entry, replacing any entry with the same name
    pub fn put_raw(&mut self, name: &str, class: &str, object: serde_yaml::Value) {
        let key = Key {
            name: name.to_owned(),
            class: class.to_owned(),
            object,
        };
        match self.keys.iter_mut().find(|k| k.name == name) {
            Some(old) => *old = key,
            None => self.keys.push(key),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open {0:?}")]
    Open(PathBuf, #[source] std::io::Error),
    #[error("{0:?} is a ROOT file. Reading ROOT files is not supported")]
    RootUnsupported(PathBuf),
    #[error("Failed to parse {0:?}")]
    Parse(PathBuf, #[source] serde_yaml::Error),
    #[error("Failed to create {0:?}")]
    Create(PathBuf, #[source] std::io::Error),
    #[error("Failed to write to {0:?}")]
    Write(PathBuf, #[source] std::io::Error),
    #[error("No entry named `{0}`")]
    EntryMissing(String),
    #[error("Entry `{name}` is a {found}, expected {expected}")]
    WrongClass {
        name: String,
        expected: String,
        found: String,
    },
    #[error("Failed to decode event table `{name}`")]
    DecodeNtuple {
        name: String,
        source: serde_yaml::Error,
    },
    #[error("Event table `{name}` is malformed")]
    MalformedNtuple { name: String, source: BindError },
    #[error("Failed to decode histogram `{name}`")]
    DecodeHistogram { name: String, source: DecodeError },
    #[error("Failed to encode entry `{name}`")]
    Encode {
        name: String,
        source: serde_yaml::Error,
    },
}
