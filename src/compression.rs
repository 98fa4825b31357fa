use std::io::Write;
use std::str::FromStr;

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

const GZIP_DEFAULT_LEVEL: u8 = 6;
const LZ4_DEFAULT_LEVEL: u8 = 0;
const ZSTD_DEFAULT_LEVEL: u8 = 0;

lazy_static! {
    static ref COMPRESSION_RE: Regex =
        Regex::new(r"^(?P<algo>[[:alnum:]]+)(?P<lvl>_\d+)?$").unwrap();
}

/// Compression format
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Compression {
    /// The bzip2 format
    Bzip2,
    /// The gzip format with compression level as associated value
    Gzip(u8),
    /// The lz4 format with compression level as associated value
    Lz4(u8),
    /// The zstd format with compression level as associated value
    Zstd(u8),
}

/// Convert into a writer that compresses to the given format
pub fn compress_writer<'a, W: 'a + Write>(
    writer: W,
    compression: Option<Compression>,
) -> Result<Box<dyn Write + 'a>, std::io::Error> {
    match compression {
        Some(Compression::Bzip2) => {
            let encoder = BzEncoder::new(writer, bzip2::Compression::best());
            Ok(Box::new(encoder))
        }
        Some(Compression::Gzip(lvl)) => {
            let encoder =
                GzEncoder::new(writer, flate2::Compression::new(lvl.into()));
            Ok(Box::new(encoder))
        }
        Some(Compression::Lz4(lvl)) => {
            let encoder = lz4::EncoderBuilder::new()
                .auto_flush(true)
                .level(lvl.into())
                .build(writer)?;
            Ok(Box::new(encoder))
        }
        Some(Compression::Zstd(lvl)) => {
            let encoder = zstd::Encoder::new(writer, lvl.into())?;
            Ok(Box::new(encoder.auto_finish()))
        }
        None => Ok(Box::new(writer)),
    }
}

impl FromStr for Compression {
    type Err = ParseCompressionErr;

    /// Parse `algorithm` or `algorithm_level`, e.g. `gzip` or `zstd_5`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Compression::*;
        use ParseCompressionErr::*;

        let lower_case = s.to_ascii_lowercase();
        let Some(captures) = COMPRESSION_RE.captures(&lower_case) else {
            return Err(UnknownAlgorithm(s.to_owned()));
        };
        let algo = &captures["algo"];
        let lvl = captures.name("lvl").map(|l| l.as_str());
        let parse_lvl = |max: u8, default: u8| -> Result<u8, Self::Err> {
            let Some(lvl) = lvl else {
                return Ok(default);
            };
            match lvl[1..].parse::<u8>() {
                Ok(n) if n <= max => Ok(n),
                _ => Err(UnsupportedLevel(lvl.to_owned(), algo.to_owned())),
            }
        };
        match algo {
            "bzip2" | "bz2" => match lvl {
                Some(lvl) => Err(UnsupportedLevel(lvl.to_owned(), algo.to_owned())),
                None => Ok(Bzip2),
            },
            "gzip" | "gz" => parse_lvl(9, GZIP_DEFAULT_LEVEL).map(Gzip),
            "lz4" => parse_lvl(16, LZ4_DEFAULT_LEVEL).map(Lz4),
            "zstd" | "zstandard" => {
                parse_lvl(19, ZSTD_DEFAULT_LEVEL).map(Zstd)
            }
            _ => Err(UnknownAlgorithm(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseCompressionErr {
    #[error("Unknown compression algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Level {0} not supported for {1} compression")]
    UnsupportedLevel(String, String),
}
