use std::fmt::Debug;
use std::ops::AddAssign;

use num_traits::Zero;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::traits::{AddScaled, Scale};

/// Maximum number of bins per axis
pub const MAX_BINS: usize = u32::MAX as usize;

/// Binning of a histogram axis
///
/// Bin 0 is the underflow bin, bins 1 to `nbins` cover the axis range,
/// and bin `nbins + 1` is the overflow bin.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "binning", rename_all = "lowercase")]
pub enum Axis {
    /// `nbins` bins of equal width between `min` and `max`
    Uniform { nbins: usize, min: f64, max: f64 },
    /// Bins with explicit, strictly increasing edges
    Variable { edges: Vec<f64> },
}

impl Axis {
    pub fn uniform(nbins: usize, min: f64, max: f64) -> Result<Self, HistogramError> {
        let axis = Self::Uniform { nbins, min, max };
        axis.validate()?;
        Ok(axis)
    }

    pub fn variable(edges: Vec<f64>) -> Result<Self, HistogramError> {
        let axis = Self::Variable { edges };
        axis.validate()?;
        Ok(axis)
    }

    /// `nbins` bins of equal width in log10 between `min` and `max`
    pub fn log_spaced(nbins: usize, min: f64, max: f64) -> Result<Self, HistogramError> {
        if !(min > 0. && max > min) || nbins == 0 {
            return Err(HistogramError::InvalidAxis(format!(
                "Cannot build {nbins} logarithmic bins between {min} and {max}"
            )));
        }
        let (log_min, log_max) = (min.log10(), max.log10());
        let step = (log_max - log_min) / nbins as f64;
        let edges = (0..=nbins)
            .map(|i| 10f64.powf(log_min + i as f64 * step))
            .collect();
        Self::variable(edges)
    }

    /// Number of bins, excluding underflow and overflow
    pub fn nbins(&self) -> usize {
        match self {
            Self::Uniform { nbins, .. } => *nbins,
            Self::Variable { edges } => edges.len().saturating_sub(1),
        }
    }

    /// Number of bins including underflow and overflow
    fn storage_len(&self) -> Result<usize, HistogramError> {
        let nbins = self.nbins();
        nbins
            .checked_add(2)
            .ok_or_else(|| HistogramError::InvalidAxis(format!("Too many bins: {nbins}")))
    }

    /// Index of the bin containing `x`
    ///
    /// NaN ends up in the overflow bin.
    pub fn find_bin(&self, x: f64) -> usize {
        let nbins = self.nbins();
        match self {
            Self::Uniform { min, max, .. } => {
                if x < *min {
                    0
                } else if x >= *max || x.is_nan() {
                    nbins + 1
                } else {
                    let bin = ((x - min) / (max - min) * nbins as f64) as usize;
                    1 + bin.min(nbins - 1)
                }
            }
            Self::Variable { edges } => {
                if x.is_nan() {
                    return nbins + 1;
                }
                edges.partition_point(|&e| e <= x)
            }
        }
    }

    fn validate(&self) -> Result<(), HistogramError> {
        use HistogramError::InvalidAxis;
        match self {
            Self::Uniform { nbins, min, max } => {
                if *nbins == 0 {
                    return Err(InvalidAxis("Need at least one bin".to_owned()));
                }
                if *nbins > MAX_BINS {
                    return Err(InvalidAxis(format!("Too many bins: {nbins}")));
                }
                if !(min.is_finite() && max.is_finite() && min < max) {
                    return Err(InvalidAxis(format!("Invalid range [{min}, {max})")));
                }
            }
            Self::Variable { edges } => {
                if edges.len() < 2 {
                    return Err(InvalidAxis("Need at least two bin edges".to_owned()));
                }
                if edges.iter().any(|e| !e.is_finite()) {
                    return Err(InvalidAxis("Bin edges have to be finite".to_owned()));
                }
                if edges.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(InvalidAxis(
                        "Bin edges have to be strictly increasing".to_owned(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Numeric type for the accumulated bin weights
pub trait BinValue: Copy + Debug + PartialEq + Zero + AddAssign {
    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;
}

impl BinValue for f32 {
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        self.into()
    }
}

impl BinValue for f64 {
    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// One-dimensional histogram
///
/// Stores the sum of weights in precision `T` and the sum of squared
/// weights in double precision for each bin, including underflow and
/// overflow.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Hist1D<T> {
    title: String,
    x: Axis,
    entries: f64,
    sumw: Vec<T>,
    sumw2: Vec<f64>,
}

impl<T: BinValue> Hist1D<T> {
    pub fn new(title: &str, x: Axis) -> Self {
        let nbins = x.nbins() + 2;
        Self {
            title: title.to_owned(),
            x,
            entries: 0.,
            sumw: vec![T::zero(); nbins],
            sumw2: vec![0.; nbins],
        }
    }

    pub fn fill(&mut self, x: f64, weight: f64) {
        let bin = self.x.find_bin(x);
        self.sumw[bin] += T::from_f64(weight);
        self.sumw2[bin] += weight * weight;
        self.entries += 1.;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn axis(&self) -> &Axis {
        &self.x
    }

    /// Number of fills
    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// Sum of weights in the given bin
    pub fn bin_content(&self, bin: usize) -> f64 {
        self.sumw[bin].to_f64()
    }

    /// Statistical uncertainty of the given bin
    pub fn bin_error(&self, bin: usize) -> f64 {
        self.sumw2[bin].sqrt()
    }

    /// Sum of weights in all bins except underflow and overflow
    pub fn integral(&self) -> f64 {
        let n = self.x.nbins();
        self.sumw[1..=n].iter().map(|w| w.to_f64()).sum()
    }

    pub(crate) fn validate(&self) -> Result<(), HistogramError> {
        self.x.validate()?;
        let nbins = self.x.storage_len()?;
        check_len(self.sumw.len(), nbins)?;
        check_len(self.sumw2.len(), nbins)
    }
}

impl<T: BinValue> AddScaled for Hist1D<T> {
    type Error = HistogramError;

    fn add_scaled(&mut self, other: &Self, weight: f64) -> Result<(), Self::Error> {
        if self.x != other.x {
            return Err(HistogramError::BinningMismatch);
        }
        add_bins(&mut self.sumw, &other.sumw, weight);
        add_bins(&mut self.sumw2, &other.sumw2, weight * weight);
        self.entries += other.entries;
        Ok(())
    }
}

impl<T: BinValue> Scale for Hist1D<T> {
    fn scale(&mut self, factor: f64) {
        scale_bins(&mut self.sumw, factor);
        scale_bins(&mut self.sumw2, factor * factor);
    }
}

/// Two-dimensional histogram with double-precision storage
///
/// Bin `(ix, iy)` is stored at index `ix + (nx + 2) * iy`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Hist2D {
    title: String,
    x: Axis,
    y: Axis,
    entries: f64,
    sumw: Vec<f64>,
    sumw2: Vec<f64>,
}

impl Hist2D {
    pub fn new(title: &str, x: Axis, y: Axis) -> Self {
        let nbins = (x.nbins() + 2) * (y.nbins() + 2);
        Self {
            title: title.to_owned(),
            x,
            y,
            entries: 0.,
            sumw: vec![0.; nbins],
            sumw2: vec![0.; nbins],
        }
    }

    pub fn fill(&mut self, x: f64, y: f64, weight: f64) {
        let bin = self.bin(self.x.find_bin(x), self.y.find_bin(y));
        self.sumw[bin] += weight;
        self.sumw2[bin] += weight * weight;
        self.entries += 1.;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    pub fn y_axis(&self) -> &Axis {
        &self.y
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn bin_content(&self, ix: usize, iy: usize) -> f64 {
        self.sumw[self.bin(ix, iy)]
    }

    /// Sum of weights in all bins except underflow and overflow
    pub fn integral(&self) -> f64 {
        let (nx, ny) = (self.x.nbins(), self.y.nbins());
        (1..=ny)
            .flat_map(|iy| (1..=nx).map(move |ix| (ix, iy)))
            .map(|(ix, iy)| self.bin_content(ix, iy))
            .sum()
    }

    fn bin(&self, ix: usize, iy: usize) -> usize {
        ix + (self.x.nbins() + 2) * iy
    }

    pub(crate) fn validate(&self) -> Result<(), HistogramError> {
        self.x.validate()?;
        self.y.validate()?;
        let nbins = self
            .x
            .storage_len()?
            .checked_mul(self.y.storage_len()?)
            .ok_or_else(|| {
                HistogramError::InvalidAxis(format!(
                    "Too many bins: {} x {}",
                    self.x.nbins(),
                    self.y.nbins()
                ))
            })?;
        check_len(self.sumw.len(), nbins)?;
        check_len(self.sumw2.len(), nbins)
    }
}

impl AddScaled for Hist2D {
    type Error = HistogramError;

    fn add_scaled(&mut self, other: &Self, weight: f64) -> Result<(), Self::Error> {
        if self.x != other.x || self.y != other.y {
            return Err(HistogramError::BinningMismatch);
        }
        add_bins(&mut self.sumw, &other.sumw, weight);
        add_bins(&mut self.sumw2, &other.sumw2, weight * weight);
        self.entries += other.entries;
        Ok(())
    }
}

impl Scale for Hist2D {
    fn scale(&mut self, factor: f64) {
        scale_bins(&mut self.sumw, factor);
        scale_bins(&mut self.sumw2, factor * factor);
    }
}

fn add_bins<T: BinValue>(acc: &mut [T], other: &[T], weight: f64) {
    debug_assert_eq!(acc.len(), other.len());
    if weight == 1. {
        for (a, o) in acc.iter_mut().zip(other) {
            *a += *o;
        }
    } else {
        for (a, o) in acc.iter_mut().zip(other) {
            *a += T::from_f64(weight * o.to_f64());
        }
    }
}

fn scale_bins<T: BinValue>(bins: &mut [T], factor: f64) {
    for b in bins {
        *b = T::from_f64(factor * b.to_f64());
    }
}

fn check_len(found: usize, expected: usize) -> Result<(), HistogramError> {
    if found == expected {
        Ok(())
    } else {
        Err(HistogramError::StorageSize { expected, found })
    }
}

/// The recognised histogram classes
#[derive(Copy, Clone, Debug, Display, EnumString, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum HistKind {
    /// 1D, single precision
    TH1F,
    /// 1D, double precision
    TH1D,
    /// 2D, double precision
    TH2D,
}

/// A histogram of one of the recognised kinds
#[derive(Clone, Debug, PartialEq)]
pub enum Histogram {
    TH1F(Hist1D<f32>),
    TH1D(Hist1D<f64>),
    TH2D(Hist2D),
}

impl Histogram {
    pub fn kind(&self) -> HistKind {
        match self {
            Self::TH1F(_) => HistKind::TH1F,
            Self::TH1D(_) => HistKind::TH1D,
            Self::TH2D(_) => HistKind::TH2D,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::TH1F(h) => h.title(),
            Self::TH1D(h) => h.title(),
            Self::TH2D(h) => h.title(),
        }
    }

    pub fn entries(&self) -> f64 {
        match self {
            Self::TH1F(h) => h.entries(),
            Self::TH1D(h) => h.entries(),
            Self::TH2D(h) => h.entries(),
        }
    }

    pub fn integral(&self) -> f64 {
        match self {
            Self::TH1F(h) => h.integral(),
            Self::TH1D(h) => h.integral(),
            Self::TH2D(h) => h.integral(),
        }
    }

    /// Decode a histogram of the given kind from its serialised form
    pub fn from_value(
        kind: HistKind,
        value: serde_yaml::Value,
    ) -> Result<Self, DecodeError> {
        let hist = match kind {
            HistKind::TH1F => Self::TH1F(decode(value)?),
            HistKind::TH1D => Self::TH1D(decode(value)?),
            HistKind::TH2D => Self::TH2D(decode(value)?),
        };
        hist.validate()?;
        Ok(hist)
    }

    /// Serialise the histogram contents
    pub fn to_value(&self) -> Result<serde_yaml::Value, serde_yaml::Error> {
        match self {
            Self::TH1F(h) => serde_yaml::to_value(h),
            Self::TH1D(h) => serde_yaml::to_value(h),
            Self::TH2D(h) => serde_yaml::to_value(h),
        }
    }

    fn validate(&self) -> Result<(), HistogramError> {
        match self {
            Self::TH1F(h) => h.validate(),
            Self::TH1D(h) => h.validate(),
            Self::TH2D(h) => h.validate(),
        }
    }
}

fn decode<T: DeserializeOwned>(value: serde_yaml::Value) -> Result<T, DecodeError> {
    Ok(serde_yaml::from_value(value)?)
}

impl From<Hist1D<f32>> for Histogram {
    fn from(h: Hist1D<f32>) -> Self {
        Self::TH1F(h)
    }
}

impl From<Hist1D<f64>> for Histogram {
    fn from(h: Hist1D<f64>) -> Self {
        Self::TH1D(h)
    }
}

impl From<Hist2D> for Histogram {
    fn from(h: Hist2D) -> Self {
        Self::TH2D(h)
    }
}

impl AddScaled for Histogram {
    type Error = HistogramError;

    fn add_scaled(&mut self, other: &Self, weight: f64) -> Result<(), Self::Error> {
        use Histogram::*;
        match (self, other) {
            (TH1F(h), TH1F(o)) => h.add_scaled(o, weight),
            (TH1D(h), TH1D(o)) => h.add_scaled(o, weight),
            (TH2D(h), TH2D(o)) => h.add_scaled(o, weight),
            (h, o) => Err(HistogramError::KindMismatch {
                expected: h.kind().to_string(),
                found: o.kind().to_string(),
            }),
        }
    }
}

impl Scale for Histogram {
    fn scale(&mut self, factor: f64) {
        match self {
            Self::TH1F(h) => h.scale(factor),
            Self::TH1D(h) => h.scale(factor),
            Self::TH2D(h) => h.scale(factor),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HistogramError {
    #[error("Invalid axis: {0}")]
    InvalidAxis(String),
    #[error("Expected {expected} bins, found {found}")]
    StorageSize { expected: usize, found: usize },
    #[error("Histograms have different binning")]
    BinningMismatch,
    #[error("Cannot add a {found} to a {expected}")]
    KindMismatch { expected: String, found: String },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed histogram: {0}")]
    Format(#[from] serde_yaml::Error),
    #[error("Inconsistent histogram: {0}")]
    Invalid(#[from] HistogramError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mass_axis() -> Axis {
        Axis::variable(vec![40., 45., 55., 65., 75., 85., 100., 115., 130., 150.])
            .unwrap()
    }

    #[test]
    fn uniform_bins() {
        let axis = Axis::uniform(1, 0., 1.).unwrap();
        assert_eq!(axis.nbins(), 1);
        assert_eq!(axis.find_bin(-0.1), 0);
        assert_eq!(axis.find_bin(0.), 1);
        assert_eq!(axis.find_bin(0.5), 1);
        assert_eq!(axis.find_bin(1.), 2);
        assert_eq!(axis.find_bin(f64::NAN), 2);

        let axis = Axis::uniform(4, -2., 2.).unwrap();
        assert_eq!(axis.find_bin(-1.5), 1);
        assert_eq!(axis.find_bin(1.999), 4);
        assert_eq!(axis.find_bin(0.), 3);
    }

    #[test]
    fn variable_bins() {
        let axis = mass_axis();
        assert_eq!(axis.nbins(), 9);
        assert_eq!(axis.find_bin(39.9), 0);
        assert_eq!(axis.find_bin(40.), 1);
        assert_eq!(axis.find_bin(54.9), 2);
        assert_eq!(axis.find_bin(55.), 3);
        assert_eq!(axis.find_bin(149.), 9);
        assert_eq!(axis.find_bin(150.), 10);
    }

    #[test]
    fn invalid_axes() {
        assert!(Axis::uniform(0, 0., 1.).is_err());
        assert!(Axis::uniform(3, 1., 1.).is_err());
        assert!(Axis::variable(vec![1.]).is_err());
        assert!(Axis::variable(vec![1., 3., 2.]).is_err());
        assert!(Axis::log_spaced(10, 0., 1.).is_err());
    }

    #[test]
    fn log_spaced() {
        let axis = Axis::log_spaced(100, 1e-6, 1.).unwrap();
        assert_eq!(axis.nbins(), 100);
        assert_eq!(axis.find_bin(1e-7), 0);
        assert_eq!(axis.find_bin(1.), 101);
        assert_eq!(axis.find_bin(2e-6), 6);
        assert_eq!(axis.find_bin(0.5), 95);
        assert_eq!(axis, Axis::log_spaced(100, 1e-6, 1.).unwrap());
    }

    #[test]
    fn fill_and_add() {
        let mut h1 = Hist1D::<f64>::new("mass", mass_axis());
        h1.fill(50., 2.);
        h1.fill(500., 1.);
        let mut h2 = Hist1D::<f64>::new("mass", mass_axis());
        h2.fill(52., 3.);

        h1.add(&h2).unwrap();
        assert_eq!(h1.bin_content(2), 5.);
        assert_eq!(h1.bin_error(2), 13f64.sqrt());
        assert_eq!(h1.bin_content(10), 1.);
        assert_eq!(h1.entries(), 3.);
        assert_eq!(h1.integral(), 5.);
    }

    #[test]
    fn add_scaled() {
        let mut h1 = Hist1D::<f32>::new("n", Axis::uniform(1, 0., 1.).unwrap());
        h1.fill(0.5, 1.);
        let mut h2 = h1.clone();
        h2.fill(0.5, 1.);

        h1.add_scaled(&h2, 0.5).unwrap();
        assert_eq!(h1.bin_content(1), 2.);
        assert_eq!(h1.bin_error(1), 1.5f64.sqrt());
        assert_eq!(h1.entries(), 3.);

        h1.scale(2.);
        assert_eq!(h1.bin_content(1), 4.);
        assert_eq!(h1.bin_error(1), 6f64.sqrt());
    }

    #[test]
    fn binning_mismatch() {
        let mut h1 = Hist1D::<f64>::new("mass", mass_axis());
        h1.fill(50., 1.);
        let before = h1.clone();
        let h2 = Hist1D::<f64>::new("mass", Axis::uniform(9, 40., 150.).unwrap());
        assert_eq!(h1.add(&h2), Err(HistogramError::BinningMismatch));
        assert_eq!(h1, before);
    }

    #[test]
    fn kind_mismatch() {
        let axis = Axis::uniform(1, 0., 1.).unwrap();
        let mut h1: Histogram = Hist1D::<f32>::new("n", axis.clone()).into();
        let h2: Histogram = Hist1D::<f64>::new("n", axis).into();
        assert_eq!(
            h1.add(&h2),
            Err(HistogramError::KindMismatch {
                expected: "TH1F".to_owned(),
                found: "TH1D".to_owned()
            })
        );
    }

    #[test]
    fn hist2d() {
        let axis = Axis::log_spaced(10, 1e-6, 1.).unwrap();
        let mut h = Hist2D::new("x1 x2", axis.clone(), axis);
        h.fill(1e-3, 0.5, 1.);
        h.fill(1e-3, 0.5, 1.);
        h.fill(2., 0.5, 1.);
        let ix = h.x_axis().find_bin(1e-3);
        let iy = h.y_axis().find_bin(0.5);
        assert_eq!(h.bin_content(ix, iy), 2.);
        assert_eq!(h.bin_content(11, iy), 1.);
        assert_eq!(h.integral(), 2.);
        assert_eq!(h.entries(), 3.);
    }

    #[test]
    fn value_round_trip() {
        let mut h = Hist1D::<f32>::new("n", mass_axis());
        h.fill(60., 0.1);
        let h: Histogram = h.into();
        let value = h.to_value().unwrap();
        let decoded = Histogram::from_value(HistKind::TH1F, value).unwrap();
        assert_eq!(decoded, h);
    }

    #[test]
    fn reject_inconsistent_storage() {
        let h: Histogram = Hist1D::<f64>::new("n", mass_axis()).into();
        let value = h.to_value().unwrap();
        assert!(matches!(
            Histogram::from_value(HistKind::TH2D, value),
            Err(DecodeError::Format(_))
        ));

        let mut value = h.to_value().unwrap();
        value["sumw"] = serde_yaml::Value::Sequence(Vec::new());
        assert!(matches!(
            Histogram::from_value(HistKind::TH1D, value),
            Err(DecodeError::Invalid(HistogramError::StorageSize { .. }))
        ));
    }

    #[test]
    fn reject_oversized_axes() {
        let value: serde_yaml::Value = serde_yaml::from_str(
            "
title: h
x: {binning: uniform, nbins: 18446744073709551615, min: 0, max: 1}
entries: 0
sumw: [0.0]
sumw2: [0.0]
",
        )
        .unwrap();
        assert!(matches!(
            Histogram::from_value(HistKind::TH1D, value),
            Err(DecodeError::Invalid(HistogramError::InvalidAxis(_)))
        ));

        let value: serde_yaml::Value = serde_yaml::from_str(
            "
title: h
x: {binning: uniform, nbins: 4294967295, min: 0, max: 1}
y: {binning: uniform, nbins: 4294967295, min: 0, max: 1}
entries: 0
sumw: [0.0]
sumw2: [0.0]
",
        )
        .unwrap();
        assert!(matches!(
            Histogram::from_value(HistKind::TH2D, value),
            Err(DecodeError::Invalid(HistogramError::InvalidAxis(_)))
        ));

        assert!(Axis::uniform(usize::MAX, 0., 1.).is_err());
    }
}
