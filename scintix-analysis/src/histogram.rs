//! Fixed-binning 1D histograms keyed by response channel.
//!
//! [`HistoManager`] is the reference [`HistogramSink`]: channels are booked
//! up front from a [`HistogramBooking`], fills on unbooked channels are
//! dropped.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use scintix_core::units::MEV;
use scintix_core::{Channel, HistogramSink};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A weighted one-dimensional histogram with under- and overflow.
///
/// Bins are half-open, `[low, high)`. Statistics (mean, rms) cover
/// in-range fills only.
#[derive(Debug, Clone, PartialEq)]
pub struct H1 {
    title: String,
    nbins: usize,
    min: f64,
    max: f64,
    bin_width: f64,
    bins: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: u64,
    sum_w: f64,
    sum_wx: f64,
    sum_wx2: f64,
}

impl H1 {
    /// Creates an empty histogram.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] for zero bins or an empty range.
    pub fn new(title: impl Into<String>, nbins: usize, min: f64, max: f64) -> Result<Self> {
        let title = title.into();
        if nbins == 0 {
            return Err(Error::InvalidBinning {
                title,
                reason: "at least one bin is required".to_string(),
            });
        }
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(Error::InvalidBinning {
                title,
                reason: format!("range [{min}, {max}) is empty or not finite"),
            });
        }

        Ok(Self {
            title,
            nbins,
            min,
            max,
            bin_width: (max - min) / nbins as f64,
            bins: vec![0.0; nbins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            sum_w: 0.0,
            sum_wx: 0.0,
            sum_wx2: 0.0,
        })
    }

    /// Adds `value` with `weight`. NaN values and non-finite weights are dropped.
    pub fn fill(&mut self, value: f64, weight: f64) {
        if value.is_nan() || !weight.is_finite() {
            return;
        }
        self.entries += 1;

        let Some(bin) = self.find_bin(value) else {
            if value < self.min {
                self.underflow += weight;
            } else {
                self.overflow += weight;
            }
            return;
        };

        self.bins[bin] += weight;
        self.sum_w += weight;
        self.sum_wx += weight * value;
        self.sum_wx2 += weight * value * value;
    }

    /// Returns the bin index of `value`, if in range.
    #[must_use]
    pub fn find_bin(&self, value: f64) -> Option<usize> {
        if value.is_nan() || value < self.min || value >= self.max {
            return None;
        }
        Some((((value - self.min) / self.bin_width) as usize).min(self.nbins - 1))
    }

    /// Adds the contents of a histogram with identical binning.
    ///
    /// # Errors
    /// Returns [`Error::BinningMismatch`] if the binning differs.
    pub fn merge(&mut self, other: &H1) -> Result<()> {
        if self.nbins != other.nbins || self.min != other.min || self.max != other.max {
            return Err(Error::BinningMismatch(self.title.clone()));
        }
        for (bin, content) in self.bins.iter_mut().zip(&other.bins) {
            *bin += content;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.entries += other.entries;
        self.sum_w += other.sum_w;
        self.sum_wx += other.sum_wx;
        self.sum_wx2 += other.sum_wx2;
        Ok(())
    }

    /// Histogram title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of in-range bins.
    #[must_use]
    #[inline]
    pub fn nbins(&self) -> usize {
        self.nbins
    }

    /// Lower edge of the first bin.
    #[must_use]
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper edge of the last bin.
    #[must_use]
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Width of every bin.
    #[must_use]
    #[inline]
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Contents of all in-range bins.
    #[must_use]
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Content of bin `bin`.
    #[must_use]
    pub fn bin_content(&self, bin: usize) -> Option<f64> {
        self.bins.get(bin).copied()
    }

    /// Center of bin `bin`.
    #[must_use]
    pub fn bin_center(&self, bin: usize) -> Option<f64> {
        (bin < self.nbins).then(|| self.min + (bin as f64 + 0.5) * self.bin_width)
    }

    /// Weight filled below the range.
    #[must_use]
    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    /// Weight filled at or above the range.
    #[must_use]
    pub fn overflow(&self) -> f64 {
        self.overflow
    }

    /// Number of fills, including under- and overflow.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Sum of in-range weights.
    #[must_use]
    pub fn sum_of_weights(&self) -> f64 {
        self.sum_w
    }

    /// Weighted mean of in-range fills.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        (self.sum_w > 0.0).then(|| self.sum_wx / self.sum_w)
    }

    /// Weighted standard deviation of in-range fills.
    #[must_use]
    pub fn rms(&self) -> Option<f64> {
        let mean = self.mean()?;
        Some((self.sum_wx2 / self.sum_w - mean * mean).max(0.0).sqrt())
    }
}

/// Binning of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinSpec {
    /// Channel being booked.
    pub channel: Channel,
    /// Number of bins.
    pub nbins: usize,
    /// Lower edge.
    pub min: f64,
    /// Upper edge.
    pub max: f64,
}

impl BinSpec {
    /// Creates a binning.
    #[must_use]
    pub fn new(channel: Channel, nbins: usize, min: f64, max: f64) -> Self {
        Self {
            channel,
            nbins,
            min,
            max,
        }
    }
}

/// Set of booked channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBooking {
    /// Binning per booked channel.
    pub histograms: Vec<BinSpec>,
}

impl Default for HistogramBooking {
    /// Books every channel: pulse heights in 0-1 MeV, photon counts up to
    /// 10000 (produced) and 1000 (detected), light yield up to 1e5 per MeV.
    fn default() -> Self {
        let mut histograms: Vec<BinSpec> = [
            Channel::TargetPulseHeight,
            Channel::DetectorPulseHeight,
            Channel::TotalPulseHeight,
            Channel::Coincidence,
            Channel::AntiCoincidence1,
            Channel::AntiCoincidence2,
        ]
        .into_iter()
        .map(|channel| BinSpec::new(channel, 100, 0.0, 1.0 * MEV))
        .collect();
        histograms.push(BinSpec::new(Channel::ScintPhotons, 100, 0.0, 10_000.0));
        histograms.push(BinSpec::new(Channel::PmtPhotons, 100, 0.0, 1_000.0));
        histograms.push(BinSpec::new(
            Channel::PhotonsPerEnergy,
            100,
            0.0,
            100_000.0 / MEV,
        ));
        Self { histograms }
    }
}

impl HistogramBooking {
    /// Books nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            histograms: Vec::new(),
        }
    }

    /// Adds or replaces the binning of a channel.
    #[must_use]
    pub fn with(mut self, spec: BinSpec) -> Self {
        self.histograms.retain(|s| s.channel != spec.channel);
        self.histograms.push(spec);
        self
    }

    /// Loads a booking from JSON.
    ///
    /// # Errors
    /// Returns an error for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a booking from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Histograms of all booked channels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoManager {
    histograms: BTreeMap<Channel, H1>,
}

impl HistoManager {
    /// Books the histograms described by `booking`.
    ///
    /// # Errors
    /// Returns an error for invalid binning or a channel booked twice.
    pub fn new(booking: &HistogramBooking) -> Result<Self> {
        let mut histograms = BTreeMap::new();
        for spec in &booking.histograms {
            let h1 = H1::new(spec.channel.title(), spec.nbins, spec.min, spec.max)?;
            if histograms.insert(spec.channel, h1).is_some() {
                return Err(Error::DuplicateChannel(spec.channel));
            }
        }
        Ok(Self { histograms })
    }

    /// Returns the histogram of `channel`, if booked.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&H1> {
        self.histograms.get(&channel)
    }

    /// Iterates booked histograms in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &H1)> {
        self.histograms.iter().map(|(c, h)| (*c, h))
    }

    /// Number of booked channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// Whether nothing is booked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Adds the contents of another manager, booking channels it lacks.
    ///
    /// # Errors
    /// Returns an error if a shared channel has different binning.
    pub fn merge(&mut self, other: &HistoManager) -> Result<()> {
        for (channel, h1) in &other.histograms {
            match self.histograms.get_mut(channel) {
                Some(mine) => mine.merge(h1)?,
                None => {
                    self.histograms.insert(*channel, h1.clone());
                }
            }
        }
        Ok(())
    }
}

impl HistogramSink for HistoManager {
    fn fill_h1(&mut self, channel: Channel, value: f64, weight: f64) {
        if let Some(h1) = self.histograms.get_mut(&channel) {
            h1.fill(value, weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_h1_fill_and_stats() {
        let mut h = H1::new("test", 10, 0.0, 10.0).unwrap();
        h.fill(0.5, 1.0);
        h.fill(2.5, 1.0);
        h.fill(2.7, 2.0);
        h.fill(-1.0, 1.0);
        h.fill(10.0, 3.0);

        assert_eq!(h.entries(), 5);
        assert_relative_eq!(h.bin_content(0).unwrap(), 1.0);
        assert_relative_eq!(h.bin_content(2).unwrap(), 3.0);
        assert_relative_eq!(h.underflow(), 1.0);
        assert_relative_eq!(h.overflow(), 3.0);
        assert_relative_eq!(h.sum_of_weights(), 4.0);
        // (0.5 + 2.5 + 2*2.7) / 4
        assert_relative_eq!(h.mean().unwrap(), 2.1, epsilon = 1e-12);
        assert!(h.rms().unwrap() > 0.0);
        assert_relative_eq!(h.bin_center(2).unwrap(), 2.5);
        assert_eq!(h.bin_center(10), None);
    }

    #[test]
    fn test_h1_zero_weight_fill_counts_entry() {
        let mut h = H1::new("w0", 4, 0.0, 4.0).unwrap();
        h.fill(1.5, 0.0);
        assert_eq!(h.entries(), 1);
        assert_relative_eq!(h.sum_of_weights(), 0.0);
        assert!(h.mean().is_none());
    }

    #[test]
    fn test_h1_drops_nan() {
        let mut h = H1::new("nan", 4, 0.0, 4.0).unwrap();
        h.fill(f64::NAN, 1.0);
        h.fill(1.0, f64::INFINITY);
        assert_eq!(h.entries(), 0);
    }

    #[test]
    fn test_h1_find_bin() {
        let h = H1::new("bins", 4, -2.0, 2.0).unwrap();
        assert_eq!(h.find_bin(-2.0), Some(0));
        assert_eq!(h.find_bin(0.0), Some(2));
        assert_eq!(h.find_bin(1.999), Some(3));
        assert_eq!(h.find_bin(2.0), None);
        assert_eq!(h.find_bin(-2.1), None);
    }

    #[test]
    fn test_h1_invalid_binning() {
        assert!(H1::new("a", 0, 0.0, 1.0).is_err());
        assert!(H1::new("b", 10, 1.0, 1.0).is_err());
        assert!(H1::new("c", 10, 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_h1_merge() {
        let mut a = H1::new("m", 4, 0.0, 4.0).unwrap();
        let mut b = a.clone();
        a.fill(0.5, 1.0);
        b.fill(0.5, 2.0);
        b.fill(5.0, 1.0);
        a.merge(&b).unwrap();

        assert_relative_eq!(a.bin_content(0).unwrap(), 3.0);
        assert_relative_eq!(a.overflow(), 1.0);
        assert_eq!(a.entries(), 3);

        let other = H1::new("m", 8, 0.0, 4.0).unwrap();
        assert!(matches!(a.merge(&other), Err(Error::BinningMismatch(_))));
    }

    #[test]
    fn test_default_booking_covers_all_channels() {
        let manager = HistoManager::new(&HistogramBooking::default()).unwrap();
        assert_eq!(manager.len(), Channel::ALL.len());
        for channel in Channel::ALL {
            assert!(manager.get(channel).is_some());
        }
    }

    #[test]
    fn test_unbooked_channel_is_dropped() {
        let booking =
            HistogramBooking::empty().with(BinSpec::new(Channel::PmtPhotons, 10, 0.0, 100.0));
        let mut manager = HistoManager::new(&booking).unwrap();
        manager.fill_h1(Channel::PmtPhotons, 12.0, 1.0);
        manager.fill_h1(Channel::Coincidence, 0.5, 1.0);

        assert_eq!(manager.len(), 1);
        assert_relative_eq!(
            manager.get(Channel::PmtPhotons).unwrap().bin_content(1).unwrap(),
            1.0
        );
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let booking = HistogramBooking {
            histograms: vec![
                BinSpec::new(Channel::ScintPhotons, 10, 0.0, 100.0),
                BinSpec::new(Channel::ScintPhotons, 20, 0.0, 100.0),
            ],
        };
        assert!(matches!(
            HistoManager::new(&booking),
            Err(Error::DuplicateChannel(Channel::ScintPhotons))
        ));
    }

    #[test]
    fn test_booking_from_json() {
        let json = r#"{
            "histograms": [
                { "channel": "total_pulse_height", "nbins": 50, "min": 0.0, "max": 2.0 },
                { "channel": "pmt_photons", "nbins": 20, "min": 0.0, "max": 200.0 }
            ]
        }"#;
        let booking = HistogramBooking::from_json(json).unwrap();
        let manager = HistoManager::new(&booking).unwrap();
        assert_eq!(manager.get(Channel::TotalPulseHeight).unwrap().nbins(), 50);
        assert!(manager.get(Channel::TargetPulseHeight).is_none());
    }

    #[test]
    fn test_booking_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "histograms": [{{ "channel": "scint_photons", "nbins": 5, "min": 0.0, "max": 5.0 }}] }}"#
        )
        .unwrap();
        let booking = HistogramBooking::from_file(file.path()).unwrap();
        assert_eq!(booking.histograms.len(), 1);
        assert_eq!(booking.histograms[0].channel, Channel::ScintPhotons);
    }

    #[test]
    fn test_manager_merge() {
        let booking = HistogramBooking::default();
        let mut a = HistoManager::new(&booking).unwrap();
        let mut b = HistoManager::new(&booking).unwrap();
        a.fill_h1(Channel::PmtPhotons, 10.0, 1.0);
        b.fill_h1(Channel::PmtPhotons, 10.0, 1.0);
        b.fill_h1(Channel::ScintPhotons, 100.0, 1.0);
        a.merge(&b).unwrap();

        assert_eq!(a.get(Channel::PmtPhotons).unwrap().entries(), 2);
        assert_eq!(a.get(Channel::ScintPhotons).unwrap().entries(), 1);
    }
}
