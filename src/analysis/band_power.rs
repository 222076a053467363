use std::f64::consts::PI;

use log::{debug, warn};
use rustfft::{num_complex::Complex64, FftPlanner};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Canonical EEG bands, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    pub fn name(self) -> &'static str {
        match self {
            Band::Delta => "Delta",
            Band::Theta => "Theta",
            Band::Alpha => "Alpha",
            Band::Beta => "Beta",
            Band::Gamma => "Gamma",
        }
    }

    /// Share of the channel mean attributed to this band by [`MeanRatioBandPower`].
    /// The five ratios sum to exactly 1.0.
    pub fn mean_ratio(self) -> f64 {
        match self {
            Band::Delta => 0.25,
            Band::Theta => 0.2,
            Band::Alpha => 0.3,
            Band::Beta => 0.15,
            Band::Gamma => 0.1,
        }
    }

    /// `[low, high)` edges in Hz used by [`SpectralBandPower`].
    pub fn hz_range(self) -> (f64, f64) {
        match self {
            Band::Delta => (0.5, 4.0),
            Band::Theta => (4.0, 8.0),
            Band::Alpha => (8.0, 13.0),
            Band::Beta => (13.0, 30.0),
            Band::Gamma => (30.0, 45.0),
        }
    }

    fn index(self) -> usize {
        match self {
            Band::Delta => 0,
            Band::Theta => 1,
            Band::Alpha => 2,
            Band::Beta => 3,
            Band::Gamma => 4,
        }
    }
}

/// Band name -> value mapping with a fixed Delta..Gamma order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandPowers {
    values: [f64; 5],
}

impl BandPowers {
    pub fn from_fn(mut f: impl FnMut(Band) -> f64) -> Self {
        let mut values = [0.0; 5];
        for band in Band::ALL {
            values[band.index()] = f(band);
        }
        Self { values }
    }

    pub fn get(&self, band: Band) -> f64 {
        self.values[band.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Band, f64)> + '_ {
        Band::ALL.into_iter().map(move |band| (band, self.get(band)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

impl Serialize for BandPowers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (band, value) in self.iter() {
            map.serialize_entry(band.name(), &value)?;
        }
        map.end()
    }
}

/// Strategy seam so the band breakdown can change without touching callers.
pub trait BandPowerEstimator {
    fn estimate(&self, signal: &[f64]) -> BandPowers;
}

/// Fixed-ratio split of the channel mean.
///
/// This is not a spectral measure: NaN samples are dropped, the remaining
/// samples are averaged, and each band gets `mean * Band::mean_ratio()`.
/// With no usable samples the mean is NaN and so is every band.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanRatioBandPower;

impl BandPowerEstimator for MeanRatioBandPower {
    fn estimate(&self, signal: &[f64]) -> BandPowers {
        let (sum, count) = signal
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0f64, 0usize), |(sum, count), &v| (sum + v, count + 1));
        if count == 0 {
            warn!("band power: no finite samples in {} values", signal.len());
        }
        let avg = sum / count as f64;
        BandPowers::from_fn(|band| avg * band.mean_ratio())
    }
}

/// Welch PSD integrated over [`Band::hz_range`].
///
/// Segments of `segment_len` samples, periodic Hann taper, 50% overlap,
/// mean removed per segment, one-sided density scaling (units²/Hz).
/// NaN samples are dropped first; if fewer than one segment remains
/// every band is NaN.
#[derive(Clone, Copy, Debug)]
pub struct SpectralBandPower {
    sample_rate: usize,
    segment_len: usize,
}

impl SpectralBandPower {
    /// One-second segments.
    pub fn new(sample_rate: usize) -> Self {
        Self {
            sample_rate,
            segment_len: sample_rate,
        }
    }

    pub fn with_segment_len(sample_rate: usize, segment_len: usize) -> Self {
        Self {
            sample_rate,
            segment_len,
        }
    }

    /// Averaged one-sided density, `segment_len / 2 + 1` bins spaced
    /// `sample_rate / segment_len` Hz apart.
    pub fn density(&self, signal: &[f64]) -> Option<Vec<f64>> {
        let seg = self.segment_len;
        if seg < 2 || self.sample_rate == 0 || signal.len() < seg {
            return None;
        }
        let window: Vec<f64> = (0..seg)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / seg as f64).cos())
            .collect();
        let window_power: f64 = window.iter().map(|w| w * w).sum();
        let scale = 1.0 / (self.sample_rate as f64 * window_power);

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(seg);
        let step = seg - seg / 2;
        let bins = seg / 2 + 1;
        let mut density = vec![0.0f64; bins];
        let mut segments = 0usize;
        let mut buffer = vec![Complex64::new(0.0, 0.0); seg];

        let mut start = 0;
        while start + seg <= signal.len() {
            let segment = &signal[start..start + seg];
            let mean = segment.iter().sum::<f64>() / seg as f64;
            for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&window) {
                *slot = Complex64::new((x - mean) * w, 0.0);
            }
            fft.process(&mut buffer);
            for (k, acc) in density.iter_mut().enumerate() {
                let one_sided = k != 0 && !(seg % 2 == 0 && k == seg / 2);
                let factor = if one_sided { 2.0 } else { 1.0 };
                *acc += buffer[k].norm_sqr() * scale * factor;
            }
            segments += 1;
            start += step;
        }

        debug!("spectral band power: {segments} segments of {seg}");
        for acc in density.iter_mut() {
            *acc /= segments as f64;
        }
        Some(density)
    }
}

impl BandPowerEstimator for SpectralBandPower {
    fn estimate(&self, signal: &[f64]) -> BandPowers {
        let cleaned: Vec<f64> = signal.iter().copied().filter(|v| !v.is_nan()).collect();
        let Some(density) = self.density(&cleaned) else {
            warn!(
                "spectral band power: {} usable samples, need {}",
                cleaned.len(),
                self.segment_len
            );
            return BandPowers::from_fn(|_| f64::NAN);
        };
        let df = self.sample_rate as f64 / self.segment_len as f64;
        BandPowers::from_fn(|band| {
            let (low, high) = band.hz_range();
            density
                .iter()
                .enumerate()
                .filter(|(k, _)| {
                    let f = *k as f64 * df;
                    f >= low && f < high
                })
                .map(|(_, p)| p * df)
                .sum()
        })
    }
}

/// Which [`BandPowerEstimator`] the pipeline uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPowerMethod {
    #[default]
    MeanRatio,
    Spectral,
}

impl BandPowerMethod {
    pub fn estimator(self, sample_rate: usize) -> Box<dyn BandPowerEstimator + Send + Sync> {
        match self {
            BandPowerMethod::MeanRatio => Box::new(MeanRatioBandPower),
            BandPowerMethod::Spectral => Box::new(SpectralBandPower::new(sample_rate)),
        }
    }
}

/// Heuristic breakdown for a channel; `None` when the channel is not loaded.
pub fn estimate_band_power(signal: Option<&[f64]>) -> Option<BandPowers> {
    signal.map(|s| MeanRatioBandPower.estimate(s))
}
