use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::error::AnalysisError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandpassConfig {
    pub low_hz: f64,
    pub high_hz: f64,
    pub order: usize,
}

impl Default for BandpassConfig {
    fn default() -> Self {
        // Matches the upload backend: 1-30 Hz, 5th order.
        Self {
            low_hz: 1.0,
            high_hz: 30.0,
            order: 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SectionCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl SectionCoeffs {
    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct SectionState {
    z1: f64,
    z2: f64,
}

/// Butterworth highpass at `low_hz` cascaded with a Butterworth lowpass at
/// `high_hz`, both of the configured order, stored as second-order sections.
#[derive(Clone, Debug)]
pub struct BandpassFilter {
    config: BandpassConfig,
    sections: Vec<SectionCoeffs>,
}

impl BandpassFilter {
    pub fn design(config: &BandpassConfig, sample_rate_hz: usize) -> Result<Self, AnalysisError> {
        if sample_rate_hz == 0 {
            return Err(AnalysisError::InvalidSampleRate);
        }
        let nyquist = sample_rate_hz as f64 * 0.5;
        if config.order == 0 {
            return Err(AnalysisError::InvalidBandpass("order must be at least 1".into()));
        }
        if !(config.low_hz > 0.0 && config.low_hz < config.high_hz && config.high_hz < nyquist) {
            return Err(AnalysisError::InvalidBandpass(format!(
                "edges must satisfy 0 < low < high < {nyquist} Hz, got {}..{}",
                config.low_hz, config.high_hz
            )));
        }

        let fs = sample_rate_hz as f64;
        let mut sections = butterworth_sections(config.order, config.low_hz, fs, Kind::Highpass);
        sections.extend(butterworth_sections(config.order, config.high_hz, fs, Kind::Lowpass));
        debug!(
            "bandpass {}-{} Hz order {} at {} Hz: {} sections",
            config.low_hz,
            config.high_hz,
            config.order,
            sample_rate_hz,
            sections.len()
        );
        Ok(Self {
            config: *config,
            sections,
        })
    }

    pub fn config(&self) -> &BandpassConfig {
        &self.config
    }

    /// Samples of odd extension added on each side before filtering.
    pub fn pad_len(&self) -> usize {
        3 * (2 * self.config.order + 1)
    }

    /// Zero-phase filtering: forward pass, then a backward pass over the
    /// reversed output. Both ends are padded with an odd reflection and
    /// every section starts from its steady state for the first sample.
    pub fn filtfilt(&self, signal: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        let pad = self.pad_len();
        if signal.len() <= pad {
            return Err(AnalysisError::SignalTooShort {
                required: pad,
                actual: signal.len(),
            });
        }

        let first = signal[0];
        let last = signal[signal.len() - 1];
        let mut extended = Vec::with_capacity(signal.len() + 2 * pad);
        extended.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
        extended.extend_from_slice(signal);
        extended.extend((1..=pad).map(|i| 2.0 * last - signal[signal.len() - 1 - i]));

        let forward = self.run(&extended);
        let mut backward: Vec<f64> = forward.into_iter().rev().collect();
        backward = self.run(&backward);
        backward.reverse();

        Ok(backward[pad..pad + signal.len()].to_vec())
    }

    /// Single causal pass through every section.
    fn run(&self, input: &[f64]) -> Vec<f64> {
        let Some(&x0) = input.first() else {
            return Vec::new();
        };
        let mut output = input.to_vec();
        let mut level = x0;
        for coeffs in &self.sections {
            let gain = coeffs.dc_gain();
            let mut state = SectionState {
                z1: (gain - coeffs.b0) * level,
                z2: (coeffs.b2 - coeffs.a2 * gain) * level,
            };
            for value in output.iter_mut() {
                // Transposed direct form II
                let x = *value;
                let y = coeffs.b0 * x + state.z1;
                state.z1 = coeffs.b1 * x - coeffs.a1 * y + state.z2;
                state.z2 = coeffs.b2 * x - coeffs.a2 * y;
                *value = y;
            }
            level *= gain;
        }
        output
    }
}

#[derive(Clone, Copy, Debug)]
enum Kind {
    Highpass,
    Lowpass,
}

/// Conjugate pole pairs become biquads with Q = -1 / (2 cos θ); odd orders
/// add one first-order section for the real pole.
fn butterworth_sections(order: usize, cutoff_hz: f64, fs: f64, kind: Kind) -> Vec<SectionCoeffs> {
    let mut sections = Vec::with_capacity(order / 2 + 1);
    for k in 1..=order / 2 {
        let theta = PI * (2 * k + order - 1) as f64 / (2 * order) as f64;
        let q = -1.0 / (2.0 * theta.cos());
        sections.push(match kind {
            Kind::Highpass => highpass(cutoff_hz, fs, q),
            Kind::Lowpass => lowpass(cutoff_hz, fs, q),
        });
    }
    if order % 2 == 1 {
        sections.push(first_order(cutoff_hz, fs, kind));
    }
    sections
}

fn lowpass(freq_hz: f64, sample_rate_hz: f64, q: f64) -> SectionCoeffs {
    let w0 = 2.0 * PI * freq_hz / sample_rate_hz;
    let alpha = w0.sin() / (2.0 * q);
    let cos_w0 = w0.cos();
    let b0 = (1.0 - cos_w0) * 0.5;
    let b1 = 1.0 - cos_w0;
    let b2 = b0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_w0;
    let a2 = 1.0 - alpha;
    normalize(b0, b1, b2, a0, a1, a2)
}

fn highpass(freq_hz: f64, sample_rate_hz: f64, q: f64) -> SectionCoeffs {
    let w0 = 2.0 * PI * freq_hz / sample_rate_hz;
    let alpha = w0.sin() / (2.0 * q);
    let cos_w0 = w0.cos();
    let b0 = (1.0 + cos_w0) * 0.5;
    let b1 = -(1.0 + cos_w0);
    let b2 = b0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_w0;
    let a2 = 1.0 - alpha;
    normalize(b0, b1, b2, a0, a1, a2)
}

fn first_order(freq_hz: f64, sample_rate_hz: f64, kind: Kind) -> SectionCoeffs {
    let k = (PI * freq_hz / sample_rate_hz).tan();
    let a1 = (k - 1.0) / (k + 1.0);
    let (b0, b1) = match kind {
        Kind::Lowpass => (k / (1.0 + k), k / (1.0 + k)),
        Kind::Highpass => (1.0 / (1.0 + k), -1.0 / (1.0 + k)),
    };
    SectionCoeffs {
        b0,
        b1,
        b2: 0.0,
        a1,
        a2: 0.0,
    }
}

fn normalize(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> SectionCoeffs {
    let a0_inv = 1.0 / a0;
    SectionCoeffs {
        b0: b0 * a0_inv,
        b1: b1 * a0_inv,
        b2: b2 * a0_inv,
        a1: a1 * a0_inv,
        a2: a2 * a0_inv,
    }
}
