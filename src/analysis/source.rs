use std::collections::VecDeque;
use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::analysis::error::AnalysisError;
use crate::analysis::recording::Recording;

/// Anything that can hand over complete recordings on demand.
pub trait RecordingSource {
    fn next_recording(&mut self) -> Result<Option<Recording>, AnalysisError>;
}

/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<Recording>,
}

impl ManualSource {
    pub fn new(recordings: impl IntoIterator<Item = Recording>) -> Self {
        Self {
            queue: recordings.into_iter().collect(),
        }
    }
}

impl RecordingSource for ManualSource {
    fn next_recording(&mut self) -> Result<Option<Recording>, AnalysisError> {
        Ok(self.queue.pop_front())
    }
}

/// Sine plus uniform noise for one channel.
#[derive(Clone, Copy, Debug)]
pub struct ToneSpec {
    pub freq_hz: f64,
    pub amp_uv: f64,
    pub offset_uv: f64,
    pub noise_uv: f64,
}

impl ToneSpec {
    fn sample(&self, t: f64, rng: &mut StdRng) -> f64 {
        let base = (2.0 * PI * self.freq_hz * t).sin() * self.amp_uv + self.offset_uv;
        let noise = if self.noise_uv > 0.0 {
            rng.gen_range(-self.noise_uv..self.noise_uv)
        } else {
            0.0
        };
        base + noise
    }
}

/// Synthetic two-channel recording; yields a single recording then runs dry.
pub struct SimulatedSource {
    sample_rate_hz: usize,
    seconds: f64,
    a3: ToneSpec,
    a4: ToneSpec,
    rng: StdRng,
    done: bool,
}

impl SimulatedSource {
    pub fn new(sample_rate_hz: usize, seconds: f64, seed: u64) -> Self {
        Self {
            sample_rate_hz,
            seconds,
            // Alpha-ish on A3, theta-ish on A4.
            a3: ToneSpec {
                freq_hz: 10.0,
                amp_uv: 40.0,
                offset_uv: 5.0,
                noise_uv: 8.0,
            },
            a4: ToneSpec {
                freq_hz: 6.0,
                amp_uv: 25.0,
                offset_uv: -3.0,
                noise_uv: 8.0,
            },
            rng: StdRng::seed_from_u64(seed),
            done: false,
        }
    }

    pub fn with_tones(mut self, a3: ToneSpec, a4: ToneSpec) -> Self {
        self.a3 = a3;
        self.a4 = a4;
        self
    }

    fn generate(&mut self) -> Recording {
        let len = (self.seconds * self.sample_rate_hz as f64).round() as usize;
        let mut timestamps = Vec::with_capacity(len);
        let mut a3 = Vec::with_capacity(len);
        let mut a4 = Vec::with_capacity(len);
        for i in 0..len {
            let t = i as f64 / self.sample_rate_hz as f64;
            timestamps.push(utc_timestamp(t));
            a3.push(self.a3.sample(t, &mut self.rng));
            a4.push(self.a4.sample(t, &mut self.rng));
        }
        Recording {
            sample_rate_hz: self.sample_rate_hz,
            timestamps,
            a3,
            a4,
        }
    }
}

impl RecordingSource for SimulatedSource {
    fn next_recording(&mut self) -> Result<Option<Recording>, AnalysisError> {
        if self.done {
            return Ok(None);
        }
        if self.sample_rate_hz == 0 {
            return Err(AnalysisError::InvalidSampleRate);
        }
        self.done = true;
        Ok(Some(self.generate()))
    }
}

/// Seconds since midnight rendered like the CSV exports: `2024-01-01 HH:MM:SS.mmm`.
fn utc_timestamp(seconds: f64) -> String {
    let millis = (seconds * 1000.0).round() as u64;
    let (h, rem) = (millis / 3_600_000, millis % 3_600_000);
    let (m, rem) = (rem / 60_000, rem % 60_000);
    let (s, ms) = (rem / 1000, rem % 1000);
    format!("2024-01-01 {:02}:{:02}:{:02}.{:03}", h % 24, m, s, ms)
}
