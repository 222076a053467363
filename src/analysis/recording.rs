use serde::{Deserialize, Serialize};

use crate::analysis::error::AnalysisError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    A3,
    A4,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::A3, Channel::A4];

    pub fn label(self) -> &'static str {
        match self {
            Channel::A3 => "A3",
            Channel::A4 => "A4",
        }
    }
}

/// Raw samples as recorded, or the bandpassed copy derived from them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalVariant {
    #[default]
    Original,
    Filtered,
}

/// Two aligned EEG channels in microvolts plus one timestamp per row.
/// Unparseable readings are stored as NaN.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub sample_rate_hz: usize,
    pub timestamps: Vec<String>,
    pub a3: Vec<f64>,
    pub a4: Vec<f64>,
}

impl Recording {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.sample_rate_hz == 0 {
            return Err(AnalysisError::InvalidSampleRate);
        }
        let expected = self.timestamps.len();
        for channel in Channel::ALL {
            let actual = self.channel(channel).len();
            if actual != expected {
                return Err(AnalysisError::LengthMismatch {
                    what: channel.label(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::A3 => &self.a3,
            Channel::A4 => &self.a4,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate_hz as f64
    }

    /// Clock part of a `YYYY-MM-DD HH:MM:SS...` timestamp, used as an x-axis label.
    pub fn time_label(&self, index: usize) -> Option<&str> {
        self.timestamps
            .get(index)
            .map(|ts| ts.get(11..19).unwrap_or(ts.as_str()))
    }

    /// Same timestamps, channels replaced.
    pub fn with_channels(&self, a3: Vec<f64>, a4: Vec<f64>) -> Recording {
        Recording {
            sample_rate_hz: self.sample_rate_hz,
            timestamps: self.timestamps.clone(),
            a3,
            a4,
        }
    }
}

/// Everything derived from one loaded recording.
#[derive(Clone, Debug)]
pub struct LoadedSignals {
    pub original: Recording,
    pub filtered: Option<Recording>,
}

impl LoadedSignals {
    pub fn variant(&self, variant: SignalVariant) -> Option<&Recording> {
        match variant {
            SignalVariant::Original => Some(&self.original),
            SignalVariant::Filtered => self.filtered.as_ref(),
        }
    }
}
