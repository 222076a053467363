use serde::{Deserialize, Serialize};

use crate::analysis::band_power::BandPowerMethod;
use crate::analysis::error::AnalysisError;
use crate::analysis::filter::BandpassConfig;
use crate::analysis::recording::{Channel, SignalVariant};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sample_rate_hz: usize,
    /// `None` skips the filtered variant entirely.
    pub bandpass: Option<BandpassConfig>,
    pub band_power: BandPowerMethod,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        // The A3/A4 headset exports at 100 Hz.
        Self {
            sample_rate_hz: 100,
            bandpass: Some(BandpassConfig::default()),
            band_power: BandPowerMethod::MeanRatio,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        if config.sample_rate_hz == 0 {
            return Err(AnalysisError::InvalidSampleRate);
        }
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Time,
    Psd,
}

/// What the caller wants to look at. Passed by value into every render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSelection {
    pub channel: Channel,
    pub view: ViewMode,
    /// Plot A3 and A4 together; band power still follows `channel`.
    pub compare: bool,
    pub variant: SignalVariant,
}

impl Default for ViewSelection {
    fn default() -> Self {
        Self {
            channel: Channel::A3,
            view: ViewMode::Time,
            compare: false,
            variant: SignalVariant::Original,
        }
    }
}

impl ViewSelection {
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Channels plotted for this selection.
    pub fn channels(&self) -> Vec<Channel> {
        if self.compare {
            Channel::ALL.to_vec()
        } else {
            vec![self.channel]
        }
    }
}
