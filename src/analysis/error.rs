use thiserror::Error;

use crate::analysis::recording::{Channel, SignalVariant};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("sample rate mismatch: expected {expected}, got {actual}")]
    SampleRateMismatch { expected: usize, actual: usize },
    #[error("length mismatch for {what}: expected {expected} samples, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid bandpass: {0}")]
    InvalidBandpass(String),
    #[error("signal too short for zero-phase filtering: need more than {required} samples, got {actual}")]
    SignalTooShort { required: usize, actual: usize },
    #[error("{variant:?} signal for channel {channel:?} is not available")]
    VariantUnavailable {
        variant: SignalVariant,
        channel: Channel,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
