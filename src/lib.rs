//! Spectral and band-power analysis for two-channel (A3/A4) EEG recordings.
//!
//! The numeric core is [`estimate_psd`] and [`estimate_band_power`]; both are
//! pure and never fail. [`AnalysisPipeline`] wraps them with loading,
//! bandpass filtering and per-selection rendering.
pub mod analysis;
pub use analysis::*;
