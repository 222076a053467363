// src/analysis/mod.rs
pub mod band_power;
pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod psd;
pub mod recording;
pub mod source;
pub use band_power::{
    estimate_band_power, Band, BandPowerEstimator, BandPowerMethod, BandPowers,
    MeanRatioBandPower, SpectralBandPower,
};
pub use config::{AnalysisConfig, ViewMode, ViewSelection};
pub use error::AnalysisError;
pub use filter::{BandpassConfig, BandpassFilter};
pub use pipeline::{AnalysisPipeline, AnalysisView, ChartData, PsdDataset, TimeDataset};
pub use psd::{estimate_psd, PsdEstimator, PsdResult};
pub use recording::{Channel, LoadedSignals, Recording, SignalVariant};
pub use source::{ManualSource, RecordingSource, SimulatedSource, ToneSpec};
