use log::{info, warn};
use serde::Serialize;

use crate::analysis::band_power::{BandPowerEstimator, BandPowers};
use crate::analysis::config::{AnalysisConfig, ViewMode, ViewSelection};
use crate::analysis::error::AnalysisError;
use crate::analysis::filter::BandpassFilter;
use crate::analysis::psd::{PsdEstimator, PsdResult};
use crate::analysis::recording::{Channel, LoadedSignals, Recording, SignalVariant};
use crate::analysis::source::RecordingSource;

#[derive(Clone, Debug, Serialize)]
pub struct TimeDataset {
    pub label: String,
    pub channel: Channel,
    pub samples: Vec<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PsdDataset {
    pub label: String,
    pub channel: Channel,
    pub psd: PsdResult,
}

/// Ready-to-plot series for one view mode.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ChartData {
    Time {
        labels: Vec<String>,
        datasets: Vec<TimeDataset>,
    },
    Psd {
        labels: Vec<usize>,
        datasets: Vec<PsdDataset>,
    },
}

/// Output of one render. Both parts are `None` until a recording is loaded.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisView {
    pub selection: ViewSelection,
    pub chart: Option<ChartData>,
    pub band_power: Option<BandPowers>,
}

/// Pulls recordings from a source and answers view selections against the latest one.
pub struct AnalysisPipeline<S: RecordingSource> {
    source: S,
    config: AnalysisConfig,
    filter: Option<BandpassFilter>,
    band_power: Box<dyn BandPowerEstimator + Send + Sync>,
    signals: Option<LoadedSignals>,
}

impl<S: RecordingSource> AnalysisPipeline<S> {
    pub fn new(source: S, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        if config.sample_rate_hz == 0 {
            return Err(AnalysisError::InvalidSampleRate);
        }
        let filter = config
            .bandpass
            .as_ref()
            .map(|bp| BandpassFilter::design(bp, config.sample_rate_hz))
            .transpose()?;
        let band_power = config.band_power.estimator(config.sample_rate_hz);
        Ok(Self {
            source,
            config,
            filter,
            band_power,
            signals: None,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn signals(&self) -> Option<&LoadedSignals> {
        self.signals.as_ref()
    }

    /// Loads the next recording, if any. Returns whether one was loaded.
    pub fn pump_once(&mut self) -> Result<bool, AnalysisError> {
        let Some(recording) = self.source.next_recording()? else {
            return Ok(false);
        };
        self.load(recording)?;
        Ok(true)
    }

    pub fn load(&mut self, recording: Recording) -> Result<&LoadedSignals, AnalysisError> {
        recording.validate()?;
        if recording.sample_rate_hz != self.config.sample_rate_hz {
            return Err(AnalysisError::SampleRateMismatch {
                expected: self.config.sample_rate_hz,
                actual: recording.sample_rate_hz,
            });
        }
        let filtered = match &self.filter {
            Some(filter) => match Self::bandpass(filter, &recording) {
                Ok(filtered) => Some(filtered),
                Err(err) => {
                    warn!("filtered signal unavailable: {err}");
                    None
                }
            },
            None => None,
        };
        info!(
            "loaded recording: {} samples ({:.1} s) at {} Hz, filtered: {}",
            recording.len(),
            recording.duration_seconds(),
            recording.sample_rate_hz,
            filtered.is_some()
        );
        Ok(&*self.signals.insert(LoadedSignals {
            original: recording,
            filtered,
        }))
    }

    pub fn render(&self, selection: ViewSelection) -> Result<AnalysisView, AnalysisError> {
        let Some(signals) = &self.signals else {
            return Ok(AnalysisView {
                selection,
                chart: None,
                band_power: None,
            });
        };
        let recording =
            signals
                .variant(selection.variant)
                .ok_or(AnalysisError::VariantUnavailable {
                    variant: selection.variant,
                    channel: selection.channel,
                })?;

        let channels = selection.channels();
        let chart = match selection.view {
            ViewMode::Time => ChartData::Time {
                labels: (0..recording.len())
                    .filter_map(|i| recording.time_label(i).map(str::to_owned))
                    .collect(),
                datasets: channels
                    .iter()
                    .map(|&channel| TimeDataset {
                        label: format!("EEG {}", channel.label()),
                        channel,
                        samples: recording.channel(channel).to_vec(),
                    })
                    .collect(),
            },
            ViewMode::Psd => {
                let estimator = PsdEstimator::new(self.config.sample_rate_hz);
                ChartData::Psd {
                    labels: (0..self.config.sample_rate_hz).collect(),
                    datasets: channels
                        .iter()
                        .map(|&channel| PsdDataset {
                            label: format!("EEG {} (PSD)", channel.label()),
                            channel,
                            psd: estimator.estimate(recording.channel(channel)),
                        })
                        .collect(),
                }
            }
        };

        Ok(AnalysisView {
            selection,
            chart: Some(chart),
            band_power: Some(self.band_power.estimate(recording.channel(selection.channel))),
        })
    }

    /// Band breakdown for one channel; `None` when nothing (or no such variant) is loaded.
    pub fn band_power(&self, channel: Channel, variant: SignalVariant) -> Option<BandPowers> {
        let recording = self.signals.as_ref()?.variant(variant)?;
        Some(self.band_power.estimate(recording.channel(channel)))
    }

    fn bandpass(filter: &BandpassFilter, recording: &Recording) -> Result<Recording, AnalysisError> {
        let a3 = filter.filtfilt(&recording.a3)?;
        let a4 = filter.filtfilt(&recording.a4)?;
        Ok(recording.with_channels(a3, a4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::band_power::{Band, BandPowerMethod};
    use crate::analysis::source::{ManualSource, SimulatedSource};

    fn ramp_recording(len: usize) -> Recording {
        Recording {
            sample_rate_hz: 100,
            timestamps: (0..len)
                .map(|i| format!("2024-03-01 10:{:02}:{:02}.000", i / 6000, (i / 100) % 60))
                .collect(),
            a3: (1..=len).map(|v| v as f64).collect(),
            a4: vec![10.0; len],
        }
    }

    #[test]
    fn nothing_loaded_renders_empty() {
        let pipeline =
            AnalysisPipeline::new(ManualSource::new(vec![]), AnalysisConfig::default()).unwrap();
        let view = pipeline.render(ViewSelection::default()).unwrap();
        assert!(view.chart.is_none());
        assert!(view.band_power.is_none());
        assert!(pipeline.band_power(Channel::A3, SignalVariant::Original).is_none());
    }

    #[test]
    fn pump_loads_and_filters() {
        let source = ManualSource::new(vec![ramp_recording(300)]);
        let mut pipeline = AnalysisPipeline::new(source, AnalysisConfig::default()).unwrap();
        assert!(pipeline.pump_once().unwrap());
        assert!(!pipeline.pump_once().unwrap());

        let signals = pipeline.signals().unwrap();
        let filtered = signals.filtered.as_ref().unwrap();
        assert_eq!(filtered.len(), 300);
        assert_eq!(filtered.timestamps, signals.original.timestamps);
        // DC channel is removed by the highpass edge.
        assert!(filtered.a4[100..200].iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn psd_view_single_and_compare() {
        let source = ManualSource::new(vec![ramp_recording(300)]);
        let mut pipeline = AnalysisPipeline::new(source, AnalysisConfig::default()).unwrap();
        pipeline.pump_once().unwrap();

        let single = ViewSelection {
            view: ViewMode::Psd,
            ..ViewSelection::default()
        };
        let view = pipeline.render(single).unwrap();
        match view.chart.unwrap() {
            ChartData::Psd { labels, datasets } => {
                assert_eq!(labels, (0..100).collect::<Vec<_>>());
                assert_eq!(datasets.len(), 1);
                assert_eq!(datasets[0].label, "EEG A3 (PSD)");
                assert_eq!(datasets[0].psd.segments, 4);
            }
            other => panic!("expected psd chart, got {other:?}"),
        }

        let compare = ViewSelection {
            view: ViewMode::Psd,
            compare: true,
            channel: Channel::A4,
            ..ViewSelection::default()
        };
        let view = pipeline.render(compare).unwrap();
        match view.chart.unwrap() {
            ChartData::Psd { datasets, .. } => {
                let labels: Vec<_> = datasets.iter().map(|d| d.label.as_str()).collect();
                assert_eq!(labels, ["EEG A3 (PSD)", "EEG A4 (PSD)"]);
                // A4 is constant.
                assert!(datasets[1].psd.power.iter().all(|&p| p == f64::NEG_INFINITY));
            }
            other => panic!("expected psd chart, got {other:?}"),
        }
        // Band power follows the selected channel, not the compare set.
        let bands = view.band_power.unwrap();
        assert_eq!(bands.get(Band::Delta), 2.5);
        assert_eq!(bands.get(Band::Gamma), 1.0);
    }

    #[test]
    fn time_view_uses_clock_labels() {
        let source = ManualSource::new(vec![ramp_recording(300)]);
        let mut pipeline = AnalysisPipeline::new(source, AnalysisConfig::default()).unwrap();
        pipeline.pump_once().unwrap();

        let view = pipeline.render(ViewSelection::default()).unwrap();
        match view.chart.unwrap() {
            ChartData::Time { labels, datasets } => {
                assert_eq!(labels.len(), 300);
                assert_eq!(labels[250], "10:00:02");
                assert_eq!(datasets.len(), 1);
                assert_eq!(datasets[0].label, "EEG A3");
                assert_eq!(datasets[0].samples[299], 300.0);
            }
            other => panic!("expected time chart, got {other:?}"),
        }
        let mean = 150.5;
        assert!((view.band_power.unwrap().total() - mean).abs() < 1e-9);
    }

    #[test]
    fn filtered_variant_errors_when_disabled() {
        let config = AnalysisConfig {
            bandpass: None,
            ..AnalysisConfig::default()
        };
        let mut pipeline =
            AnalysisPipeline::new(ManualSource::new(vec![ramp_recording(120)]), config).unwrap();
        pipeline.pump_once().unwrap();
        let selection = ViewSelection {
            variant: SignalVariant::Filtered,
            ..ViewSelection::default()
        };
        assert!(matches!(
            pipeline.render(selection),
            Err(AnalysisError::VariantUnavailable { .. })
        ));
        assert!(pipeline.band_power(Channel::A3, SignalVariant::Filtered).is_none());
    }

    #[test]
    fn short_recording_skips_filtering() {
        let mut pipeline =
            AnalysisPipeline::new(ManualSource::new(vec![ramp_recording(20)]), AnalysisConfig::default())
                .unwrap();
        assert!(pipeline.pump_once().unwrap());
        assert!(pipeline.signals().unwrap().filtered.is_none());
        let view = pipeline
            .render(ViewSelection {
                view: ViewMode::Psd,
                ..ViewSelection::default()
            })
            .unwrap();
        match view.chart.unwrap() {
            ChartData::Psd { datasets, .. } => {
                assert!(datasets[0].psd.power.iter().all(|&p| p == f64::NEG_INFINITY));
            }
            other => panic!("expected psd chart, got {other:?}"),
        }
    }

    #[test]
    fn rejects_mismatched_rate_and_lengths() {
        let mut pipeline =
            AnalysisPipeline::new(ManualSource::new(vec![]), AnalysisConfig::default()).unwrap();
        let mut rec = ramp_recording(50);
        rec.sample_rate_hz = 250;
        assert!(matches!(
            pipeline.load(rec),
            Err(AnalysisError::SampleRateMismatch {
                expected: 100,
                actual: 250
            })
        ));
        let mut rec = ramp_recording(50);
        rec.timestamps.pop();
        assert!(matches!(
            pipeline.load(rec),
            Err(AnalysisError::LengthMismatch { .. })
        ));
        assert!(pipeline.signals().is_none());
    }

    #[test]
    fn invalid_bandpass_fails_construction() {
        let config = AnalysisConfig {
            sample_rate_hz: 50,
            ..AnalysisConfig::default()
        };
        // 30 Hz edge is above the 25 Hz Nyquist limit.
        assert!(matches!(
            AnalysisPipeline::new(ManualSource::new(vec![]), config),
            Err(AnalysisError::InvalidBandpass(_))
        ));
    }

    #[test]
    fn spectral_method_and_simulated_source() {
        let config = AnalysisConfig {
            band_power: BandPowerMethod::Spectral,
            ..AnalysisConfig::default()
        };
        let mut pipeline = AnalysisPipeline::new(SimulatedSource::new(100, 20.0, 1), config).unwrap();
        assert!(pipeline.pump_once().unwrap());
        let bands = pipeline.band_power(Channel::A3, SignalVariant::Filtered).unwrap();
        let alpha = bands.get(Band::Alpha);
        assert!(Band::ALL
            .iter()
            .filter(|&&b| b != Band::Alpha)
            .all(|&b| bands.get(b) < alpha));
    }

    #[test]
    fn view_serializes_non_finite_as_null() {
        let mut pipeline =
            AnalysisPipeline::new(ManualSource::new(vec![ramp_recording(300)]), AnalysisConfig::default())
                .unwrap();
        pipeline.pump_once().unwrap();
        let view = pipeline
            .render(ViewSelection {
                view: ViewMode::Psd,
                ..ViewSelection::default()
            })
            .unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["chart"]["view"], "psd");
        assert!(json["chart"]["datasets"][0]["psd"]["power"][0].is_null());
        assert_eq!(json["band_power"]["Delta"], serde_json::json!(150.5 * 0.25));
    }
}
