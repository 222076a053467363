// src/main.rs
use anyhow::{Context, Result};
use eeg_analyzer::{AnalysisConfig, AnalysisPipeline, SimulatedSource, ViewSelection};

const DEMO_SECONDS: f64 = 30.0;
const DEMO_SEED: u64 = 42;

// 用法: eeg-analyzer [selection-json] [config-json]
fn main() -> Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let selection = match args.next() {
        Some(json) => ViewSelection::from_json_str(&json).context("parsing view selection")?,
        None => ViewSelection::default(),
    };
    let config = match args.next() {
        Some(json) => AnalysisConfig::from_json_str(&json).context("parsing analysis config")?,
        None => AnalysisConfig::default(),
    };

    let source = SimulatedSource::new(config.sample_rate_hz, DEMO_SECONDS, DEMO_SEED);
    let mut pipeline = AnalysisPipeline::new(source, config).context("building pipeline")?;
    pipeline.pump_once().context("loading simulated recording")?;

    let view = pipeline.render(selection).context("rendering view")?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
