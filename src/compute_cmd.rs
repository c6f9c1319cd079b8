//! Compute command: evaluate one index over NetCDF inputs into JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use boreas_engine::{TracingProgress, compute};
use boreas_io::{JsonSink, NetcdfSource};

use crate::cli::ComputeArgs;
use crate::config::BoreasConfig;
use crate::convert;

/// Run a single index computation.
pub fn run(args: ComputeArgs) -> Result<()> {
    let _cmd = info_span!("compute").entered();
    let toml_str = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read config file: {}", args.config.display()))?;
    let mut config: BoreasConfig =
        toml::from_str(&toml_str).context("failed to parse TOML config")?;

    if let Some(index) = args.index {
        config.index = Some(index);
        config.user_index = None;
    }
    if let Some(mb) = args.memory_mb {
        config.memory.bytes = None;
        config.memory.transfer_limit_mb = Some(mb);
    }
    let output: PathBuf = args
        .output
        .or_else(|| config.output.path.clone())
        .ok_or_else(|| anyhow::anyhow!("no output path: set [output].path in config or use --output"))?;

    let request = convert::build_request(&config).context("invalid run configuration")?;
    let source = NetcdfSource::new().with_time_variable(config.period.time_variable.clone());
    let mut sink = JsonSink::new(&output).with_pretty(args.pretty || config.output.pretty);

    info!(
        index = request.index().name(),
        variables = request.variables().len(),
        output = %output.display(),
        "computing index"
    );
    let written = compute(&request, &source, &mut sink, &mut TracingProgress)
        .with_context(|| format!("failed to compute {}", request.index().name()))?;
    info!(path = %written.display(), "done");
    Ok(())
}
