use tracing_subscriber::EnvFilter;

/// Crates that report run progress: tile and cache messages come from here.
const PROGRESS_TARGETS: &[&str] = &["boreas", "boreas_engine", "boreas_io"];

/// Library crates whose messages are per-slice detail.
const DETAIL_TARGETS: &[&str] = &[
    "boreas_calendar",
    "boreas_indices",
    "boreas_percentile",
    "boreas_series",
    "boreas_tile",
];

fn level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directives for a CLI verbosity level.
///
/// Progress crates run one step ahead of the library crates, so a plain run
/// shows tile progress while `-v` adds per-slice detail. Everything outside the
/// workspace (netcdf, HDF5 bindings) stays at `warn` until `-vvv`.
pub fn default_filter(verbosity: u8) -> String {
    let progress = level(verbosity.saturating_add(1));
    let detail = level(verbosity);
    let external = if verbosity >= 3 { "debug" } else { "warn" };

    std::iter::once(external.to_string())
        .chain(PROGRESS_TARGETS.iter().map(|t| format!("{t}={progress}")))
        .chain(DETAIL_TARGETS.iter().map(|t| format!("{t}={detail}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize tracing on stderr for the given verbosity.
///
/// `RUST_LOG` overrides the CLI flag if set.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
