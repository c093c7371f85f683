//! Prometheus metrics

use crate::collector::CycleReport;
use crate::sink::SinkKind;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

const FETCH_TOTAL: &str = "collector_fetch_total";
const SINK_WRITES_TOTAL: &str = "collector_sink_writes_total";
const CYCLES_TOTAL: &str = "collector_cycles_total";
const CYCLE_DURATION_SECONDS: &str = "collector_cycle_duration_seconds";
const CYCLE_TICKS: &str = "collector_cycle_ticks";

/// Serve metrics on `0.0.0.0:<port>/metrics`
///
/// Must be called from within the tokio runtime.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

fn outcome_label(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

/// Count one price fetch
pub fn record_fetch(ok: bool) {
    metrics::counter!(FETCH_TOTAL, "outcome" => outcome_label(ok)).increment(1);
}

/// Count one sink write
pub fn record_sink_write(sink: SinkKind, ok: bool) {
    metrics::counter!(
        SINK_WRITES_TOTAL,
        "sink" => sink.as_str(),
        "outcome" => outcome_label(ok)
    )
    .increment(1);
}

/// Record a finished cycle
pub fn record_cycle(report: &CycleReport, duration: Duration) {
    metrics::counter!(CYCLES_TOTAL).increment(1);
    metrics::histogram!(CYCLE_DURATION_SECONDS).record(duration.as_secs_f64());
    metrics::gauge!(CYCLE_TICKS).set(report.ticks_produced() as f64);
}
