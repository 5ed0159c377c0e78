//! Prometheus metrics for ShardMail nodes.
//!
//! All metrics follow the naming convention: `sm_<subsystem>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., messages_routed_total)
//! - **Gauge**: Value that can go up or down (e.g., shard_up)
//! - **Histogram**: Distribution of values (e.g., shard_call_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ROUTING METRICS (Subsystem 2)
    // =========================================================================

    /// Messages placed, by shard
    pub static ref MESSAGES_ROUTED: CounterVec = CounterVec::new(
        Opts::new("sm_dispatch_messages_routed_total", "Messages placed on a shard"),
        &["shard"]
    ).expect("metric creation failed");

    /// Routing attempts that placed nothing
    pub static ref ROUTING_FAILURES: CounterVec = CounterVec::new(
        Opts::new("sm_dispatch_routing_failures_total", "Routing attempts that placed no message"),
        &["reason"]  // reason: no_available/no_healthy/upstream/rejected
    ).expect("metric creation failed");

    // =========================================================================
    // SHARD CALL METRICS
    // =========================================================================

    /// Failed shard calls, by shard and operation
    pub static ref SHARD_CALL_FAILURES: CounterVec = CounterVec::new(
        Opts::new("sm_shard_call_failures_total", "Shard calls that were unreachable or timed out"),
        &["shard", "operation"]
    ).expect("metric creation failed");

    /// Shard call latency
    pub static ref SHARD_CALL_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "sm_shard_call_duration_seconds",
            "Time spent waiting on shard calls"
        ).buckets(exponential_buckets(0.0005, 2.0, 14).unwrap()),
        &["operation"]
    ).expect("metric creation failed");

    /// Receiver reads refused because of an integrity mismatch
    pub static ref CORRUPTED_READS: CounterVec = CounterVec::new(
        Opts::new("sm_shard_corrupted_reads_total", "Receiver reads aborted by integrity check"),
        &["shard"]
    ).expect("metric creation failed");

    // =========================================================================
    // HEALTH METRICS
    // =========================================================================

    /// 1 when a shard is UP, 0 when DOWN
    pub static ref SHARD_UP: GaugeVec = GaugeVec::new(
        Opts::new("sm_health_shard_up", "Shard health as recorded by the registry"),
        &["shard"]
    ).expect("metric creation failed");

    /// Entries currently retained in the event log
    pub static ref EVENT_LOG_SIZE: Gauge = Gauge::new(
        "sm_dispatch_event_log_entries",
        "Entries retained in the bounded event log"
    ).expect("metric creation failed");

    // =========================================================================
    // GATEWAY METRICS (Subsystem 3)
    // =========================================================================

    /// Requests answered by the gateway, by route and status class
    pub static ref HTTP_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("sm_gateway_requests_total", "Requests answered by the gateway"),
        &["route", "status"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Routing
        Box::new(MESSAGES_ROUTED.clone()),
        Box::new(ROUTING_FAILURES.clone()),
        // Shard calls
        Box::new(SHARD_CALL_FAILURES.clone()),
        Box::new(SHARD_CALL_DURATION.clone()),
        Box::new(CORRUPTED_READS.clone()),
        // Health
        Box::new(SHARD_UP.clone()),
        Box::new(EVENT_LOG_SIZE.clone()),
        // Gateway
        Box::new(HTTP_REQUESTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing a shard call. Observation happens on drop.
pub fn time_shard_call(operation: &str) -> HistogramTimer {
    HistogramTimer::new(&SHARD_CALL_DURATION.with_label_values(&[operation]))
}
