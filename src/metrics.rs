/// Prometheus metrics for triage assessments.
///
/// Metrics are process-wide statics; `init_metrics` registers them once with
/// the crate registry and `gather_metrics` renders the text exposition.
///
/// # Example
/// ```no_run
/// use clinic_triage::metrics;
///
/// metrics::init_metrics().expect("metrics registration");
/// println!("{}", metrics::gather_metrics());
/// ```
use lazy_static::lazy_static;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, IntCounter, Opts, Registry};

const NAMESPACE: &str = "clinic_triage";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Completed assessments
    ///
    /// Labels: tier, mode (statistical, fused)
    pub static ref ASSESSMENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("assessments_total", "Total number of completed assessments")
            .namespace(NAMESPACE),
        &["tier", "mode"]
    ).expect("Failed to create ASSESSMENTS_TOTAL metric");

    /// End-to-end assessment duration in seconds
    ///
    /// Labels: mode
    pub static ref ASSESSMENT_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "assessment_duration_seconds",
            "Assessment duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0]),
        &["mode"]
    ).expect("Failed to create ASSESSMENT_DURATION_SECONDS metric");

    /// Outcome of LLM opinion requests
    ///
    /// Labels: status (used, timed_out, failed, not_configured)
    pub static ref LLM_OUTCOMES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("llm_outcomes_total", "Outcome of LLM opinion requests")
            .namespace(NAMESPACE),
        &["status"]
    ).expect("Failed to create LLM_OUTCOMES_TOTAL metric");

    /// Emergency overrides applied
    ///
    /// Labels: category
    pub static ref EMERGENCY_OVERRIDES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("emergency_overrides_total", "Emergency overrides applied to rankings")
            .namespace(NAMESPACE),
        &["category"]
    ).expect("Failed to create EMERGENCY_OVERRIDES_TOTAL metric");

    /// Inputs that normalized to zero tokens
    pub static ref DEGENERATE_INPUTS_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("degenerate_inputs_total", "Inputs with no usable tokens")
            .namespace(NAMESPACE)
    ).expect("Failed to create DEGENERATE_INPUTS_TOTAL metric");
}

/// Register all metrics with the crate registry. Safe to call more than once.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    register(Box::new(ASSESSMENTS_TOTAL.clone()))?;
    register(Box::new(ASSESSMENT_DURATION_SECONDS.clone()))?;
    register(Box::new(LLM_OUTCOMES_TOTAL.clone()))?;
    register(Box::new(EMERGENCY_OVERRIDES_TOTAL.clone()))?;
    register(Box::new(DEGENERATE_INPUTS_TOTAL.clone()))?;

    tracing::debug!("Prometheus metrics initialized");
    Ok(())
}

fn register(collector: Box<dyn prometheus::core::Collector>) -> Result<(), prometheus::Error> {
    match PROMETHEUS_REGISTRY.register(collector) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Generate Prometheus text format metrics
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
