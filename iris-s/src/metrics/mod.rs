use prometheus::{
    proto::Metric, register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    Encoder, HistogramTimer, HistogramVec, IntCounterVec, Registry, TextEncoder,
};

/// Prediction counters and latency histograms for one service instance.
///
/// Each instance owns its registry so tests and embedded servers never share
/// series through the process-global default registry.
pub struct PredictionMetrics {
    registry: Registry,
    predictions_total: IntCounterVec,
    prediction_duration_seconds: HistogramVec,
}

impl PredictionMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let predictions_total = register_int_counter_vec_with_registry!(
            "predictions_total",
            "Total number of predictions",
            &["ip_address"],
            registry
        )?;

        let prediction_duration_seconds = register_histogram_vec_with_registry!(
            "prediction_duration_seconds",
            "Time spent processing prediction",
            &["endpoint"],
            vec![0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0],
            registry
        )?;

        Ok(Self {
            registry,
            predictions_total,
            prediction_duration_seconds,
        })
    }

    pub fn record_prediction(&self, ip_address: &str) {
        self.predictions_total.with_label_values(&[ip_address]).inc();
    }

    /// Starts a latency timer for `endpoint`; the observation is recorded when
    /// the timer is dropped or `observe_duration` is called.
    pub fn start_timer(&self, endpoint: &str) -> HistogramTimer {
        self.prediction_duration_seconds
            .with_label_values(&[endpoint])
            .start_timer()
    }

    // Reads go through gather() so asking about a label never creates its series.
    pub fn prediction_count(&self, ip_address: &str) -> u64 {
        self.find_series("predictions_total", "ip_address", ip_address)
            .map_or(0, |m| m.get_counter().get_value() as u64)
    }

    pub fn observation_count(&self, endpoint: &str) -> u64 {
        self.find_series("prediction_duration_seconds", "endpoint", endpoint)
            .map_or(0, |m| m.get_histogram().get_sample_count())
    }

    fn find_series(&self, family: &str, label: &str, value: &str) -> Option<Metric> {
        self.registry
            .gather()
            .into_iter()
            .find(|mf| mf.get_name() == family)?
            .take_metric()
            .into_iter()
            .find(|m| {
                m.get_label()
                    .iter()
                    .any(|l| l.get_name() == label && l.get_value() == value)
            })
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Text exposition of every registered series.
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
