use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

/// Request-level instruments. No-ops unless an OTLP meter provider is installed.
#[derive(Clone)]
pub struct ApiMetrics {
    duration: Histogram<f64>,
    requests: Counter<u64>,
    detections: Counter<u64>,
}

impl ApiMetrics {
    pub fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];
        let duration = meter
            .f64_histogram("predict_duration_seconds")
            .with_description("Time to answer a prediction request (decode + inference)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();
        let requests = meter
            .u64_counter("predict_requests_total")
            .with_description("Prediction requests by route and outcome")
            .build();
        let detections = meter
            .u64_counter("predict_detections_total")
            .with_description("Total detections returned")
            .build();

        Self {
            duration,
            requests,
            detections,
        }
    }

    pub fn record(&self, route: &'static str, outcome: &'static str, elapsed_secs: f64, detections: usize) {
        let attributes = [
            KeyValue::new("route", route),
            KeyValue::new("outcome", outcome),
        ];
        self.duration.record(elapsed_secs, &attributes);
        self.requests.add(1, &attributes);
        if detections > 0 {
            self.detections
                .add(detections as u64, &[KeyValue::new("route", route)]);
        }
    }
}
