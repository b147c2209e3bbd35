//! Request metrics.
//!
//! Instruments come from the global OpenTelemetry meter, which is a no-op
//! until [`init_observability`] installs a provider.

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Counters and timings recorded by the chat service.
#[derive(Debug, Clone)]
pub struct RelayMetrics {
    requests: Counter<u64>,
    failures: Counter<u64>,
    generation_seconds: Histogram<f64>,
}

impl RelayMetrics {
    /// Creates instruments on the global meter named `chatrelay`.
    pub fn new() -> Self {
        Self::from_meter(&global::meter("chatrelay"))
    }

    /// Creates instruments on `meter`.
    pub fn from_meter(meter: &Meter) -> Self {
        Self {
            requests: meter
                .u64_counter("chatrelay_requests_total")
                .with_description("Chat requests received")
                .build(),
            failures: meter
                .u64_counter("chatrelay_failures_total")
                .with_description("Chat requests answered with a failure envelope")
                .build(),
            generation_seconds: meter
                .f64_histogram("chatrelay_generation_seconds")
                .with_description("Time spent waiting on the generation backend")
                .with_unit("s")
                .build(),
        }
    }

    /// Records an inbound request.
    pub fn record_request(&self) {
        self.requests.add(1, &[]);
    }

    /// Records a failure in `category`.
    pub fn record_failure(&self, category: &'static str) {
        self.failures.add(1, &[KeyValue::new("category", category)]);
    }

    /// Records how long one backend call took.
    pub fn record_generation(&self, elapsed: Duration, succeeded: bool) {
        self.generation_seconds.record(
            elapsed.as_secs_f64(),
            &[KeyValue::new("succeeded", succeeded)],
        );
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the global meter provider.
///
/// With the `metrics` feature, `OTEL_EXPORTER=otlp` exports to
/// `OTEL_EXPORTER_OTLP_ENDPOINT` (default `http://localhost:4318`); anything
/// else exports to stdout. Without the feature this only logs.
///
/// # Errors
///
/// Returns a message when the OTLP exporter cannot be created.
#[instrument(skip_all, fields(service = service_name))]
pub fn init_observability(
    service_name: &'static str,
    export_interval_secs: u64,
) -> Result<(), String> {
    #[cfg(not(feature = "metrics"))]
    {
        let _ = export_interval_secs;
        info!(service_name, "Metrics feature disabled, skipping exporter setup");
        debug!("Instruments will record into the no-op meter");
        Ok(())
    }

    #[cfg(feature = "metrics")]
    {
        use opentelemetry_sdk::{
            Resource,
            metrics::{PeriodicReader, SdkMeterProvider},
        };

        let resource = Resource::builder_empty()
            .with_attributes([KeyValue::new("service.name", service_name)])
            .build();
        let interval = Duration::from_secs(export_interval_secs);
        let exporter_type =
            std::env::var("OTEL_EXPORTER").unwrap_or_else(|_| "stdout".to_string());
        info!(service_name, exporter_type = %exporter_type, "Initializing metrics");

        let provider = match exporter_type.as_str() {
            "otlp" => {
                use opentelemetry_otlp::{MetricExporter, WithExportConfig};

                let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:4318".to_string());
                let exporter = MetricExporter::builder()
                    .with_http()
                    .with_endpoint(&endpoint)
                    .with_timeout(Duration::from_secs(10))
                    .build()
                    .map_err(|e| format!("Failed to create OTLP exporter: {}", e))?;
                debug!(endpoint = %endpoint, "OTLP metric exporter created");

                SdkMeterProvider::builder()
                    .with_resource(resource)
                    .with_reader(PeriodicReader::builder(exporter).with_interval(interval).build())
                    .build()
            }
            _ => {
                let exporter = opentelemetry_stdout::MetricExporter::default();
                SdkMeterProvider::builder()
                    .with_resource(resource)
                    .with_reader(PeriodicReader::builder(exporter).with_interval(interval).build())
                    .build()
            }
        };

        global::set_meter_provider(provider);
        info!("Meter provider registered globally");
        Ok(())
    }
}
