use crate::models::ServiceType;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    Encoder, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for a simulation run
// ============================================================================
//
// Provides metrics for:
// - Customer admission and rejection at the closing check
// - Completed services per service type and their duration
// - Worker breaks and benign queue races
// - Current queue lengths
//
// Each run owns its registry; render it with `Metrics::render`.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Customer Metrics
    pub customers_admitted: IntCounter,
    pub customers_turned_away: IntCounter,

    // Service Metrics
    pub services_completed: IntCounterVec,
    pub service_duration: HistogramVec,

    // Worker Metrics
    pub worker_breaks: IntCounter,
    pub benign_races: IntCounter,

    // Queue Metrics
    pub queue_length: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let customers_admitted = IntCounter::new(
            "post_office_customers_admitted_total",
            "Customers that joined a queue before closing",
        )?;
        registry.register(Box::new(customers_admitted.clone()))?;

        let customers_turned_away = IntCounter::new(
            "post_office_customers_turned_away_total",
            "Customers that found the office closed",
        )?;
        registry.register(Box::new(customers_turned_away.clone()))?;

        let services_completed = IntCounterVec::new(
            Opts::new("post_office_services_completed_total", "Completed services"),
            &["service"],
        )?;
        registry.register(Box::new(services_completed.clone()))?;

        let service_duration = HistogramVec::new(
            HistogramOpts::new(
                "post_office_service_duration_seconds",
                "Time from calling a customer to their departure",
            )
            .buckets(vec![0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1]),
            &["service"],
        )?;
        registry.register(Box::new(service_duration.clone()))?;

        let worker_breaks = IntCounter::new(
            "post_office_worker_breaks_total",
            "Breaks taken while every queue was empty",
        )?;
        registry.register(Box::new(worker_breaks.clone()))?;

        let benign_races = IntCounter::new(
            "post_office_benign_races_total",
            "Pickups that found the queues drained after a non-empty check",
        )?;
        registry.register(Box::new(benign_races.clone()))?;

        let queue_length = IntGaugeVec::new(
            Opts::new("post_office_queue_length", "Customers waiting to be called"),
            &["service"],
        )?;
        registry.register(Box::new(queue_length.clone()))?;

        Ok(Self {
            registry,
            customers_admitted,
            customers_turned_away,
            services_completed,
            service_duration,
            worker_breaks,
            benign_races,
            queue_length,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a finished handshake
    pub fn record_service(&self, service: ServiceType, duration_secs: f64) {
        self.services_completed.with_label_values(&[service.label()]).inc();
        self.service_duration
            .with_label_values(&[service.label()])
            .observe(duration_secs);
    }

    /// Helper to mirror a queue length after it changed
    pub fn set_queue_length(&self, service: ServiceType, length: usize) {
        self.queue_length
            .with_label_values(&[service.label()])
            .set(i64::try_from(length).unwrap_or(i64::MAX));
    }

    /// Text exposition of every metric in the registry
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
