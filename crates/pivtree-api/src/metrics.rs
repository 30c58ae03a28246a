//! Prometheus counters served on `/metrics`
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct ApiMetrics {
    registry: Registry,
    pub requests_total: IntCounterVec,
    pub swap_batches_rejected_total: IntCounter,
    pub rows_processed_total: IntCounter,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("pivtree_requests_total", "HTTP requests by route"),
            &["route"],
        )?;
        let swap_batches_rejected_total = IntCounter::new(
            "pivtree_swap_batches_rejected_total",
            "Swap batches rejected for crossing group boundaries",
        )?;
        let rows_processed_total = IntCounter::new(
            "pivtree_rows_processed_total",
            "Processed rows emitted by /v1/process",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(swap_batches_rejected_total.clone()))?;
        registry.register(Box::new(rows_processed_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            swap_batches_rejected_total,
            rows_processed_total,
        })
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
