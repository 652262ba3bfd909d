//! Prometheus metrics for the faucet

use prometheus::{opts, Encoder, IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder};

/// Faucet counters, kept in a private registry per service instance
#[derive(Debug, Clone)]
pub struct FaucetMetrics {
    registry: Registry,
    /// Requests by outcome (`success` or an error code)
    pub requests_total: IntCounterVec,
    /// Base units sent to recipients
    pub dispensed_total: IntCounter,
    /// Last observed dispenser balance, base units
    pub dispenser_balance: IntGauge,
}

impl FaucetMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            opts!("capsule_faucet_requests_total", "Faucet requests by outcome"),
            &["outcome"],
        )?;

        let dispensed_total = IntCounter::with_opts(opts!(
            "capsule_faucet_dispensed_total",
            "Total base units dispensed"
        ))?;

        let dispenser_balance = IntGauge::with_opts(opts!(
            "capsule_faucet_dispenser_balance",
            "Last observed dispenser balance in base units"
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(dispensed_total.clone()))?;
        registry.register(Box::new(dispenser_balance.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            dispensed_total,
            dispenser_balance,
        })
    }

    pub fn record_outcome(&self, outcome: &str) {
        self.requests_total.with_label_values(&[outcome]).inc();
    }

    pub fn observe_balance(&self, balance: u128) {
        self.dispenser_balance
            .set(i64::try_from(balance).unwrap_or(i64::MAX));
    }

    /// Render in the Prometheus text exposition format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
