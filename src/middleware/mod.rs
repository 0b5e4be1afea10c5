pub mod metrics;

pub use metrics::RequestMetrics;
