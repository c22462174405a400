// MLS listing data: CSV loading, column detection, and market metrics.
// Pure computation, no I/O beyond the bytes handed in by the caller.

pub mod columns;
pub mod dataset;
pub mod metrics;

pub use dataset::ListingDataset;
pub use metrics::{analyze_csv, MarketMetrics, MetricsOutcome};
