//! Market metrics: inventory, absorption, and conversion figures from an MLS export.
//!
//! Flow: resolve columns → classify each row's status → count → derive rates →
//!       match the subject property's price → average sold prices.
//!
//! `compute_market_metrics` returns a typed error. `analyze_market` is the recovery
//! boundary used by the workflows: any failure collapses into `MetricsOutcome::Failed`,
//! which serializes as `{"error": "..."}`.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::listings::columns::{resolve_columns, CanonicalField, ColumnMapping};
use crate::listings::dataset::{DatasetError, ListingDataset};

/// MOI reported when there were no sales in the window (no velocity to divide by).
pub const NO_VELOCITY_MOI: f64 = 99.0;

pub const NOT_AVAILABLE: &str = "N/A";

const SOLD_PATTERN: &str = "sold|closed";
const ACTIVE_PATTERN: &str = "active";
const FAILED_PATTERN: &str = "exp|with|canc";

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Required column missing from CSV: no header matches '{0}'")]
    MissingColumn(CanonicalField),

    #[error("Lookback window must be greater than zero months")]
    InvalidWindow,

    #[error("Could not read listing data: {0}")]
    Dataset(#[from] DatasetError),
}

// ────────────────────────────────────────────────────────────────────────────
// Status classification
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    Sold,
    Active,
    /// Expired, withdrawn, or cancelled.
    Failed,
}

/// Categories a status string matched. The checks are independent, so a row
/// can land in more than one category (e.g. "Active - Sold Pending").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusClass {
    pub sold: bool,
    pub active: bool,
    pub failed: bool,
}

impl StatusClass {
    pub fn contains(&self, status: ListingStatus) -> bool {
        match status {
            ListingStatus::Sold => self.sold,
            ListingStatus::Active => self.active,
            ListingStatus::Failed => self.failed,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        !(self.sold || self.active || self.failed)
    }
}

/// Case-insensitive status matchers, compiled once for the process.
pub struct StatusClassifier {
    sold: Regex,
    active: Regex,
    failed: Regex,
}

impl StatusClassifier {
    pub fn shared() -> &'static StatusClassifier {
        static CLASSIFIER: OnceLock<StatusClassifier> = OnceLock::new();
        CLASSIFIER.get_or_init(|| {
            let build = |pattern: &str| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("status regex must compile")
            };
            StatusClassifier {
                sold: build(SOLD_PATTERN),
                active: build(ACTIVE_PATTERN),
                failed: build(FAILED_PATTERN),
            }
        })
    }

    pub fn classify(&self, status: &str) -> StatusClass {
        StatusClass {
            sold: self.sold.is_match(status),
            active: self.active.is_match(status),
            failed: self.failed.is_match(status),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// Computed market figures for one analysis request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMetrics {
    pub months_of_inventory: f64,
    pub absorption_rate: f64,
    /// Percentage, 0–100, one decimal.
    pub success_ratio: f64,
    /// Raw list price cell of the subject property, or "N/A".
    pub subject_price_found: String,
    /// Formatted average of sold prices, or "N/A".
    pub avg_sold_price: String,
    pub sold_count: usize,
    pub active_count: usize,
    pub failed_count: usize,
    pub lookback_months: u32,
}

impl MarketMetrics {
    /// Share of finished listings that did not sell, one decimal.
    pub fn failure_rate(&self) -> f64 {
        round_to(100.0 - self.success_ratio, 1)
    }

    pub fn has_sales_velocity(&self) -> bool {
        self.absorption_rate > 0.0
    }
}

/// Result of the metrics step as seen by workflows and clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricsOutcome {
    Computed(MarketMetrics),
    Failed { error: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Core computation
// ────────────────────────────────────────────────────────────────────────────

/// Computes market metrics for `address` over a `lookback_months` window.
///
/// Only the status column is required; price and street columns degrade to "N/A".
pub fn compute_market_metrics(
    dataset: &ListingDataset,
    address: &str,
    lookback_months: u32,
) -> Result<MarketMetrics, MetricsError> {
    if lookback_months == 0 {
        return Err(MetricsError::InvalidWindow);
    }

    let mapping = resolve_columns(dataset.columns());
    let status_idx = mapping
        .index_of(CanonicalField::Status)
        .ok_or(MetricsError::MissingColumn(CanonicalField::Status))?;

    let classifier = StatusClassifier::shared();
    let classes: Vec<StatusClass> = (0..dataset.row_count())
        .map(|row| {
            dataset
                .cell(row, status_idx)
                .map(|s| classifier.classify(s))
                .unwrap_or_default()
        })
        .collect();

    let count = |status| classes.iter().filter(|c| c.contains(status)).count();
    let sold_count = count(ListingStatus::Sold);
    let active_count = count(ListingStatus::Active);
    let failed_count = count(ListingStatus::Failed);

    let absorption = sold_count as f64 / lookback_months as f64;
    let moi = if absorption > 0.0 {
        active_count as f64 / absorption
    } else {
        NO_VELOCITY_MOI
    };

    let finished = sold_count + failed_count;
    let success_ratio = if finished > 0 {
        sold_count as f64 / finished as f64 * 100.0
    } else {
        0.0
    };

    let subject_price_found =
        find_subject_price(dataset, &mapping, address).unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let avg_sold_price = average_sold_price(dataset, &mapping, &classes)
        .map(format_currency)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    debug!(
        "Classified {} rows: sold={}, active={}, failed={}, unclassified={}",
        dataset.row_count(),
        sold_count,
        active_count,
        failed_count,
        classes.iter().filter(|c| c.is_unclassified()).count()
    );

    Ok(MarketMetrics {
        months_of_inventory: round_to(moi, 2),
        absorption_rate: round_to(absorption, 2),
        success_ratio: round_to(success_ratio, 1),
        subject_price_found,
        avg_sold_price,
        sold_count,
        active_count,
        failed_count,
        lookback_months,
    })
}

/// Recovery boundary for the whole metrics step: never propagates, always returns an outcome.
pub fn analyze_market(dataset: &ListingDataset, address: &str, lookback_months: u32) -> MetricsOutcome {
    match compute_market_metrics(dataset, address, lookback_months) {
        Ok(metrics) => {
            info!(
                "Metrics computed: moi={} absorption={} success={}%",
                metrics.months_of_inventory, metrics.absorption_rate, metrics.success_ratio
            );
            MetricsOutcome::Computed(metrics)
        }
        Err(e) => MetricsOutcome::Failed {
            error: e.to_string(),
        },
    }
}

/// Parses CSV bytes and analyzes them in one step; a parse failure is also an outcome.
pub fn analyze_csv(bytes: &[u8], address: &str, lookback_months: u32) -> MetricsOutcome {
    match ListingDataset::from_csv_bytes(bytes) {
        Ok(dataset) => analyze_market(&dataset, address, lookback_months),
        Err(e) => MetricsOutcome::Failed {
            error: MetricsError::from(e).to_string(),
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

/// Finds the subject row by "<number> <name>" containing the first two address tokens.
fn find_subject_price(
    dataset: &ListingDataset,
    mapping: &ColumnMapping,
    address: &str,
) -> Option<String> {
    let number_idx = mapping.index_of(CanonicalField::StreetNumber)?;
    let name_idx = mapping.index_of(CanonicalField::StreetName)?;
    let price_idx = mapping.index_of(CanonicalField::ListPrice)?;

    let query = address
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if query.is_empty() {
        return None;
    }

    (0..dataset.row_count())
        .find(|&row| match (dataset.cell(row, number_idx), dataset.cell(row, name_idx)) {
            (Some(number), Some(name)) => format!("{} {}", number.trim(), name.trim())
                .to_lowercase()
                .contains(&query),
            // A row missing either half has no street address to match.
            _ => false,
        })
        .and_then(|row| dataset.cell(row, price_idx))
        .map(|price| price.trim().to_string())
}

fn average_sold_price(
    dataset: &ListingDataset,
    mapping: &ColumnMapping,
    classes: &[StatusClass],
) -> Option<f64> {
    let price_idx = mapping.index_of(CanonicalField::ListPrice)?;

    let prices: Vec<f64> = classes
        .iter()
        .enumerate()
        .filter(|(_, class)| class.sold)
        .filter_map(|(row, _)| dataset.cell(row, price_idx))
        .filter_map(parse_price)
        .collect();

    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

/// Strips currency symbols, separators, and whitespace, then parses. Non-numbers yield `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats a dollar amount as `$1,234,567.89`.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
