//! Analysis options.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What happens when a disposal exceeds the lots on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OversellPolicy {
    /// Match what is available and record the rest as unmatched quantity.
    /// Inventory held before the observation window has no known cost, so
    /// it must not abort a run.
    #[default]
    Lenient,
    /// Fail the ledger with [`crate::GainsError::UnmatchedSale`].
    Strict,
}

/// How internal transfers between two locations of the same entity move
/// cost basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferPolicy {
    /// Move FIFO lot slices, with their cost, from the sending location to
    /// the receiving one at the transfer timestamp. No gain is realized.
    #[default]
    CarryCostBasis,
    /// Drop internal transfers from the ledgers entirely. A later external
    /// sale at the receiving location then has no lots to match.
    Exclude,
}

impl FromStr for TransferPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "carry" | "carry-cost-basis" => Ok(Self::CarryCostBasis),
            "exclude" => Ok(Self::Exclude),
            _ => Err(format!("unknown transfer policy: {s}")),
        }
    }
}

impl fmt::Display for TransferPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CarryCostBasis => write!(f, "carry-cost-basis"),
            Self::Exclude => write!(f, "exclude"),
        }
    }
}

/// Options shared by the location calculator and the entity consolidator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Oversell handling.
    pub oversell: OversellPolicy,
    /// Internal transfer handling (entity runs only).
    pub transfers: TransferPolicy,
    /// Run independent commodities on the rayon pool.
    pub parallel: bool,
    /// Name recorded on reports.
    pub reporter: String,
    /// Timestamp recorded on reports; `None` uses the current time.
    pub analysis_time: Option<DateTime<Utc>>,
}

impl AnalysisOptions {
    /// Reporter name used when none is configured.
    pub const DEFAULT_REPORTER: &'static str = "Unknown Reporter";

    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the oversell policy.
    #[must_use]
    pub const fn with_oversell(mut self, oversell: OversellPolicy) -> Self {
        self.oversell = oversell;
        self
    }

    /// Set the transfer policy.
    #[must_use]
    pub const fn with_transfers(mut self, transfers: TransferPolicy) -> Self {
        self.transfers = transfers;
        self
    }

    /// Enable or disable parallel evaluation.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the reporter name.
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl Into<String>) -> Self {
        self.reporter = reporter.into();
        self
    }

    /// Pin the analysis timestamp.
    #[must_use]
    pub const fn with_analysis_time(mut self, at: DateTime<Utc>) -> Self {
        self.analysis_time = Some(at);
        self
    }

    pub(crate) fn analyzed_at(&self) -> DateTime<Utc> {
        self.analysis_time.unwrap_or_else(Utc::now)
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            oversell: OversellPolicy::Lenient,
            transfers: TransferPolicy::CarryCostBasis,
            parallel: true,
            reporter: Self::DEFAULT_REPORTER.to_string(),
            analysis_time: None,
        }
    }
}
