//! Analysis flows: fetch from a source, normalize, compute.
//!
//! The source is passed in by the caller, who owns its lifecycle. Nothing
//! here opens or closes it.

use gainledger_booking::{
    AnalysisOptions, EntityConsolidator, EntityGainReport, GainsError, LocationGainReport,
    LocationGainsCalculator,
};
use gainledger_core::{normalize_records, LocationId, TimeRange};
use gainledger_loader::{SourceError, TransactionSource};
use thiserror::Error;
use tracing::debug;

/// Errors from an analysis flow.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The transaction source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Validation or gains computation failed.
    #[error(transparent)]
    Gains(#[from] GainsError),
}

impl FlowError {
    /// The input data was rejected, as opposed to the source being unusable.
    #[must_use]
    pub const fn is_analysis_error(&self) -> bool {
        matches!(
            self,
            Self::Gains(_) | Self::Source(SourceError::UnknownLocation { .. })
        )
    }
}

/// Compute the gain report of one location.
pub fn analyze_location(
    source: &dyn TransactionSource,
    location: &LocationId,
    range: &TimeRange,
    options: AnalysisOptions,
) -> Result<LocationGainReport, FlowError> {
    if location.is_sentinel() {
        return Err(GainsError::InvalidLocation {
            location: location.clone(),
        }
        .into());
    }
    source.require_location(location)?;

    let records = source.fetch_transactions(std::slice::from_ref(location), range)?;
    debug!(%location, records = records.len(), "records fetched");
    let transactions = normalize_records(records).map_err(GainsError::from)?;

    Ok(LocationGainsCalculator::new(location.clone(), options).analyze(&transactions)?)
}

/// Compute the consolidated gain report of one entity.
pub fn analyze_entity(
    source: &dyn TransactionSource,
    entity_id: &str,
    range: &TimeRange,
    options: AnalysisOptions,
) -> Result<EntityGainReport, FlowError> {
    let entity = source
        .resolve_entity(entity_id)?
        .ok_or_else(|| GainsError::EntityNotFound {
            entity_id: entity_id.to_string(),
        })?;
    let consolidator = EntityConsolidator::new(entity, options)?;

    let locations: Vec<LocationId> = consolidator.entity().locations.iter().cloned().collect();
    let records = source.fetch_transactions(&locations, range)?;
    debug!(entity = entity_id, records = records.len(), "records fetched");
    let transactions = normalize_records(records).map_err(GainsError::from)?;

    Ok(consolidator.consolidate(&transactions)?)
}
