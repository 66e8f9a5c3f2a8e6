//! HTTP handlers for lot traceability

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use shared::LotChains;

use crate::{
    error::AppResult,
    middleware::AuthUser,
    services::{ChainFilter, TraceabilityService},
    AppState,
};

use super::to_range;

/// Query parameters for lot chains
#[derive(Debug, Deserialize)]
pub struct TraceabilityQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    /// Lot number substring
    pub lot: Option<String>,
    /// Shipment destination substring (reverse lookup)
    pub destination: Option<String>,
}

/// Lot chains for every harvest in the window
pub async fn get_lot_chains(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TraceabilityQuery>,
) -> AppResult<Json<LotChains>> {
    let range = to_range(query.start.as_deref(), query.end.as_deref())?;
    let filter = ChainFilter {
        lot: query.lot,
        destination: query.destination,
    };

    let service = TraceabilityService::new(state.store.clone());
    let chains = service.get_chains(&user.scope(), range, &filter).await?;
    Ok(Json(chains))
}
