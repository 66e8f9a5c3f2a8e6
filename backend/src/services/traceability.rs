//! Traceability service: fetch a window of harvests and assemble their lot chains

use std::sync::Arc;

use shared::{
    build_chains, filter_by_lot, reverse_lookup, DateRange, FertilizerUse, Harvest, LotChains,
    PesticideUse, Shipment, TraceabilityInput, WorkLog,
};

use crate::error::AppResult;
use crate::store::{RecordStore, Scope};

use super::RecordFetcher;

/// Optional narrowing applied after the chains are built
#[derive(Debug, Clone, Default)]
pub struct ChainFilter {
    /// Case-insensitive lot number substring
    pub lot: Option<String>,
    /// Case-insensitive shipment destination substring
    pub destination: Option<String>,
}

/// Traceability service for lot chains
#[derive(Clone)]
pub struct TraceabilityService {
    fetcher: RecordFetcher,
}

impl TraceabilityService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            fetcher: RecordFetcher::new(store),
        }
    }

    /// Fetch the harvests dated in the window plus every record that can join their chains.
    ///
    /// Activities are read up to the latest harvest date with no lower bound. Shipments are
    /// read from the window start with no upper bound.
    pub async fn fetch_input(&self, scope: &Scope, range: DateRange) -> AppResult<TraceabilityInput> {
        let harvests = self.fetcher.fetch::<Harvest>(scope, range).await?;
        let Some(latest) = harvests.iter().filter_map(|h| h.record.harvest_date).max() else {
            return Ok(TraceabilityInput {
                harvests,
                ..Default::default()
            });
        };

        let (shipments, pesticide_uses, fertilizer_uses, work_logs) = tokio::try_join!(
            self.fetcher.fetch_since::<Shipment>(scope, range.start),
            self.fetcher.fetch_until::<PesticideUse>(scope, latest),
            self.fetcher.fetch_until::<FertilizerUse>(scope, latest),
            self.fetcher.fetch_until::<WorkLog>(scope, latest),
        )?;

        Ok(TraceabilityInput {
            harvests,
            shipments,
            pesticide_uses,
            fertilizer_uses,
            work_logs,
        })
    }

    /// Build lot chains for every harvest in the window, then apply filters
    pub async fn get_chains(
        &self,
        scope: &Scope,
        range: DateRange,
        filter: &ChainFilter,
    ) -> AppResult<LotChains> {
        let input = self.fetch_input(scope, range).await?;
        let mut chains = build_chains(&input);

        if let Some(lot) = filter.lot.as_deref().filter(|q| !q.trim().is_empty()) {
            chains = filter_by_lot(chains, lot.trim());
        }
        if let Some(destination) = filter.destination.as_deref().filter(|q| !q.trim().is_empty()) {
            chains = reverse_lookup(chains, destination.trim());
        }

        tracing::debug!(
            harvests = input.harvests.len(),
            lots = chains.len(),
            "Built traceability chains"
        );
        Ok(chains)
    }
}
