//! Lot traceability chains
//!
//! For every harvest a lot is assembled from the shipments that left with it
//! and the pesticide, fertilizer and work history of its field up to the
//! harvest date. Records carry no foreign keys, so all correlation is done
//! here by id, lot number, crop/field name and date ordering.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FertilizerUse, Harvest, PesticideUse, Shipment, WorkLog};
use crate::types::Document;

/// Kind of event on a lot timeline.
///
/// Declaration order is also the tiebreak for events on the same date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    Pesticide,
    Fertilizer,
    WorkLog,
    Harvest,
    Shipment,
}

/// One dated entry on a lot timeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub event_type: EventType,
    pub date: Option<NaiveDate>,
    pub record_id: Uuid,
    pub description: String,
}

/// Everything known about one harvested lot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LotChain {
    pub lot_number: String,
    pub harvest: Document<Harvest>,
    pub shipments: Vec<Document<Shipment>>,
    pub pesticides: Vec<Document<PesticideUse>>,
    pub fertilizers: Vec<Document<FertilizerUse>>,
    pub work_logs: Vec<Document<WorkLog>>,
    pub timeline: Vec<TimelineEvent>,
    /// Attached shipments that also matched another lot
    pub shared_shipment_ids: Vec<Uuid>,
}

/// Lot key to chain, ordered by key
pub type LotChains = BTreeMap<String, LotChain>;

/// Already-fetched records to correlate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceabilityInput {
    #[serde(default)]
    pub harvests: Vec<Document<Harvest>>,
    #[serde(default)]
    pub shipments: Vec<Document<Shipment>>,
    #[serde(default)]
    pub pesticide_uses: Vec<Document<PesticideUse>>,
    #[serde(default)]
    pub fertilizer_uses: Vec<Document<FertilizerUse>>,
    #[serde(default)]
    pub work_logs: Vec<Document<WorkLog>>,
}

/// Stored lot number, or `LOT-` plus the first 8 characters of the record id
pub fn lot_identifier(harvest: &Document<Harvest>) -> String {
    match harvest.record.lot_number.as_deref().map(str::trim) {
        Some(lot) if !lot.is_empty() => lot.to_string(),
        _ => {
            let id = harvest.id.to_string();
            format!("LOT-{}", &id[..8])
        }
    }
}

fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.map(str::trim), b.map(str::trim)) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    }
}

/// A shipment belongs to a lot by harvest id, by lot number, or by crop and field
pub fn shipment_matches(lot_id: &str, harvest: &Document<Harvest>, shipment: &Shipment) -> bool {
    if shipment.harvest_id == Some(harvest.id) {
        return true;
    }
    if same_text(shipment.lot_number.as_deref(), Some(lot_id)) {
        return true;
    }
    same_text(shipment.crop_name.as_deref(), Some(&harvest.record.crop_name))
        && same_text(shipment.field_name.as_deref(), harvest.record.field_name.as_deref())
}

/// True when `date` is on or before the harvest date; undated records never qualify
pub fn occurred_by(date: Option<NaiveDate>, harvest_date: Option<NaiveDate>) -> bool {
    matches!((date, harvest_date), (Some(d), Some(h)) if d <= h)
}

/// Build one chain per harvest
pub fn build_chains(input: &TraceabilityInput) -> LotChains {
    let mut chains = LotChains::new();

    for harvest in &input.harvests {
        let lot_number = lot_identifier(harvest);
        let field = harvest.record.field_ref();
        let harvest_date = harvest.record.harvest_date;

        let shipments: Vec<_> = input
            .shipments
            .iter()
            .filter(|s| shipment_matches(&lot_number, harvest, &s.record))
            .cloned()
            .collect();
        let pesticides: Vec<_> = input
            .pesticide_uses
            .iter()
            .filter(|p| field.matches(&p.record.field_ref()) && occurred_by(p.record.date, harvest_date))
            .cloned()
            .collect();
        let fertilizers: Vec<_> = input
            .fertilizer_uses
            .iter()
            .filter(|f| field.matches(&f.record.field_ref()) && occurred_by(f.record.date, harvest_date))
            .cloned()
            .collect();
        let work_logs: Vec<_> = input
            .work_logs
            .iter()
            .filter(|w| field.matches(&w.record.field_ref()) && occurred_by(w.record.date, harvest_date))
            .cloned()
            .collect();

        let timeline = build_timeline(harvest, &shipments, &pesticides, &fertilizers, &work_logs);

        let key = unique_key(&chains, &lot_number);
        chains.insert(
            key,
            LotChain {
                lot_number,
                harvest: harvest.clone(),
                shipments,
                pesticides,
                fertilizers,
                work_logs,
                timeline,
                shared_shipment_ids: Vec::new(),
            },
        );
    }

    mark_shared_shipments(&mut chains);
    chains
}

/// Two harvests with the same stored lot number get `#2`, `#3`, ... suffixes
fn unique_key(chains: &LotChains, lot_number: &str) -> String {
    if !chains.contains_key(lot_number) {
        return lot_number.to_string();
    }
    (2..)
        .map(|n| format!("{}#{}", lot_number, n))
        .find(|k| !chains.contains_key(k))
        .unwrap_or_else(|| lot_number.to_string())
}

fn mark_shared_shipments(chains: &mut LotChains) {
    let mut attachments: HashMap<Uuid, usize> = HashMap::new();
    for chain in chains.values() {
        for shipment in &chain.shipments {
            *attachments.entry(shipment.id).or_default() += 1;
        }
    }
    for chain in chains.values_mut() {
        chain.shared_shipment_ids = chain
            .shipments
            .iter()
            .map(|s| s.id)
            .filter(|id| attachments.get(id).is_some_and(|n| *n > 1))
            .collect();
    }
}

fn build_timeline(
    harvest: &Document<Harvest>,
    shipments: &[Document<Shipment>],
    pesticides: &[Document<PesticideUse>],
    fertilizers: &[Document<FertilizerUse>],
    work_logs: &[Document<WorkLog>],
) -> Vec<TimelineEvent> {
    let mut events = Vec::with_capacity(1 + shipments.len() + pesticides.len() + fertilizers.len() + work_logs.len());

    events.extend(pesticides.iter().map(|p| TimelineEvent {
        event_type: EventType::Pesticide,
        date: p.record.date,
        record_id: p.id,
        description: p.record.pesticide_name.clone(),
    }));
    events.extend(fertilizers.iter().map(|f| TimelineEvent {
        event_type: EventType::Fertilizer,
        date: f.record.date,
        record_id: f.id,
        description: f.record.fertilizer_name.clone(),
    }));
    events.extend(work_logs.iter().map(|w| TimelineEvent {
        event_type: EventType::WorkLog,
        date: w.record.date,
        record_id: w.id,
        description: w.record.work_type.clone(),
    }));
    events.push(TimelineEvent {
        event_type: EventType::Harvest,
        date: harvest.record.harvest_date,
        record_id: harvest.id,
        description: format!(
            "{} {}{}",
            harvest.record.crop_name,
            harvest.record.quantity,
            harvest.record.unit.as_deref().unwrap_or("")
        ),
    });
    events.extend(shipments.iter().map(|s| TimelineEvent {
        event_type: EventType::Shipment,
        date: s.record.shipment_date,
        record_id: s.id,
        description: s.record.destination.clone(),
    }));

    // Stable: same date and type keep their collection order. Undated events go last.
    events.sort_by_key(|e| (e.date.is_none(), e.date, e.event_type));
    events
}

/// Keep lots whose identifier contains `query`, ignoring case
pub fn filter_by_lot(chains: LotChains, query: &str) -> LotChains {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return chains;
    }
    chains
        .into_iter()
        .filter(|(key, _)| key.to_lowercase().contains(&needle))
        .collect()
}

/// Keep lots with at least one shipment whose destination contains `destination`, ignoring case
pub fn reverse_lookup(chains: LotChains, destination: &str) -> LotChains {
    let needle = destination.trim().to_lowercase();
    if needle.is_empty() {
        return chains;
    }
    chains
        .into_iter()
        .filter(|(_, chain)| {
            chain
                .shipments
                .iter()
                .any(|s| s.record.destination.to_lowercase().contains(&needle))
        })
        .collect()
}
