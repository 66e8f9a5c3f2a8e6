//! WebAssembly module for Farm GAP Records
//!
//! Provides client-side computation for:
//! - Disposal rate, efficiency and trend calculations
//! - Lot traceability chains over already-loaded records
//! - Offline record validation before sync

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use shared::{
    build_chains, filter_by_lot, reverse_lookup, summarize_harvests, Collection, Document,
    Fertilizer, FertilizerUse, Field, Group, Harvest, Pesticide, PesticideUse, Record, Seed,
    Shipment, TraceabilityInput, Training, Visitor, WorkLog, Worker,
};

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Disposal percentage of the total harvested, one decimal
#[wasm_bindgen]
pub fn calculate_disposal_rate(quantity: f64, disposal: f64) -> f64 {
    to_f64(shared::disposal_rate(to_decimal(quantity), to_decimal(disposal)))
}

/// Harvest per work hour, 0 when no hours were logged
#[wasm_bindgen]
pub fn calculate_efficiency(harvest: f64, work_hours: f64) -> f64 {
    to_f64(shared::efficiency(to_decimal(harvest), to_decimal(work_hours)))
}

/// Month-over-month growth in percent
#[wasm_bindgen]
pub fn calculate_growth_rate(latest: f64, previous: f64) -> f64 {
    to_f64(shared::growth_rate(to_decimal(latest), to_decimal(previous)))
}

/// Mean of the last `window` values
#[wasm_bindgen]
pub fn calculate_moving_average(values: Vec<f64>, window: usize) -> Option<f64> {
    let values: Vec<Decimal> = values.into_iter().map(to_decimal).collect();
    shared::moving_average(&values, window).map(to_f64)
}

/// Build lot chains from a JSON `TraceabilityInput`, optionally filtered
#[wasm_bindgen]
pub fn build_traceability(
    input_json: &str,
    lot: Option<String>,
    destination: Option<String>,
) -> Result<String, JsValue> {
    traceability_json(input_json, lot.as_deref(), destination.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Summarize JSON arrays of harvests and work logs
#[wasm_bindgen]
pub fn summarize_harvest_records(harvests_json: &str, work_logs_json: &str) -> Result<String, JsValue> {
    analytics_json(harvests_json, work_logs_json).map_err(|e| JsValue::from_str(&e))
}

/// Validate a record before it is queued for sync; returns the Japanese message on failure
#[wasm_bindgen]
pub fn validate_record(collection: &str, record_json: &str) -> Result<(), JsValue> {
    validate_json(collection, record_json).map_err(|e| JsValue::from_str(&e))
}

fn traceability_json(
    input_json: &str,
    lot: Option<&str>,
    destination: Option<&str>,
) -> Result<String, String> {
    let input: TraceabilityInput =
        serde_json::from_str(input_json).map_err(|e| format!("Invalid traceability JSON: {}", e))?;

    let mut chains = build_chains(&input);
    if let Some(lot) = lot {
        chains = filter_by_lot(chains, lot);
    }
    if let Some(destination) = destination {
        chains = reverse_lookup(chains, destination);
    }
    serde_json::to_string(&chains).map_err(|e| e.to_string())
}

fn analytics_json(harvests_json: &str, work_logs_json: &str) -> Result<String, String> {
    let harvests: Vec<Document<Harvest>> =
        serde_json::from_str(harvests_json).map_err(|e| format!("Invalid harvests JSON: {}", e))?;
    let work_logs: Vec<Document<WorkLog>> = serde_json::from_str(work_logs_json)
        .map_err(|e| format!("Invalid work logs JSON: {}", e))?;

    let analytics = summarize_harvests(
        harvests.iter().map(|d| &d.record),
        work_logs.iter().map(|d| &d.record),
    );
    serde_json::to_string(&analytics).map_err(|e| e.to_string())
}

fn check<T: Record + DeserializeOwned>(record_json: &str) -> Result<(), String> {
    let mut record: T =
        serde_json::from_str(record_json).map_err(|e| format!("Invalid record JSON: {}", e))?;
    record.normalize();
    record.validate().map_err(|e| e.message_ja())
}

fn validate_json(collection: &str, record_json: &str) -> Result<(), String> {
    let collection =
        Collection::parse(collection).ok_or_else(|| format!("Unknown collection: {}", collection))?;
    match collection {
        Collection::Fields => check::<Field>(record_json),
        Collection::Seeds => check::<Seed>(record_json),
        Collection::Fertilizers => check::<Fertilizer>(record_json),
        Collection::Pesticides => check::<Pesticide>(record_json),
        Collection::PesticideUses => check::<PesticideUse>(record_json),
        Collection::FertilizerUses => check::<FertilizerUse>(record_json),
        Collection::WorkLogs => check::<WorkLog>(record_json),
        Collection::Harvests => check::<Harvest>(record_json),
        Collection::Shipments => check::<Shipment>(record_json),
        Collection::Workers => check::<Worker>(record_json),
        Collection::Groups => check::<Group>(record_json),
        Collection::Trainings => check::<Training>(record_json),
        Collection::Visitors => check::<Visitor>(record_json),
    }
}
