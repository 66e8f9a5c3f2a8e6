//! Grouped harvest, work and usage analytics
//!
//! Everything here is a pure function of already-fetched records. All
//! quantities are `Decimal`, so a ratio can never be `NaN` or infinite;
//! zero denominators are answered with zero instead.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{FertilizerUse, Harvest, PesticideUse, WorkLog};
use crate::types::month_key;

const UNASSIGNED: &str = "(未設定)";

fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// `disposal / (quantity + disposal) * 100`, one decimal, 0 when nothing was harvested
pub fn disposal_rate(quantity: Decimal, disposal: Decimal) -> Decimal {
    let total = quantity + disposal;
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round(disposal / total * Decimal::ONE_HUNDRED, 1)
}

/// Harvest per work hour, 0 when no hours were logged
pub fn efficiency(harvest: Decimal, work_hours: Decimal) -> Decimal {
    if work_hours.is_zero() {
        return Decimal::ZERO;
    }
    round(harvest / work_hours, 2)
}

/// Month-over-month growth in percent, 0 when the previous value is 0
pub fn growth_rate(latest: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    round((latest - previous) / previous * Decimal::ONE_HUNDRED, 1)
}

/// Mean of the last `window` values
pub fn moving_average(values: &[Decimal], window: usize) -> Option<Decimal> {
    if values.is_empty() || window == 0 {
        return None;
    }
    let tail = &values[values.len().saturating_sub(window)..];
    let sum: Decimal = tail.iter().sum();
    Some(round(sum / Decimal::from(tail.len()), 2))
}

/// Running sum and count for one group
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotal {
    pub total: Decimal,
    pub count: u32,
}

impl GroupTotal {
    pub fn add(&mut self, value: Decimal) {
        self.total += value;
        self.count += 1;
    }

    pub fn average(&self) -> Decimal {
        if self.count == 0 {
            return Decimal::ZERO;
        }
        round(self.total / Decimal::from(self.count), 2)
    }
}

/// Harvest and work totals grouped by crop, field and month
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarvestAnalytics {
    pub total_quantity: Decimal,
    pub total_disposal: Decimal,
    pub total_work_hours: Decimal,
    pub overall_efficiency: Decimal,
    pub by_crop: BTreeMap<String, GroupTotal>,
    pub by_field: BTreeMap<String, GroupTotal>,
    pub by_month: BTreeMap<String, GroupTotal>,
    pub work_hours_by_field: BTreeMap<String, GroupTotal>,
    pub efficiency_by_field: BTreeMap<String, Decimal>,
}

/// Reduce harvests and work logs into grouped summaries
pub fn summarize_harvests<'a, H, W>(harvests: H, work_logs: W) -> HarvestAnalytics
where
    H: IntoIterator<Item = &'a Harvest>,
    W: IntoIterator<Item = &'a WorkLog>,
{
    let mut out = HarvestAnalytics::default();

    for harvest in harvests {
        out.total_quantity += harvest.quantity;
        out.total_disposal += harvest.disposal_amount;

        let crop = harvest.crop_name.trim();
        let crop = if crop.is_empty() { UNASSIGNED } else { crop };
        out.by_crop.entry(crop.to_string()).or_default().add(harvest.quantity);
        out.by_field
            .entry(harvest.field_ref().display_name())
            .or_default()
            .add(harvest.quantity);
        if let Some(date) = harvest.harvest_date {
            out.by_month.entry(month_key(date)).or_default().add(harvest.quantity);
        }
    }

    for log in work_logs {
        out.total_work_hours += log.work_hours;
        out.work_hours_by_field
            .entry(log.field_ref().display_name())
            .or_default()
            .add(log.work_hours);
    }

    let fields: BTreeSet<&String> = out.by_field.keys().chain(out.work_hours_by_field.keys()).collect();
    out.efficiency_by_field = fields
        .into_iter()
        .map(|field| {
            let harvested = out.by_field.get(field).map_or(Decimal::ZERO, |g| g.total);
            let hours = out.work_hours_by_field.get(field).map_or(Decimal::ZERO, |g| g.total);
            (field.clone(), efficiency(harvested, hours))
        })
        .collect();
    out.overall_efficiency = efficiency(out.total_quantity, out.total_work_hours);

    out
}

/// One month of harvest and work totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    /// `yyyy-MM`
    pub month: String,
    pub harvest_total: Decimal,
    pub harvest_count: u32,
    pub work_hours: Decimal,
    pub efficiency: Decimal,
}

impl MonthlyPoint {
    pub fn from_records<'a, H, W>(month: String, harvests: H, work_logs: W) -> Self
    where
        H: IntoIterator<Item = &'a Harvest>,
        W: IntoIterator<Item = &'a WorkLog>,
    {
        let mut harvest = GroupTotal::default();
        for h in harvests {
            harvest.add(h.quantity);
        }
        let work_hours: Decimal = work_logs.into_iter().map(|w| w.work_hours).sum();
        Self {
            month,
            harvest_total: harvest.total,
            harvest_count: harvest.count,
            work_hours,
            efficiency: efficiency(harvest.total, work_hours),
        }
    }
}

/// Monthly series with its derived trend metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    pub points: Vec<MonthlyPoint>,
    /// Growth of harvest total between the last two months
    pub growth_rate: Option<Decimal>,
    /// Mean efficiency over the last three months
    pub moving_average_efficiency: Option<Decimal>,
}

/// Derive trend metrics; both need at least two months of data
pub fn monthly_trend(points: Vec<MonthlyPoint>) -> MonthlyTrend {
    let (growth, moving) = if points.len() >= 2 {
        let latest = &points[points.len() - 1];
        let previous = &points[points.len() - 2];
        let efficiencies: Vec<Decimal> = points.iter().map(|p| p.efficiency).collect();
        (
            Some(growth_rate(latest.harvest_total, previous.harvest_total)),
            moving_average(&efficiencies, 3),
        )
    } else {
        (None, None)
    };

    MonthlyTrend {
        points,
        growth_rate: growth,
        moving_average_efficiency: moving,
    }
}

/// Kind of input applied to a field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum ApplicationKind {
    Pesticide,
    Fertilizer,
}

/// Usage of one product over the report period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductUsage {
    pub kind: ApplicationKind,
    pub product_name: String,
    pub applications: u32,
    pub total_amount: Decimal,
    pub fields: BTreeSet<String>,
    pub last_applied: Option<NaiveDate>,
}

/// Application counts for one field
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldUsage {
    pub pesticide_applications: u32,
    pub fertilizer_applications: u32,
}

/// Pesticide and fertilizer usage grouped by product and by field
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub products: Vec<ProductUsage>,
    pub by_field: BTreeMap<String, FieldUsage>,
}

pub fn summarize_usage<'a, P, F>(pesticides: P, fertilizers: F) -> UsageReport
where
    P: IntoIterator<Item = &'a PesticideUse>,
    F: IntoIterator<Item = &'a FertilizerUse>,
{
    let mut products: BTreeMap<(ApplicationKind, String), ProductUsage> = BTreeMap::new();
    let mut by_field: BTreeMap<String, FieldUsage> = BTreeMap::new();

    let mut record = |kind: ApplicationKind,
                      name: &str,
                      field: String,
                      amount: Option<Decimal>,
                      date: Option<NaiveDate>| {
        let entry = products
            .entry((kind, name.trim().to_string()))
            .or_insert_with(|| ProductUsage {
                kind,
                product_name: name.trim().to_string(),
                applications: 0,
                total_amount: Decimal::ZERO,
                fields: BTreeSet::new(),
                last_applied: None,
            });
        entry.applications += 1;
        entry.total_amount += amount.unwrap_or(Decimal::ZERO);
        entry.fields.insert(field.clone());
        entry.last_applied = entry.last_applied.max(date);

        let usage = by_field.entry(field).or_default();
        match kind {
            ApplicationKind::Pesticide => usage.pesticide_applications += 1,
            ApplicationKind::Fertilizer => usage.fertilizer_applications += 1,
        }
    };

    for p in pesticides {
        record(
            ApplicationKind::Pesticide,
            &p.pesticide_name,
            p.field_ref().display_name(),
            p.amount,
            p.date,
        );
    }
    for f in fertilizers {
        record(
            ApplicationKind::Fertilizer,
            &f.fertilizer_name,
            f.field_ref().display_name(),
            f.amount,
            f.date,
        );
    }

    UsageReport {
        products: products.into_values().collect(),
        by_field,
    }
}

/// Disposal totals grouped by reason
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisposalSummary {
    pub total_quantity: Decimal,
    pub total_disposal: Decimal,
    pub disposal_rate: Decimal,
    pub by_reason: BTreeMap<String, GroupTotal>,
}

pub fn summarize_disposal<'a, H>(harvests: H) -> DisposalSummary
where
    H: IntoIterator<Item = &'a Harvest>,
{
    let mut out = DisposalSummary::default();
    for h in harvests {
        out.total_quantity += h.quantity;
        out.total_disposal += h.disposal_amount;
        if h.disposal_amount > Decimal::ZERO {
            let reason = h
                .disposal_reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or("(未記入)");
            out.by_reason.entry(reason.to_string()).or_default().add(h.disposal_amount);
        }
    }
    out.disposal_rate = disposal_rate(out.total_quantity, out.total_disposal);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn harvest(field: &str, crop: &str, date: (i32, u32, u32), quantity: i64) -> Harvest {
        Harvest {
            field_name: Some(field.to_string()),
            crop_name: crop.to_string(),
            harvest_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
            quantity: Decimal::from(quantity),
            ..Default::default()
        }
    }

    fn work(field: &str, hours: i64) -> WorkLog {
        WorkLog {
            field_name: Some(field.to_string()),
            work_type: "収穫".to_string(),
            work_hours: Decimal::from(hours),
            ..Default::default()
        }
    }

    #[test]
    fn test_disposal_rate() {
        assert_eq!(disposal_rate(dec("80"), dec("20")), dec("20.0"));
        assert_eq!(disposal_rate(dec("0"), dec("0")), Decimal::ZERO);
        assert_eq!(disposal_rate(dec("0"), dec("5")), dec("100"));
        // 1 / 6 = 16.666.. rounds half away from zero
        assert_eq!(disposal_rate(dec("5"), dec("1")), dec("16.7"));
    }

    #[test]
    fn test_efficiency_zero_hours() {
        assert_eq!(efficiency(dec("100"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(efficiency(dec("90"), dec("9")), dec("10"));
    }

    #[test]
    fn test_growth_rate() {
        assert_eq!(growth_rate(dec("90"), dec("150")), dec("-40.0"));
        assert_eq!(growth_rate(dec("90"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_moving_average() {
        let values = [dec("10"), dec("15"), dec("10"), dec("20")];
        assert_eq!(moving_average(&values, 3), Some(dec("15")));
        assert_eq!(moving_average(&values[..2], 3), Some(dec("12.5")));
        assert_eq!(moving_average(&[], 3), None);
    }

    #[test]
    fn test_summarize_groups_by_crop_field_month() {
        let harvests = [
            harvest("A", "Tomato", (2024, 6, 1), 80),
            harvest("A", "Tomato", (2024, 6, 20), 20),
            harvest("B", "Cucumber", (2024, 7, 2), 50),
        ];
        let logs = [work("A", 10), work("C", 4)];
        let summary = summarize_harvests(&harvests, &logs);

        assert_eq!(summary.total_quantity, dec("150"));
        assert_eq!(summary.by_crop["Tomato"], GroupTotal { total: dec("100"), count: 2 });
        assert_eq!(summary.by_month["2024-06"].total, dec("100"));
        assert_eq!(summary.by_month["2024-07"].count, 1);
        assert_eq!(summary.efficiency_by_field["A"], dec("10"));
        // harvested but no hours logged
        assert_eq!(summary.efficiency_by_field["B"], Decimal::ZERO);
        // hours logged but nothing harvested
        assert_eq!(summary.efficiency_by_field["C"], Decimal::ZERO);
    }

    #[test]
    fn test_monthly_trend_scenario() {
        let points = vec![
            MonthlyPoint::from_records("2024-04".into(), &[harvest("A", "T", (2024, 4, 1), 100)], &[work("A", 10)]),
            MonthlyPoint::from_records("2024-05".into(), &[harvest("A", "T", (2024, 5, 1), 150)], &[work("A", 10)]),
            MonthlyPoint::from_records("2024-06".into(), &[harvest("A", "T", (2024, 6, 1), 90)], &[work("A", 9)]),
        ];
        let trend = monthly_trend(points);
        let efficiencies: Vec<Decimal> = trend.points.iter().map(|p| p.efficiency).collect();
        assert_eq!(efficiencies, vec![dec("10"), dec("15"), dec("10")]);
        assert_eq!(trend.growth_rate, Some(dec("-40.0")));
        assert_eq!(trend.moving_average_efficiency, Some(dec("11.67")));
    }

    #[test]
    fn test_monthly_trend_needs_two_months() {
        let points = vec![MonthlyPoint::from_records("2024-04".into(), &[] as &[Harvest], &[] as &[WorkLog])];
        let trend = monthly_trend(points);
        assert_eq!(trend.growth_rate, None);
        assert_eq!(trend.moving_average_efficiency, None);
    }

    #[test]
    fn test_usage_by_product_and_field() {
        let pesticides = [
            PesticideUse {
                field_name: Some("A".into()),
                pesticide_name: "ダコニール".into(),
                amount: Some(dec("1.5")),
                date: NaiveDate::from_ymd_opt(2024, 5, 1),
                ..Default::default()
            },
            PesticideUse {
                field_name: Some("B".into()),
                pesticide_name: "ダコニール".into(),
                amount: Some(dec("2")),
                date: NaiveDate::from_ymd_opt(2024, 5, 9),
                ..Default::default()
            },
        ];
        let fertilizers = [FertilizerUse {
            field_name: Some("A".into()),
            fertilizer_name: "8-8-8".into(),
            ..Default::default()
        }];
        let report = summarize_usage(&pesticides, &fertilizers);

        assert_eq!(report.products.len(), 2);
        let dac = &report.products[0];
        assert_eq!(dac.kind, ApplicationKind::Pesticide);
        assert_eq!(dac.applications, 2);
        assert_eq!(dac.total_amount, dec("3.5"));
        assert_eq!(dac.fields.len(), 2);
        assert_eq!(dac.last_applied, NaiveDate::from_ymd_opt(2024, 5, 9));
        assert_eq!(report.by_field["A"].pesticide_applications, 1);
        assert_eq!(report.by_field["A"].fertilizer_applications, 1);
    }

    #[test]
    fn test_disposal_summary() {
        let mut a = harvest("A", "Tomato", (2024, 6, 1), 80);
        a.disposal_amount = dec("20");
        a.disposal_reason = Some("割れ".into());
        let mut b = harvest("A", "Tomato", (2024, 6, 2), 100);
        b.disposal_amount = dec("0");
        let summary = summarize_disposal(&[a, b]);
        assert_eq!(summary.total_disposal, dec("20"));
        assert_eq!(summary.disposal_rate, dec("10.0"));
        assert_eq!(summary.by_reason.len(), 1);
        assert_eq!(summary.by_reason["割れ"].total, dec("20"));
    }
}
