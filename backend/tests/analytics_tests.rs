//! Harvest analytics property-based and scenario tests
//!
//! Covers:
//! - disposal rate formula and rounding
//! - efficiency never fails on zero hours
//! - three-month trend scenario

use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::{
    disposal_rate, efficiency, growth_rate, monthly_trend, summarize_disposal,
    summarize_harvests, Harvest, MonthlyPoint, WorkLog,
};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Quantities from 0.0 to 10000.0
fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (0..=100_000i64).prop_map(|n| Decimal::new(n, 1))
}

fn harvest_strategy() -> impl Strategy<Value = Harvest> {
    (
        quantity_strategy(),
        quantity_strategy(),
        prop::sample::select(vec!["Tomato", "Spinach", ""]),
        prop::option::of(prop::sample::select(vec!["Bruised", "Pests"])),
    )
        .prop_map(|(quantity, disposal, crop, reason)| {
            let mut harvest = Harvest {
                field_name: Some("A".to_string()),
                crop_name: crop.to_string(),
                quantity,
                disposal_amount: disposal,
                disposal_reason: reason.map(String::from),
                ..Default::default()
            };
            harvest.derive_totals();
            harvest
        })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Disposal rate is disposal / (quantity + disposal) * 100 to one decimal, 0 without a total
    #[test]
    fn prop_disposal_rate_formula(quantity in quantity_strategy(), disposal in quantity_strategy()) {
        let rate = disposal_rate(quantity, disposal);
        let total = quantity + disposal;

        if total.is_zero() {
            prop_assert_eq!(rate, Decimal::ZERO);
        } else {
            let expected = (disposal / total * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
            prop_assert_eq!(rate, expected);
            prop_assert!(rate >= Decimal::ZERO && rate <= Decimal::ONE_HUNDRED);
        }
    }

    /// Efficiency is finite for any input and zero when no hours were logged
    #[test]
    fn prop_efficiency_zero_hours(harvest in quantity_strategy(), hours in 0..=100i64) {
        let hours = Decimal::from(hours);
        let value = efficiency(harvest, hours);
        if hours.is_zero() {
            prop_assert_eq!(value, Decimal::ZERO);
        } else {
            prop_assert!(value >= Decimal::ZERO);
        }
    }

    /// Grouped totals add up to the overall total
    #[test]
    fn prop_crop_groups_sum_to_total(harvests in prop::collection::vec(harvest_strategy(), 0..20)) {
        let analytics = summarize_harvests(harvests.iter(), std::iter::empty::<&WorkLog>());
        let grouped: Decimal = analytics.by_crop.values().map(|g| g.total).sum();
        let counted: u32 = analytics.by_crop.values().map(|g| g.count).sum();

        prop_assert_eq!(grouped, analytics.total_quantity);
        prop_assert_eq!(counted as usize, harvests.len());
    }

    /// Disposal reasons account for every disposed amount
    #[test]
    fn prop_disposal_reasons_sum(harvests in prop::collection::vec(harvest_strategy(), 0..20)) {
        let summary = summarize_disposal(harvests.iter());
        let by_reason: Decimal = summary.by_reason.values().map(|g| g.total).sum();
        prop_assert_eq!(by_reason, summary.total_disposal);
    }
}

// ============================================================================
// Scenario Tests
// ============================================================================

fn point(month: &str, harvest: i64, hours: i64) -> MonthlyPoint {
    let harvest = Harvest {
        field_name: Some("A".to_string()),
        crop_name: "Tomato".to_string(),
        quantity: Decimal::from(harvest),
        ..Default::default()
    };
    let log = WorkLog {
        field_name: Some("A".to_string()),
        work_type: "Harvesting".to_string(),
        work_hours: Decimal::from(hours),
        ..Default::default()
    };
    MonthlyPoint::from_records(month.to_string(), [&harvest], [&log])
}

#[test]
fn test_three_month_trend() {
    let trend = monthly_trend(vec![
        point("2024-01", 100, 10),
        point("2024-02", 150, 10),
        point("2024-03", 90, 9),
    ]);

    let efficiencies: Vec<_> = trend.points.iter().map(|p| p.efficiency).collect();
    assert_eq!(
        efficiencies,
        vec![Decimal::from(10), Decimal::from(15), Decimal::from(10)]
    );
    assert_eq!(trend.growth_rate, Some(Decimal::from(-40)));
    assert_eq!(trend.moving_average_efficiency, Some(Decimal::new(1167, 2)));
}

#[test]
fn test_single_month_has_no_trend() {
    let trend = monthly_trend(vec![point("2024-01", 100, 10)]);
    assert!(trend.growth_rate.is_none());
    assert!(trend.moving_average_efficiency.is_none());
}

#[test]
fn test_growth_from_zero_is_zero() {
    assert_eq!(growth_rate(Decimal::from(50), Decimal::ZERO), Decimal::ZERO);
}
