//! Reporting service for analytics and data export
//! Provides harvest analytics, monthly trends, input usage and disposal reports

use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    month_key, monthly_trend, summarize_disposal, summarize_harvests, summarize_usage,
    ApplicationKind, DateRange, DisposalSummary, FertilizerUse, Harvest, HarvestAnalytics,
    MonthlyPoint, MonthlyTrend, PesticideUse, UsageReport, WorkLog,
};

use crate::error::{AppError, AppResult};
use crate::store::{RecordStore, Scope};

use super::cancel::CancelToken;
use super::csv_transfer::UTF8_BOM;
use super::RecordFetcher;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    fetcher: RecordFetcher,
    month_fetch_concurrency: usize,
}

/// One grouped row of the analytics CSV
#[derive(Debug, Serialize)]
pub struct AnalyticsRow {
    pub group: &'static str,
    pub key: String,
    pub total: Decimal,
    pub count: u32,
    pub average: Decimal,
}

/// One product row of the usage CSV
#[derive(Debug, Serialize)]
pub struct UsageRow {
    pub kind: &'static str,
    pub product_name: String,
    pub applications: u32,
    pub total_amount: Decimal,
    pub fields: String,
    pub last_applied: String,
}

impl ReportingService {
    pub fn new(store: Arc<dyn RecordStore>, month_fetch_concurrency: usize) -> Self {
        Self {
            fetcher: RecordFetcher::new(store),
            month_fetch_concurrency: month_fetch_concurrency.max(1),
        }
    }

    /// Harvest and work totals by crop, field and month
    pub async fn get_analytics(&self, scope: &Scope, range: DateRange) -> AppResult<HarvestAnalytics> {
        let (harvests, work_logs) = tokio::try_join!(
            self.fetcher.fetch::<Harvest>(scope, range),
            self.fetcher.fetch::<WorkLog>(scope, range),
        )?;

        Ok(summarize_harvests(
            harvests.iter().map(|d| &d.record),
            work_logs.iter().map(|d| &d.record),
        ))
    }

    /// Month-by-month series with growth and moving average.
    ///
    /// One fetch per calendar month, at most `month_fetch_concurrency` in
    /// flight. Points come back in month order. Fires `AppError::Cancelled`
    /// as soon as the token is cancelled.
    pub async fn get_monthly_trend(
        &self,
        scope: &Scope,
        range: DateRange,
        cancel: &CancelToken,
    ) -> AppResult<MonthlyTrend> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let months = range.months();
        tracing::debug!(months = months.len(), "Fetching monthly analytics");

        let points = stream::iter(months)
            .map(|month| {
                let fetcher = self.fetcher.clone();
                async move {
                    let (harvests, work_logs) = tokio::try_join!(
                        fetcher.fetch::<Harvest>(scope, month),
                        fetcher.fetch::<WorkLog>(scope, month),
                    )?;
                    Ok::<_, AppError>(MonthlyPoint::from_records(
                        month_key(month.start),
                        harvests.iter().map(|d| &d.record),
                        work_logs.iter().map(|d| &d.record),
                    ))
                }
            })
            .buffered(self.month_fetch_concurrency)
            .try_collect::<Vec<_>>();

        let mut cancel = cancel.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Monthly analytics cancelled");
                Err(AppError::Cancelled)
            }
            points = points => Ok(monthly_trend(points?)),
        }
    }

    /// Pesticide and fertilizer usage by product and field
    pub async fn get_usage(&self, scope: &Scope, range: DateRange) -> AppResult<UsageReport> {
        let (pesticides, fertilizers) = tokio::try_join!(
            self.fetcher.fetch::<PesticideUse>(scope, range),
            self.fetcher.fetch::<FertilizerUse>(scope, range),
        )?;

        Ok(summarize_usage(
            pesticides.iter().map(|d| &d.record),
            fertilizers.iter().map(|d| &d.record),
        ))
    }

    /// Disposal totals by reason
    pub async fn get_disposal(&self, scope: &Scope, range: DateRange) -> AppResult<DisposalSummary> {
        let harvests = self.fetcher.fetch::<Harvest>(scope, range).await?;
        Ok(summarize_disposal(harvests.iter().map(|d| &d.record)))
    }

    /// Flatten analytics groups into CSV rows
    pub fn analytics_rows(analytics: &HarvestAnalytics) -> Vec<AnalyticsRow> {
        let groups = [
            ("crop", &analytics.by_crop),
            ("field", &analytics.by_field),
            ("month", &analytics.by_month),
            ("workHoursByField", &analytics.work_hours_by_field),
        ];
        groups
            .into_iter()
            .flat_map(|(group, totals)| {
                totals.iter().map(move |(key, total)| AnalyticsRow {
                    group,
                    key: key.clone(),
                    total: total.total,
                    count: total.count,
                    average: total.average(),
                })
            })
            .collect()
    }

    pub fn usage_rows(usage: &UsageReport) -> Vec<UsageRow> {
        usage
            .products
            .iter()
            .map(|p| UsageRow {
                kind: match p.kind {
                    ApplicationKind::Pesticide => "pesticide",
                    ApplicationKind::Fertilizer => "fertilizer",
                },
                product_name: p.product_name.clone(),
                applications: p.applications,
                total_amount: p.total_amount,
                fields: p.fields.iter().cloned().collect::<Vec<_>>().join(";"),
                last_applied: p
                    .last_applied
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        let csv_data = String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(format!("{}{}", UTF8_BOM, csv_data))
    }
}
