//! CSV export and import for every record collection
//!
//! Exports are UTF-8 with a leading BOM so spreadsheet software picks the
//! right encoding. Imports accept either the Japanese label or the JSON key
//! as the header cell. Rows that fail are reported individually; the rest
//! are imported.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use shared::{
    normalize_date, Document, Fertilizer, FertilizerUse, Field, Group, Harvest, Pesticide,
    PesticideUse, Record, RecordError, Seed, Shipment, Training, Visitor, WorkLog, Worker,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Scope;

use super::RecordService;

pub const UTF8_BOM: &str = "\u{feff}";

/// Separator for list-valued cells
const LIST_SEPARATOR: char = ';';

/// How a cell is parsed on import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Integer,
    Date,
    Bool,
    List,
    Id,
}

/// One CSV column bound to a record key
#[derive(Debug, Clone, Copy)]
pub struct CsvColumn {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

const fn col(key: &'static str, label: &'static str, kind: ColumnKind) -> CsvColumn {
    CsvColumn {
        key,
        label,
        kind,
        required: false,
    }
}

const fn req(key: &'static str, label: &'static str, kind: ColumnKind) -> CsvColumn {
    CsvColumn {
        key,
        label,
        kind,
        required: true,
    }
}

use ColumnKind::{Bool, Date, Id, Integer, List, Number, Text};

/// Column layout of a record type's CSV form
pub trait CsvSchema: Record {
    const COLUMNS: &'static [CsvColumn];
    /// Download file stem
    const FILE_NAME: &'static str;
}

impl CsvSchema for Field {
    const FILE_NAME: &'static str = "fields";
    const COLUMNS: &'static [CsvColumn] = &[
        req("name", "圃場名", Text),
        col("area", "面積", Number),
        col("location", "所在地", Text),
        col("soilType", "土壌", Text),
        col("currentCrop", "作付作物", Text),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for Seed {
    const FILE_NAME: &'static str = "seeds";
    const COLUMNS: &'static [CsvColumn] = &[
        req("name", "種苗名", Text),
        col("variety", "品種", Text),
        col("supplier", "購入先", Text),
        col("purchaseDate", "購入日", Date),
        col("lotNumber", "ロット番号", Text),
        col("quantity", "数量", Number),
        col("unit", "単位", Text),
        col("treated", "消毒済み", Bool),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for Fertilizer {
    const FILE_NAME: &'static str = "fertilizers";
    const COLUMNS: &'static [CsvColumn] = &[
        req("name", "肥料名", Text),
        col("manufacturer", "メーカー", Text),
        col("fertilizerType", "種類", Text),
        col("components", "成分", Text),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for Pesticide {
    const FILE_NAME: &'static str = "pesticides";
    const COLUMNS: &'static [CsvColumn] = &[
        req("name", "農薬名", Text),
        col("registrationNumber", "登録番号", Text),
        col("activeIngredient", "有効成分", Text),
        col("targetCrops", "適用作物", Text),
        col("targetPests", "適用病害虫", Text),
        col("preHarvestIntervalDays", "収穫前日数", Integer),
        col("maxApplications", "使用回数上限", Integer),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for PesticideUse {
    const FILE_NAME: &'static str = "pesticide-uses";
    const COLUMNS: &'static [CsvColumn] = &[
        col("date", "使用日", Date),
        col("fieldId", "圃場ID", Id),
        col("fieldName", "圃場名", Text),
        col("pesticideId", "農薬ID", Id),
        req("pesticideName", "農薬名", Text),
        col("amount", "使用量", Number),
        col("unit", "単位", Text),
        col("dilutionRate", "希釈倍率", Number),
        col("method", "散布方法", Text),
        col("applicator", "作業者", Text),
        col("weather", "天候", Text),
        col("temperature", "気温", Number),
        col("wind", "風", Text),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for FertilizerUse {
    const FILE_NAME: &'static str = "fertilizer-uses";
    const COLUMNS: &'static [CsvColumn] = &[
        col("date", "施肥日", Date),
        col("fieldId", "圃場ID", Id),
        col("fieldName", "圃場名", Text),
        col("fertilizerId", "肥料ID", Id),
        req("fertilizerName", "肥料名", Text),
        col("amount", "施肥量", Number),
        col("unit", "単位", Text),
        col("method", "施肥方法", Text),
        col("applicator", "作業者", Text),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for WorkLog {
    const FILE_NAME: &'static str = "work-logs";
    const COLUMNS: &'static [CsvColumn] = &[
        col("date", "作業日", Date),
        col("fieldId", "圃場ID", Id),
        col("fieldName", "圃場名", Text),
        req("workType", "作業内容", Text),
        col("workHours", "作業時間", Number),
        col("harvestAmount", "収穫量", Number),
        col("workerNames", "作業者", List),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for Harvest {
    const FILE_NAME: &'static str = "harvests";
    const COLUMNS: &'static [CsvColumn] = &[
        col("harvestDate", "収穫日", Date),
        col("fieldId", "圃場ID", Id),
        col("fieldName", "圃場名", Text),
        req("cropName", "作物名", Text),
        req("quantity", "出荷量", Number),
        col("unit", "単位", Text),
        col("qualityGrade", "品質", Text),
        col("disposalAmount", "廃棄量", Number),
        col("disposalReason", "廃棄理由", Text),
        col("disposalRate", "廃棄率", Number),
        col("totalAmount", "合計量", Number),
        col("lotNumber", "ロット番号", Text),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for Shipment {
    const FILE_NAME: &'static str = "shipments";
    const COLUMNS: &'static [CsvColumn] = &[
        col("shipmentDate", "出荷日", Date),
        req("destination", "出荷先", Text),
        col("harvestId", "収穫ID", Id),
        col("cropName", "作物名", Text),
        col("fieldName", "圃場名", Text),
        req("quantity", "数量", Number),
        col("unit", "単位", Text),
        col("status", "状態", Text),
        col("lotNumber", "ロット番号", Text),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for Worker {
    const FILE_NAME: &'static str = "workers";
    const COLUMNS: &'static [CsvColumn] = &[
        req("name", "氏名", Text),
        col("role", "役割", Text),
        col("phone", "電話番号", Text),
        col("email", "メール", Text),
        col("active", "在籍", Bool),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for Group {
    const FILE_NAME: &'static str = "groups";
    const COLUMNS: &'static [CsvColumn] = &[
        req("name", "グループ名", Text),
        col("description", "説明", Text),
        col("memberIds", "メンバーID", List),
    ];
}

impl CsvSchema for Training {
    const FILE_NAME: &'static str = "trainings";
    const COLUMNS: &'static [CsvColumn] = &[
        req("title", "研修名", Text),
        col("date", "実施日", Date),
        col("trainer", "講師", Text),
        col("attendees", "参加者", List),
        col("content", "内容", Text),
        col("certificateIssued", "修了証発行", Bool),
        col("notes", "備考", Text),
    ];
}

impl CsvSchema for Visitor {
    const FILE_NAME: &'static str = "visitors";
    const COLUMNS: &'static [CsvColumn] = &[
        col("visitDate", "訪問日", Date),
        req("visitorName", "訪問者名", Text),
        col("company", "会社名", Text),
        col("purpose", "訪問目的", Text),
        col("healthCheck", "体調確認", Bool),
        col("escortedBy", "同行者", Text),
        col("notes", "備考", Text),
    ];
}

/// Outcome of an import: rows written plus one message per rejected row
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub errors: Vec<String>,
}

/// Records parsed from a CSV body, each with its 1-based row number
#[derive(Debug)]
pub struct ParsedRows<T> {
    pub records: Vec<(usize, T)>,
    pub errors: Vec<String>,
}

/// Cells equal to one of these import as `true`
pub fn is_truthy(cell: &str) -> bool {
    matches!(cell.trim(), "true" | "はい" | "○" | "1" | "適合")
}

fn csv_error(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("CSV writer error: {}", e))
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_cell)
            .collect::<Vec<_>>()
            .join(&LIST_SEPARATOR.to_string()),
        Value::Object(_) => value.to_string(),
    }
}

/// Render documents with a label header row
pub fn export_csv<T: CsvSchema>(docs: &[Document<T>]) -> AppResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);

    wtr.write_record(T::COLUMNS.iter().map(|c| c.label))
        .map_err(csv_error)?;

    for doc in docs {
        let value = serde_json::to_value(&doc.record)
            .map_err(|e| AppError::Internal(format!("Failed to encode {}: {}", T::COLLECTION, e)))?;
        let row: Vec<String> = T::COLUMNS
            .iter()
            .map(|c| value.get(c.key).map(render_cell).unwrap_or_default())
            .collect();
        wtr.write_record(&row).map_err(csv_error)?;
    }

    let bytes = wtr.into_inner().map_err(csv_error)?;
    let body = String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
    Ok(format!("{}{}", UTF8_BOM, body))
}

fn label_for<T: CsvSchema>(key: &str) -> &str {
    T::COLUMNS
        .iter()
        .find(|c| c.key == key)
        .map_or(key, |c| c.label)
}

/// Japanese row message with the column label in place of the record key
fn row_message<T: CsvSchema>(row: usize, err: &RecordError) -> String {
    let field = err.field();
    let message = err.message_ja().replacen(field, label_for::<T>(field), 1);
    format!("{}行目: {}", row, message)
}

fn parse_cell(column: &CsvColumn, cell: &str) -> Result<Value, String> {
    match column.kind {
        ColumnKind::Text => Ok(Value::String(cell.to_string())),
        ColumnKind::Number => cell
            .parse::<Decimal>()
            .map(|d| Value::String(d.to_string()))
            .map_err(|_| format!("{}の数値が不正です: {}", column.label, cell)),
        ColumnKind::Integer => cell
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("{}の数値が不正です: {}", column.label, cell)),
        ColumnKind::Date => normalize_date(cell)
            .map(Value::String)
            .ok_or_else(|| format!("{}の日付が不正です: {}", column.label, cell)),
        ColumnKind::Bool => Ok(Value::Bool(is_truthy(cell))),
        ColumnKind::List => Ok(Value::Array(
            cell.split(LIST_SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        )),
        ColumnKind::Id => Uuid::parse_str(cell)
            .map(|id| Value::String(id.to_string()))
            .map_err(|_| format!("{}の形式が不正です: {}", column.label, cell)),
    }
}

/// Parse a CSV body into records without touching the store
pub fn parse_csv<T: CsvSchema>(input: &str) -> AppResult<ParsedRows<T>> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| AppError::Validation {
            field: "file".to_string(),
            message: format!("Unreadable CSV header: {}", e),
            message_ja: "CSVのヘッダーを読み込めません".to_string(),
        })?
        .clone();

    // Header cell index for each column, matched on label or key
    let positions: HashMap<&str, usize> = T::COLUMNS
        .iter()
        .filter_map(|c| {
            headers
                .iter()
                .position(|h| h.trim() == c.label || h.trim() == c.key)
                .map(|i| (c.key, i))
        })
        .collect();

    let mut parsed = ParsedRows {
        records: Vec::new(),
        errors: Vec::new(),
    };

    for (index, result) in rdr.records().enumerate() {
        // Header is row 1
        let row = index + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                parsed.errors.push(format!("{}行目: CSVの形式が不正です ({})", row, e));
                continue;
            }
        };

        match build_record::<T>(&positions, &record) {
            Ok(mut value) => {
                value.normalize();
                match value.validate() {
                    Ok(()) => parsed.records.push((row, value)),
                    Err(err) => parsed.errors.push(row_message::<T>(row, &err)),
                }
            }
            Err(message) => parsed.errors.push(format!("{}行目: {}", row, message)),
        }
    }

    Ok(parsed)
}

/// Absent optional cells fall back to the record's serde defaults
fn build_record<T: CsvSchema>(
    positions: &HashMap<&str, usize>,
    record: &csv::StringRecord,
) -> Result<T, String> {
    let mut object = Map::new();

    for column in T::COLUMNS {
        let cell = positions
            .get(column.key)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .unwrap_or("");

        if cell.is_empty() {
            if column.required {
                return Err(format!("{}は必須です", column.label));
            }
            continue;
        }
        object.insert(column.key.to_string(), parse_cell(column, cell)?);
    }

    serde_json::from_value(Value::Object(object)).map_err(|e| format!("値が不正です ({})", e))
}

/// Parse and insert every valid row; store failures abort the import
pub async fn import_csv<T: CsvSchema>(
    service: &RecordService<T>,
    scope: &Scope,
    input: &str,
) -> AppResult<ImportSummary> {
    let parsed = parse_csv::<T>(input)?;
    let mut summary = ImportSummary {
        imported: 0,
        errors: parsed.errors,
    };

    for (row, record) in parsed.records {
        match service.create(scope, record).await {
            Ok(_) => summary.imported += 1,
            Err(AppError::Validation { message_ja, .. }) => {
                summary.errors.push(format!("{}行目: {}", row, message_ja))
            }
            Err(e) => return Err(e),
        }
    }
    summary.errors.sort_by_key(|m| row_number(m));

    tracing::info!(
        collection = %T::COLLECTION,
        imported = summary.imported,
        rejected = summary.errors.len(),
        "CSV import finished"
    );
    Ok(summary)
}

fn row_number(message: &str) -> usize {
    message
        .split('行')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}
