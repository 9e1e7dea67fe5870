use crate::domain::model::{Dataset, Transaction};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::io::Read;

pub const PAYMENT_DATE: &str = "Payment Date";
pub const ORDER_TOTAL: &str = "Order Total";
pub const TICKET_ID: &str = "Ticket ID";
pub const TICKET_TYPE: &str = "Ticket Type";

const REQUIRED_COLUMNS: &[&str] = &[PAYMENT_DATE, ORDER_TOTAL, TICKET_ID, TICKET_TYPE];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// 欄位名稱 → 欄位索引
struct ColumnMap {
    indices: HashMap<String, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let indices = headers
            .iter()
            .enumerate()
            .map(|(i, field)| (field.trim_start_matches('\u{feff}').trim().to_string(), i))
            .collect();
        Self { indices }
    }

    fn require(&self) -> Result<[usize; 4]> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !self.indices.contains_key(**c))
            .map(|c| c.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(EtlError::MissingColumns(missing));
        }

        Ok([
            self.indices[PAYMENT_DATE],
            self.indices[ORDER_TOTAL],
            self.indices[TICKET_ID],
            self.indices[TICKET_TYPE],
        ])
    }
}

/// 從檔案內容解析售票交易；遇到第一筆格式錯誤的資料列即失敗
pub fn parse_transactions(data: &[u8]) -> Result<Dataset> {
    read_transactions(data)
}

pub fn read_transactions<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let [date_idx, total_idx, id_idx, type_idx] = ColumnMap::from_headers(&headers).require()?;

    let mut records = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        // +1 表頭、+1 從 1 起算
        let line = row_idx + 2;
        let record = result?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let payment_date = parse_payment_date(field(date_idx)).ok_or_else(|| EtlError::MalformedRecord {
            line,
            message: format!("invalid {}: {:?}", PAYMENT_DATE, field(date_idx)),
        })?;

        let order_total = parse_order_total(field(total_idx)).ok_or_else(|| EtlError::MalformedRecord {
            line,
            message: format!("invalid {}: {:?}", ORDER_TOTAL, field(total_idx)),
        })?;

        let ticket_id = field(id_idx);
        if ticket_id.is_empty() {
            return Err(EtlError::MalformedRecord {
                line,
                message: format!("empty {}", TICKET_ID),
            });
        }

        let ticket_type = field(type_idx);
        if ticket_type.is_empty() {
            return Err(EtlError::MalformedRecord {
                line,
                message: format!("empty {}", TICKET_TYPE),
            });
        }

        records.push(Transaction {
            payment_date,
            order_total,
            ticket_id: ticket_id.to_string(),
            ticket_type: ticket_type.to_string(),
        });
    }

    tracing::debug!("Parsed {} transactions", records.len());
    Ok(Dataset::new(records))
}

/// 支援常見的日期時間格式；只有日期時視為當天 00:00:00
pub fn parse_payment_date(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// "1,234.50" / "$25" → 金額；負數或非數字回傳 None
pub fn parse_order_total(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}
