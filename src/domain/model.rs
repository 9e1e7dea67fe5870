use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 一筆售票交易（CSV 的一列）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub payment_date: NaiveDateTime,
    pub order_total: f64,
    pub ticket_id: String,
    pub ticket_type: String,
}

/// 載入後即不可變的交易集合，保留檔案中的原始順序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<Transaction>,
}

impl Dataset {
    pub fn new(records: Vec<Transaction>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.records.iter()
    }

    pub fn min_payment_date(&self) -> Option<NaiveDateTime> {
        self.records.iter().map(|r| r.payment_date).min()
    }

    pub fn max_payment_date(&self) -> Option<NaiveDateTime> {
        self.records.iter().map(|r| r.payment_date).max()
    }

    pub fn total_sales(&self) -> f64 {
        self.records.iter().map(|r| r.order_total).sum()
    }
}

impl FromIterator<Transaction> for Dataset {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increased,
    Decreased,
    Flat,
}

impl Trend {
    pub fn between(current: f64, previous: f64) -> Self {
        if current > previous {
            Trend::Increased
        } else if current < previous {
            Trend::Decreased
        } else {
            Trend::Flat
        }
    }

    /// 儀表板顯示用的趨勢符號
    pub fn glyph(&self) -> &'static str {
        match self {
            Trend::Increased => "🟢 ▲",
            Trend::Decreased => "🔴 ▼",
            Trend::Flat => "⚪ ▬",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub trend: Trend,
    pub sales: f64,
    pub tickets: usize,
    pub avg_price: f64,
}

impl WindowSummary {
    pub fn empty() -> Self {
        Self {
            trend: Trend::Flat,
            sales: 0.0,
            tickets: 0,
            avg_price: 0.0,
        }
    }
}

/// 平均票價；張數為零時定義為 0
pub fn average_price(total: f64, count: usize) -> f64 {
    if count > 0 {
        total / count as f64
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    /// 分組鍵：日=當天、週=該週星期一、月=當月最後一天、年=1 月 1 日
    pub period: NaiveDate,
    pub label: String,
    pub order_total: f64,
    pub ticket_count: usize,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketTypeRow {
    pub ticket_type: String,
    pub ticket_count: usize,
    pub order_total: f64,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub first_day: i64,
    pub last_day: i64,
    pub end: NaiveDateTime,
    pub summary: WindowSummary,
}

impl BlockSummary {
    pub fn label(&self) -> String {
        format!("Days {}-{}", self.first_day, self.last_day)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSummary {
    pub window_days: i64,
    pub summary: WindowSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportPeriod {
    Day,
    Week,
    Month,
    Year,
    /// 未指定的邊界取資料集中最早／最晚的付款日
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl ReportPeriod {
    pub fn name(&self) -> &'static str {
        match self {
            ReportPeriod::Day => "day",
            ReportPeriod::Week => "week",
            ReportPeriod::Month => "month",
            ReportPeriod::Year => "year",
            ReportPeriod::Custom { .. } => "custom",
        }
    }
}

/// 報表設定（摘要視窗、區塊、明細期間與基準時間）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub windows: Vec<i64>,
    pub block_days: i64,
    pub block_count: usize,
    pub period: ReportPeriod,
    pub as_of: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub as_of: NaiveDateTime,
    pub record_count: usize,
    pub summaries: Vec<LabeledSummary>,
    pub blocks: Vec<BlockSummary>,
    pub period: ReportPeriod,
    pub breakdown: Vec<BreakdownRow>,
    pub ticket_types: Vec<TicketTypeRow>,
}
