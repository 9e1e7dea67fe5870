//! 售票資料的彙總查詢：日期篩選、滾動視窗摘要、期間分組與票種統計。
//!
//! 所有函式皆為純函式，不做 I/O，也不讀取系統時間；基準時間一律由呼叫端傳入。

use crate::domain::model::{
    average_price, BlockSummary, BreakdownRow, Dataset, Granularity, TicketTypeRow, Trend,
    WindowSummary,
};
use crate::utils::error::{EtlError, Result};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

/// 篩選 `[start, end]`（兩端皆包含）內的交易，保留原始順序
pub fn filter_by_date_range(dataset: &Dataset, start: NaiveDateTime, end: NaiveDateTime) -> Dataset {
    dataset
        .iter()
        .filter(|r| r.payment_date >= start && r.payment_date <= end)
        .cloned()
        .collect()
}

/// 計算 `(end - days, end]` 視窗的銷售摘要，並與前一個等長視窗比較趨勢。
///
/// `end` 為 `None` 時取資料集中最晚的付款時間；空資料集回傳全零摘要。
pub fn window_summary(
    dataset: &Dataset,
    window_days: i64,
    end: Option<NaiveDateTime>,
) -> Result<WindowSummary> {
    let span = window_span(window_days)?;

    let Some(end) = end.or_else(|| dataset.max_payment_date()) else {
        return Ok(WindowSummary::empty());
    };

    let start = end
        .checked_sub_signed(span)
        .ok_or(EtlError::InvalidWindow { days: window_days })?;
    let (sales, tickets) = sum_between(dataset, start, end);

    let previous_sales = match start.checked_sub_signed(span) {
        Some(previous_start) => sum_between(dataset, previous_start, start).0,
        None => 0.0,
    };

    Ok(WindowSummary {
        trend: Trend::between(sales, previous_sales),
        sales,
        tickets,
        avg_price: average_price(sales, tickets),
    })
}

/// 連續的等長區塊摘要：第 i 個區塊結束於 `as_of - i * block_days`
pub fn rolling_blocks(
    dataset: &Dataset,
    block_days: i64,
    block_count: usize,
    as_of: NaiveDateTime,
) -> Result<Vec<BlockSummary>> {
    let span = window_span(block_days)?;
    let mut blocks = Vec::with_capacity(block_count);
    let mut end = as_of;

    for i in 0..block_count as i64 {
        // 只在區塊之間往前推，最後一個區塊之後不再計算
        if i > 0 {
            end = end
                .checked_sub_signed(span)
                .ok_or(EtlError::InvalidWindow { days: block_days })?;
        }
        let summary = window_summary(dataset, block_days, Some(end))?;
        blocks.push(BlockSummary {
            first_day: i * block_days + 1,
            last_day: (i + 1) * block_days,
            end,
            summary,
        });
    }

    Ok(blocks)
}

/// 依期間分組，只輸出有資料的分組，依分組鍵遞增排序
pub fn period_breakdown(dataset: &Dataset, granularity: Granularity) -> Vec<BreakdownRow> {
    accumulate(dataset, granularity)
        .into_iter()
        .map(|(key, (total, count))| breakdown_row(key, granularity, total, count))
        .collect()
}

/// 與 `period_breakdown` 相同，但首尾之間沒有資料的分組以零值補齊
pub fn dense_period_breakdown(dataset: &Dataset, granularity: Granularity) -> Vec<BreakdownRow> {
    let buckets = accumulate(dataset, granularity);
    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    let mut key = Some(first);
    while let Some(current) = key.filter(|k| *k <= last) {
        let (total, count) = buckets.get(&current).copied().unwrap_or((0.0, 0));
        rows.push(breakdown_row(current, granularity, total, count));
        key = next_bucket(current, granularity);
    }
    rows
}

/// 自訂日期區間的逐日明細，起訖兩天皆完整包含
pub fn custom_range_breakdown(dataset: &Dataset, start: NaiveDate, end: NaiveDate) -> Vec<BreakdownRow> {
    let filtered = filter_by_date_range(dataset, start.and_time(NaiveTime::MIN), end_of_day(end));
    period_breakdown(&filtered, Granularity::Day)
}

/// 票種分布（圓餅圖資料），依票種名稱排序
pub fn ticket_type_breakdown(dataset: &Dataset) -> Vec<TicketTypeRow> {
    let mut groups: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for record in dataset {
        let entry = groups.entry(record.ticket_type.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.order_total;
    }

    let total = dataset.len();
    groups
        .into_iter()
        .map(|(ticket_type, (count, order_total))| TicketTypeRow {
            ticket_type: ticket_type.to_string(),
            ticket_count: count,
            order_total,
            share: if total > 0 {
                count as f64 / total as f64
            } else {
                0.0
            },
        })
        .collect()
}

/// 分組鍵：日=當天、週=該週星期一、月=當月最後一天、年=1 月 1 日
pub fn bucket_key(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => {
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        Granularity::Month => month_end(date),
        Granularity::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
    }
}

pub fn bucket_label(key: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => key.format("%Y-%m-%d").to_string(),
        Granularity::Week => {
            let iw = key.iso_week();
            format!("{:04}-W{:02}", iw.year(), iw.week())
        }
        Granularity::Month => key.format("%Y-%m").to_string(),
        Granularity::Year => format!("{:04}", key.year()),
    }
}

/// 某日的最後一個瞬間（23:59:59.999999999）
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::days(1) - Duration::nanoseconds(1))
        .unwrap_or(NaiveDateTime::MAX)
}

fn window_span(days: i64) -> Result<Duration> {
    if days <= 0 {
        return Err(EtlError::InvalidWindow { days });
    }
    Duration::try_days(days).ok_or(EtlError::InvalidWindow { days })
}

// (start, end]
fn sum_between(dataset: &Dataset, start: NaiveDateTime, end: NaiveDateTime) -> (f64, usize) {
    dataset
        .iter()
        .filter(|r| r.payment_date > start && r.payment_date <= end)
        .fold((0.0, 0), |(total, count), r| (total + r.order_total, count + 1))
}

fn accumulate(dataset: &Dataset, granularity: Granularity) -> BTreeMap<NaiveDate, (f64, usize)> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for record in dataset {
        let key = bucket_key(record.payment_date.date(), granularity);
        let entry = buckets.entry(key).or_insert((0.0, 0));
        entry.0 += record.order_total;
        entry.1 += 1;
    }
    buckets
}

fn breakdown_row(key: NaiveDate, granularity: Granularity, total: f64, count: usize) -> BreakdownRow {
    BreakdownRow {
        period: key,
        label: bucket_label(key, granularity),
        order_total: total,
        ticket_count: count,
        avg_price: average_price(total, count),
    }
}

fn month_end(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_first| next_first.pred_opt())
        .unwrap_or(date)
}

fn next_bucket(key: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => key.succ_opt(),
        Granularity::Week => key.checked_add_signed(Duration::days(7)),
        Granularity::Month => key.succ_opt().map(month_end),
        Granularity::Year => NaiveDate::from_ymd_opt(key.year() + 1, 1, 1),
    }
}
