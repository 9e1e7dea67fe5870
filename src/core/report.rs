use crate::core::aggregate::{
    custom_range_breakdown, period_breakdown, rolling_blocks, ticket_type_breakdown, window_summary,
};
use crate::domain::model::{
    BreakdownRow, DashboardReport, Dataset, Granularity, LabeledSummary, ReportPeriod,
    ReportSettings, TicketTypeRow,
};
use crate::utils::error::{EtlError, Result};
use std::fmt::Write;

/// 由資料集與報表設定產生完整的儀表板報表
pub fn build_report(dataset: &Dataset, settings: &ReportSettings) -> Result<DashboardReport> {
    let summaries = settings
        .windows
        .iter()
        .map(|&days| {
            window_summary(dataset, days, Some(settings.as_of)).map(|summary| LabeledSummary {
                window_days: days,
                summary,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let blocks = rolling_blocks(dataset, settings.block_days, settings.block_count, settings.as_of)?;

    let period = resolve_period(dataset, settings.period);
    let breakdown = match period {
        ReportPeriod::Day => period_breakdown(dataset, Granularity::Day),
        ReportPeriod::Week => period_breakdown(dataset, Granularity::Week),
        ReportPeriod::Month => period_breakdown(dataset, Granularity::Month),
        ReportPeriod::Year => period_breakdown(dataset, Granularity::Year),
        ReportPeriod::Custom {
            start: Some(start),
            end: Some(end),
        } => custom_range_breakdown(dataset, start, end),
        // 空資料集無法推得預設區間
        ReportPeriod::Custom { .. } => Vec::new(),
    };

    tracing::debug!(
        "Built report: {} windows, {} blocks, {} {} rows",
        summaries.len(),
        blocks.len(),
        breakdown.len(),
        settings.period.name()
    );

    Ok(DashboardReport {
        as_of: settings.as_of,
        record_count: dataset.len(),
        summaries,
        blocks,
        period,
        breakdown,
        ticket_types: ticket_type_breakdown(dataset),
    })
}

/// 自訂區間未指定的邊界以資料集的首末付款日補上
fn resolve_period(dataset: &Dataset, period: ReportPeriod) -> ReportPeriod {
    match period {
        ReportPeriod::Custom { start, end } => ReportPeriod::Custom {
            start: start.or_else(|| dataset.min_payment_date().map(|d| d.date())),
            end: end.or_else(|| dataset.max_payment_date().map(|d| d.date())),
        },
        other => other,
    }
}

/// 明細表輸出為 CSV/TSV（依分隔字元）
pub fn breakdown_table(rows: &[BreakdownRow], delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(["period", "label", "order_total", "ticket_count", "avg_price"])?;
    for row in rows {
        writer.write_record([
            row.period.format("%Y-%m-%d").to_string(),
            row.label.clone(),
            row.order_total.to_string(),
            row.ticket_count.to_string(),
            row.avg_price.to_string(),
        ])?;
    }

    into_string(writer)
}

pub fn ticket_type_table(rows: &[TicketTypeRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(["ticket_type", "ticket_count", "order_total", "share"])?;
    for row in rows {
        writer.write_record([
            row.ticket_type.clone(),
            row.ticket_count.to_string(),
            row.order_total.to_string(),
            row.share.to_string(),
        ])?;
    }

    into_string(writer)
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| EtlError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// 主控台文字摘要
pub fn render_text(report: &DashboardReport) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Ticket sales as of {} ({} transactions)",
        report.as_of.format("%Y-%m-%d %H:%M"),
        report.record_count
    );

    out.push_str("\nSummary\n");
    for item in &report.summaries {
        let s = &item.summary;
        let _ = writeln!(
            out,
            "  Last {} days: sales {} {:.2} | tickets {} | avg price {:.2}",
            item.window_days,
            s.trend.glyph(),
            s.sales,
            s.tickets,
            s.avg_price
        );
    }

    if !report.blocks.is_empty() {
        out.push_str("\nBlock breakdown\n");
        for block in &report.blocks {
            let s = &block.summary;
            let _ = writeln!(
                out,
                "  {}: sales {:.2} | tickets {} | avg price {:.2}",
                block.label(),
                s.sales,
                s.tickets,
                s.avg_price
            );
        }
    }

    let _ = writeln!(out, "\nDetailed breakdown ({})", report.period.name());
    if report.breakdown.is_empty() {
        out.push_str("  (no sales)\n");
    }
    for row in &report.breakdown {
        let _ = writeln!(
            out,
            "  {:<10} sales {:>12.2} | tickets {:>6} | avg price {:.2}",
            row.label, row.order_total, row.ticket_count, row.avg_price
        );
    }

    if !report.ticket_types.is_empty() {
        out.push_str("\nTicket types\n");
        for row in &report.ticket_types {
            let _ = writeln!(
                out,
                "  {}: {} tickets ({:.1}%) | sales {:.2}",
                row.ticket_type,
                row.ticket_count,
                row.share * 100.0,
                row.order_total
            );
        }
    }

    out
}
