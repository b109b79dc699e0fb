//! Dual-axis chart of the ledger: holdings value on the left axis, coin price
//! on the right, both against entry time.

use crate::config::ReportConfig;
use crate::format_fiat;
use crate::ledger::{LedgerEntry, LedgerStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use log::info;
use plotters::prelude::*;
use std::ops::Range;
use std::path::PathBuf;

const BACKGROUND_COLOR: RGBColor = RGBColor(15, 23, 42);
const TEXT_COLOR: RGBColor = RGBColor(226, 232, 240);
const AXIS_COLOR: RGBColor = RGBColor(148, 163, 184);
const VALUE_COLOR: RGBColor = RGBColor(251, 191, 36);
const PRICE_COLOR: RGBColor = RGBColor(96, 165, 250);

/// Informational statistics over the whole ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub count: usize,
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub fiat_min: f64,
    pub fiat_max: f64,
    pub price_min: f64,
    pub price_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    NoData,
    Rendered {
        summary: ReportSummary,
        output_path: PathBuf,
    },
}

impl ReportSummary {
    /// `None` for an empty ledger.
    pub fn from_entries(entries: &[LedgerEntry]) -> Option<Self> {
        let first = entries.first()?;
        let last = entries.last()?;

        let mut summary = Self {
            count: entries.len(),
            first: first.timestamp,
            last: last.timestamp,
            fiat_min: f64::INFINITY,
            fiat_max: f64::NEG_INFINITY,
            price_min: f64::INFINITY,
            price_max: f64::NEG_INFINITY,
        };
        for entry in entries {
            summary.fiat_min = summary.fiat_min.min(entry.fiat_value);
            summary.fiat_max = summary.fiat_max.max(entry.fiat_value);
            summary.price_min = summary.price_min.min(entry.unit_price);
            summary.price_max = summary.price_max.max(entry.unit_price);
        }
        Some(summary)
    }

    pub fn describe(&self, fiat_code: &str) -> String {
        let fiat = fiat_code.to_uppercase();
        format!(
            "Chart statistics:\n  Data points: {}\n  Time span: {} -> {}\n  Value min/max: {} / {} {}\n  Price min/max: {} / {} {}",
            self.count,
            self.first.format("%d.%m.%Y %H:%M"),
            self.last.format("%d.%m.%Y %H:%M"),
            format_fiat(self.fiat_min, 2),
            format_fiat(self.fiat_max, 2),
            fiat,
            format_fiat(self.price_min, 2),
            format_fiat(self.price_max, 2),
            fiat,
        )
    }
}

/// Loads the ledger and renders it, unless there is nothing to show.
pub async fn generate_report<S: LedgerStore + ?Sized>(
    store: &S,
    config: &ReportConfig,
    fiat_code: &str,
) -> Result<ReportOutcome> {
    let entries = store.all_entries_ordered().await?;
    if entries.is_empty() {
        return Ok(ReportOutcome::NoData);
    }

    let summary = render_chart(&entries, config, fiat_code)?;
    info!(
        "Rendered {} entries to {}",
        summary.count,
        config.output_path.display()
    );
    Ok(ReportOutcome::Rendered {
        summary,
        output_path: config.output_path.clone(),
    })
}

fn chart_err<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow::anyhow!("Chart rendering failed: {:?}", e)
}

/// Writes the chart to `config.output_path`, replacing any previous file.
pub fn render_chart(
    entries: &[LedgerEntry],
    config: &ReportConfig,
    fiat_code: &str,
) -> Result<ReportSummary> {
    let summary = ReportSummary::from_entries(entries).context("No ledger entries to render")?;
    let fiat = fiat_code.to_uppercase();
    let time_range = padded_time_range(summary.first, summary.last);
    let fiat_range = padded_range(summary.fiat_min, summary.fiat_max);
    let price_range = padded_range(summary.price_min, summary.price_max);

    if let Some(parent) = config.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create chart directory: {}", parent.display())
            })?;
        }
    }

    let root = SVGBackend::new(&config.output_path, (config.width, config.height))
        .into_drawing_area();
    root.fill(&BACKGROUND_COLOR).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Earnings: {} value & coin price", fiat),
            ("sans-serif", 24).into_font().color(&TEXT_COLOR),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .right_y_label_area_size(90)
        .build_cartesian_2d(time_range.clone(), fiat_range)
        .map_err(chart_err)?
        .set_secondary_coord(time_range, price_range);

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|ts: &DateTime<Utc>| ts.format("%d.%m.%Y").to_string())
        .y_label_formatter(&|v: &f64| format!("{:.2}", v))
        .x_desc("Date")
        .y_desc(format!("Value ({})", fiat))
        .axis_style(AXIS_COLOR)
        .label_style(("sans-serif", 14).into_font().color(&AXIS_COLOR))
        .bold_line_style(AXIS_COLOR.mix(0.2))
        .light_line_style(AXIS_COLOR.mix(0.05))
        .draw()
        .map_err(chart_err)?;

    chart
        .configure_secondary_axes()
        .y_desc(format!("Price ({})", fiat))
        .y_label_formatter(&|v: &f64| format_fiat(*v, 0))
        .axis_style(AXIS_COLOR)
        .label_style(("sans-serif", 14).into_font().color(&PRICE_COLOR))
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(
            entries.iter().map(|e| (e.timestamp, e.fiat_value)),
            VALUE_COLOR.stroke_width(3),
        ))
        .map_err(chart_err)?
        .label(format!("Value of holdings ({})", fiat))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], VALUE_COLOR.stroke_width(3)));
    chart
        .draw_series(
            entries
                .iter()
                .map(|e| Circle::new((e.timestamp, e.fiat_value), 4, VALUE_COLOR.filled())),
        )
        .map_err(chart_err)?;

    chart
        .draw_secondary_series(LineSeries::new(
            entries.iter().map(|e| (e.timestamp, e.unit_price)),
            PRICE_COLOR.stroke_width(3),
        ))
        .map_err(chart_err)?
        .label(format!("Coin price ({})", fiat))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PRICE_COLOR.stroke_width(3)));
    chart
        .draw_secondary_series(
            entries
                .iter()
                .map(|e| TriangleMarker::new((e.timestamp, e.unit_price), 5, PRICE_COLOR.filled())),
        )
        .map_err(chart_err)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", 14).into_font().color(&TEXT_COLOR))
        .background_style(BACKGROUND_COLOR.mix(0.9))
        .border_style(AXIS_COLOR)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(summary)
}

// Plotters cannot map a zero-width range, so single points get some room.
fn padded_range(min: f64, max: f64) -> Range<f64> {
    let span = max - min;
    let pad = if span > 0.0 {
        span * 0.1
    } else if max.abs() > 0.0 {
        max.abs() * 0.1
    } else {
        1.0
    };
    (min - pad)..(max + pad)
}

fn padded_time_range(first: DateTime<Utc>, last: DateTime<Utc>) -> Range<DateTime<Utc>> {
    if last > first {
        first..last
    } else {
        (first - Duration::hours(1))..(last + Duration::hours(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{NewEntry, SqliteLedger};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn entry(id: i64, minute: u32, unit_price: f64, cumulative_units: u64) -> LedgerEntry {
        LedgerEntry {
            id,
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 12, minute, 0).unwrap(),
            earned_units: 1,
            unit_price,
            cumulative_units,
            fiat_value: crate::fiat_value(cumulative_units, unit_price),
        }
    }

    fn report_config(dir: &TempDir) -> ReportConfig {
        ReportConfig {
            output_path: dir.path().join("chart.svg"),
            ..ReportConfig::default()
        }
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(ReportSummary::from_entries(&[]), None);
    }

    #[test]
    fn test_summary_min_max_and_span() {
        let entries = vec![
            entry(1, 0, 50_000.0, 1500),
            entry(2, 5, 60_000.0, 4000),
            entry(3, 30, 45_000.0, 4100),
        ];
        let summary = ReportSummary::from_entries(&entries).unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.first, entries[0].timestamp);
        assert_eq!(summary.last, entries[2].timestamp);
        assert!((summary.fiat_min - 0.75).abs() < 1e-9);
        assert!((summary.fiat_max - 2.4).abs() < 1e-9);
        assert_eq!(summary.price_min, 45_000.0);
        assert_eq!(summary.price_max, 60_000.0);
    }

    #[test]
    fn test_summary_describe() {
        let entries = vec![entry(1, 0, 50_000.0, 1500), entry(2, 5, 60_000.0, 4000)];
        let text = ReportSummary::from_entries(&entries)
            .unwrap()
            .describe("eur");

        assert!(text.contains("Data points: 2"));
        assert!(text.contains("Time span: 16.10.2026 12:00 -> 16.10.2026 12:05"));
        assert!(text.contains("Value min/max: 0.75 / 2.40 EUR"));
        assert!(text.contains("Price min/max: 50,000.00 / 60,000.00 EUR"));
    }

    #[test]
    fn test_padded_range() {
        let range = padded_range(10.0, 20.0);
        assert_eq!(range, 9.0..21.0);

        let flat = padded_range(0.75, 0.75);
        assert!(flat.start < 0.75 && flat.end > 0.75);

        let zero = padded_range(0.0, 0.0);
        assert_eq!(zero, -1.0..1.0);
    }

    #[test]
    fn test_padded_time_range_single_point() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let range = padded_time_range(ts, ts);
        assert_eq!(range.start, ts - Duration::hours(1));
        assert_eq!(range.end, ts + Duration::hours(1));

        let later = ts + Duration::minutes(5);
        assert_eq!(padded_time_range(ts, later), ts..later);
    }

    #[test]
    fn test_render_chart_writes_svg() {
        let dir = TempDir::new().unwrap();
        let config = report_config(&dir);
        let entries = vec![entry(1, 0, 50_000.0, 1500), entry(2, 5, 60_000.0, 4000)];

        let summary = render_chart(&entries, &config, "eur").unwrap();

        assert_eq!(summary.count, 2);
        let svg = std::fs::read_to_string(&config.output_path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Value of holdings (EUR)"));
        assert!(svg.contains("Coin price (EUR)"));
    }

    #[test]
    fn test_render_chart_single_entry() {
        let dir = TempDir::new().unwrap();
        let config = report_config(&dir);

        render_chart(&[entry(1, 0, 50_000.0, 1500)], &config, "eur").unwrap();
        assert!(config.output_path.exists());
    }

    #[test]
    fn test_render_chart_overwrites_previous_file() {
        let dir = TempDir::new().unwrap();
        let config = report_config(&dir);
        std::fs::write(&config.output_path, "stale").unwrap();

        render_chart(&[entry(1, 0, 50_000.0, 1500)], &config, "usd").unwrap();

        let svg = std::fs::read_to_string(&config.output_path).unwrap();
        assert!(!svg.starts_with("stale"));
        assert!(svg.contains("USD"));
    }

    #[test]
    fn test_render_chart_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let config = ReportConfig {
            output_path: dir.path().join("reports").join("chart.svg"),
            ..ReportConfig::default()
        };

        render_chart(&[entry(1, 0, 50_000.0, 1500)], &config, "eur").unwrap();
        assert!(config.output_path.exists());
    }

    #[test]
    fn test_render_chart_empty_is_error() {
        let dir = TempDir::new().unwrap();
        let config = report_config(&dir);

        assert!(render_chart(&[], &config, "eur").is_err());
        assert!(!config.output_path.exists());
    }

    #[tokio::test]
    async fn test_generate_report_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let ledger = SqliteLedger::open(&dir.path().join("ledger.db"))
            .await
            .unwrap();
        ledger.initialize().await.unwrap();
        let config = report_config(&dir);

        let outcome = generate_report(&ledger, &config, "eur").await.unwrap();

        assert_eq!(outcome, ReportOutcome::NoData);
        assert!(!config.output_path.exists());
    }

    #[tokio::test]
    async fn test_generate_report_with_entries() {
        let dir = TempDir::new().unwrap();
        let ledger = SqliteLedger::open(&dir.path().join("ledger.db"))
            .await
            .unwrap();
        ledger.initialize().await.unwrap();
        for (earned, price, total) in [(1500, 50_000.0, 1500), (2500, 60_000.0, 4000)] {
            ledger
                .append(&NewEntry {
                    earned_units: earned,
                    unit_price: price,
                    cumulative_units: total,
                    fiat_value: crate::fiat_value(total, price),
                })
                .await
                .unwrap();
        }
        let config = report_config(&dir);

        let outcome = generate_report(&ledger, &config, "eur").await.unwrap();

        match outcome {
            ReportOutcome::Rendered {
                summary,
                output_path,
            } => {
                assert_eq!(summary.count, 2);
                assert_eq!(summary.price_max, 60_000.0);
                assert_eq!(output_path, config.output_path);
                assert!(output_path.exists());
            }
            ReportOutcome::NoData => panic!("expected a rendered report"),
        }
    }
}
