//! SVG bar charts
//!
//! Two grouped bar charts are produced per run: mean execution time on a
//! linear axis and mean peak memory on a logarithmic axis. Each operation
//! (Sign, Verify) is a group with one bar per algorithm, and every bar carries
//! its value as a label.

use crate::aggregate::AggregateReport;
use crate::error::{BenchError, Result};
use crate::types::{AlgorithmSlot, Metric, Operation, SeriesKey};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const EXECUTION_TIME_CHART: &str = "execution_time.svg";
pub const MEMORY_USAGE_CHART: &str = "memory_usage.svg";

const CLASSICAL_COLOR: &str = "#1f77b4";
const POST_QUANTUM_COLOR: &str = "#ff7f0e";

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 100.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 80.0;
/// Bar width as a fraction of one category slot
const BAR_WIDTH: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Linear,
    Log,
}

/// One coloured bar per category
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub label: String,
    pub color: String,
    pub values: Vec<f64>,
}

/// Grouped bar chart
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
    pub scale: Scale,
    /// Formats bar annotations and axis ticks
    pub format_value: fn(f64) -> String,
}

/// Value range of the y axis, in axis units (log10 for [`Scale::Log`])
struct Axis {
    scale: Scale,
    low: f64,
    high: f64,
}

impl Axis {
    fn fit(scale: Scale, values: &[f64]) -> Self {
        match scale {
            Scale::Linear => {
                let max = values.iter().copied().fold(0.0_f64, f64::max);
                let high = if max > 0.0 { max * 1.15 } else { 1.0 };
                Self {
                    scale,
                    low: 0.0,
                    high,
                }
            }
            Scale::Log => {
                let positive = values.iter().copied().filter(|v| *v > 0.0);
                let min = positive.clone().fold(f64::INFINITY, f64::min);
                let max = positive.fold(0.0_f64, f64::max);
                if max <= 0.0 {
                    return Self {
                        scale,
                        low: 0.0,
                        high: 1.0,
                    };
                }
                let low = min.log10().floor();
                let mut high = (max * 1.5).log10().ceil();
                if high <= low {
                    high = low + 1.0;
                }
                Self { scale, low, high }
            }
        }
    }

    /// Position of `value` in `[0, 1]`
    fn fraction(&self, value: f64) -> f64 {
        let v = match self.scale {
            Scale::Linear => value,
            Scale::Log if value > 0.0 => value.log10(),
            Scale::Log => self.low,
        };
        ((v - self.low) / (self.high - self.low)).clamp(0.0, 1.0)
    }

    fn ticks(&self) -> Vec<f64> {
        match self.scale {
            Scale::Linear => (0..=5)
                .map(|i| self.low + (self.high - self.low) * i as f64 / 5.0)
                .collect(),
            Scale::Log => {
                let mut ticks = Vec::new();
                let mut exponent = self.low;
                while exponent <= self.high {
                    ticks.push(10f64.powf(exponent));
                    exponent += 1.0;
                }
                ticks
            }
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Seconds with 6 decimals
pub fn format_seconds(value: f64) -> String {
    format!("{:.6}", value)
}

/// Whole bytes with thousands separators, e.g. `1,234,567`
pub fn format_thousands(value: f64) -> String {
    let digits = (value.max(0.0).round() as u64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

impl BarChart {
    pub fn render(&self) -> Result<String> {
        if self.series.iter().any(|s| s.values.len() != self.categories.len()) {
            return Err(BenchError::Chart(format!(
                "every series needs {} values",
                self.categories.len()
            )));
        }

        let all_values: Vec<f64> = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .collect();
        let axis = Axis::fit(self.scale, &all_values);

        let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let bottom = MARGIN_TOP + plot_height;
        let y_of = |value: f64| bottom - axis.fraction(value) * plot_height;

        let mut svg = String::new();
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
            w = WIDTH,
            h = HEIGHT
        )?;
        writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
        writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle" font-size="20">{}</text>"#,
            WIDTH / 2.0,
            MARGIN_TOP / 2.0,
            escape_xml(&self.title)
        )?;

        // Grid and tick labels
        for tick in axis.ticks() {
            let y = y_of(tick);
            writeln!(
                svg,
                r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#cccccc" stroke-dasharray="4 4"/>"##,
                MARGIN_LEFT,
                y,
                MARGIN_LEFT + plot_width,
                y
            )?;
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11">{}</text>"#,
                MARGIN_LEFT - 8.0,
                y + 4.0,
                escape_xml(&(self.format_value)(tick))
            )?;
        }

        // Axes
        writeln!(
            svg,
            r#"<line x1="{l:.1}" y1="{t:.1}" x2="{l:.1}" y2="{b:.1}" stroke="black"/>"#,
            l = MARGIN_LEFT,
            t = MARGIN_TOP,
            b = bottom
        )?;
        writeln!(
            svg,
            r#"<line x1="{:.1}" y1="{b:.1}" x2="{:.1}" y2="{b:.1}" stroke="black"/>"#,
            MARGIN_LEFT,
            MARGIN_LEFT + plot_width,
            b = bottom
        )?;
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14">{}</text>"#,
            MARGIN_LEFT + plot_width / 2.0,
            HEIGHT - 20.0,
            escape_xml(&self.x_label)
        )?;
        writeln!(
            svg,
            r#"<text x="20" y="{y:.1}" text-anchor="middle" font-size="14" transform="rotate(-90 20 {y:.1})">{}</text>"#,
            escape_xml(&self.y_label),
            y = MARGIN_TOP + plot_height / 2.0
        )?;

        // Bars
        let slot_width = plot_width / self.categories.len().max(1) as f64;
        let bar_width = slot_width * BAR_WIDTH;
        let center_offset = (self.series.len() as f64 - 1.0) / 2.0;

        for (i, category) in self.categories.iter().enumerate() {
            let center = MARGIN_LEFT + (i as f64 + 0.5) * slot_width;
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13">{}</text>"#,
                center,
                bottom + 20.0,
                escape_xml(category)
            )?;

            for (j, series) in self.series.iter().enumerate() {
                let value = series.values[i];
                let x = center + (j as f64 - center_offset) * bar_width - bar_width / 2.0;
                let y = y_of(value);
                writeln!(
                    svg,
                    r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                    x,
                    y,
                    bar_width,
                    bottom - y,
                    series.color
                )?;
                writeln!(
                    svg,
                    r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11">{}</text>"#,
                    x + bar_width / 2.0,
                    y - 5.0,
                    escape_xml(&(self.format_value)(value))
                )?;
            }
        }

        // Legend
        let legend_x = WIDTH - MARGIN_RIGHT - 140.0;
        for (j, series) in self.series.iter().enumerate() {
            let y = MARGIN_TOP + 10.0 + j as f64 * 22.0;
            writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="14" height="14" fill="{}"/>"#,
                legend_x,
                y,
                series.color
            )?;
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="13">{}</text>"#,
                legend_x + 20.0,
                y + 12.0,
                escape_xml(&series.label)
            )?;
        }

        writeln!(svg, "</svg>")?;
        Ok(svg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()?)?;
        Ok(())
    }
}

fn grouped_chart(report: &AggregateReport, metric: Metric) -> BarChart {
    let series = AlgorithmSlot::ALL
        .into_iter()
        .map(|algorithm| BarSeries {
            label: algorithm.label().to_string(),
            color: match algorithm {
                AlgorithmSlot::Classical => CLASSICAL_COLOR,
                AlgorithmSlot::PostQuantum => POST_QUANTUM_COLOR,
            }
            .to_string(),
            values: Operation::ALL
                .into_iter()
                .map(|op| report.mean(&SeriesKey::new(algorithm, op, metric)))
                .collect(),
        })
        .collect();

    let (title, y_label, scale, format_value) = match metric {
        Metric::Time => (
            "Execution Time Comparison",
            "Time (seconds)",
            Scale::Linear,
            format_seconds as fn(f64) -> String,
        ),
        Metric::Memory => (
            "Memory Usage Comparison",
            "Memory (bytes)",
            Scale::Log,
            format_thousands as fn(f64) -> String,
        ),
    };

    BarChart {
        title: title.to_string(),
        x_label: "Operation".to_string(),
        y_label: y_label.to_string(),
        categories: Operation::ALL.iter().map(|op| op.label().to_string()).collect(),
        series,
        scale,
        format_value,
    }
}

/// Write `execution_time.svg` into `dir`
pub fn render_execution_time(report: &AggregateReport, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(EXECUTION_TIME_CHART);
    grouped_chart(report, Metric::Time).save(&path)?;
    Ok(path)
}

/// Write `memory_usage.svg` into `dir`
pub fn render_memory_usage(report: &AggregateReport, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(MEMORY_USAGE_CHART);
    grouped_chart(report, Metric::Memory).save(&path)?;
    Ok(path)
}

/// Render both charts, returning their paths
pub fn render_charts(report: &AggregateReport, dir: &Path) -> Result<Vec<PathBuf>> {
    let paths = vec![
        render_execution_time(report, dir)?,
        render_memory_usage(report, dir)?,
    ];
    info!("📊 Charts generated in {}", dir.display());
    for path in &paths {
        info!("  - {}", path.display());
    }
    Ok(paths)
}
