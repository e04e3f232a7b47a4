//! Chart blocks to inline SVG.
//!
//! Series colors come from a fixed palette indexed by series position (pie
//! charts: by slice position), so the same data always draws the same way.

use std::fmt::Write as _;

use serde_json::{Map, Value};

use super::escaped;
use crate::markup::{ChartBlock, ChartKind};

/// Series palette, cycled by index.
pub const PALETTE: [&str; 6] = [
    "hsl(350, 100%, 38%)",
    "hsl(350, 80%, 50%)",
    "hsl(350, 60%, 60%)",
    "hsl(0, 0%, 70%)",
    "hsl(200, 70%, 50%)",
    "hsl(150, 60%, 45%)",
];

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 250.0;
const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 16.0;
const MARGIN_BOTTOM: f64 = 32.0;
const GRID_LINES: u32 = 4;
const PIE_RADIUS: f64 = 80.0;

const GRID_STROKE: &str = "hsl(240, 10%, 25%)";
const AXIS_TEXT: &str = "hsl(0, 0%, 65%)";

/// Color for the series or slice at `index`.
pub fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Data series of a chart: keys of the first row except `name` and `label`,
/// in document order.
pub fn series_keys(rows: &[Map<String, Value>]) -> Vec<&str> {
    rows.first()
        .map(|row| {
            row.keys()
                .map(String::as_str)
                .filter(|k| *k != "name" && *k != "label")
                .collect()
        })
        .unwrap_or_default()
}

/// Category label of a row: `name`, else `label`.
pub fn category(row: &Map<String, Value>) -> String {
    match row.get("name").or_else(|| row.get("label")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Numeric value of a field; numeric strings are accepted.
pub fn number(value: Option<&Value>) -> Option<f64> {
    let n: f64 = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// One slice of a pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    /// Share of the total, rounded to a whole percent.
    pub percent: f64,
    pub color: &'static str,
}

impl PieSlice {
    /// `"<name>: <percent>%"`
    pub fn label(&self) -> String {
        format!("{}: {:.0}%", self.name, self.percent)
    }
}

/// Slices from each row's `value` field. Rows without a positive value are
/// left out but still consume their palette slot. Empty when the total is
/// not positive.
pub fn pie_slices(rows: &[Map<String, Value>]) -> Vec<PieSlice> {
    let values: Vec<Option<f64>> = rows
        .iter()
        .map(|row| number(row.get("value")).filter(|v| *v > 0.0))
        .collect();
    let total: f64 = values.iter().flatten().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    rows.iter()
        .zip(values)
        .enumerate()
        .filter_map(|(i, (row, value))| {
            value.map(|value| PieSlice {
                name: category(row),
                value,
                percent: (value / total * 100.0).round(),
                color: color(i),
            })
        })
        .collect()
}

/// Render a chart as an SVG figure. `None` when there is nothing to draw.
pub fn render_chart(block: &ChartBlock) -> Option<String> {
    if block.rows.is_empty() {
        return None;
    }

    let (svg, legend) = match block.kind {
        ChartKind::Pie => {
            let slices = pie_slices(&block.rows);
            if slices.is_empty() {
                return None;
            }
            let legend = slices
                .iter()
                .map(|s| (s.name.clone(), s.color))
                .collect::<Vec<_>>();
            (pie_svg(&slices), legend)
        }
        kind => {
            let keys = series_keys(&block.rows);
            if keys.is_empty() {
                return None;
            }
            let legend = keys
                .iter()
                .enumerate()
                .map(|(i, k)| ((*k).to_string(), color(i)))
                .collect::<Vec<_>>();
            (cartesian_svg(kind, &block.rows, &keys), legend)
        }
    };

    let mut out = String::new();
    let _ = write!(out, r#"<figure class="chart chart-{}">"#, block.kind.as_str());
    if let Some(title) = &block.title {
        let _ = write!(out, r#"<figcaption class="chart-title">{}</figcaption>"#, escaped(title));
    }
    out.push_str(&svg);
    out.push_str(r#"<ul class="chart-legend">"#);
    for (name, color) in legend {
        let _ = write!(
            out,
            r#"<li><span class="chart-swatch" style="background:{color}"></span>{}</li>"#,
            escaped(&name)
        );
    }
    out.push_str("</ul></figure>");
    Some(out)
}

/// Vertical scale over a domain that always includes zero.
struct Scale {
    min: f64,
    max: f64,
}

impl Scale {
    fn new(values: impl Iterator<Item = f64>) -> Self {
        let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if (max - min).abs() < f64::EPSILON {
            Self { min, max: min + 1.0 }
        } else {
            Self { min, max }
        }
    }

    fn y(&self, v: f64) -> f64 {
        let plot = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        MARGIN_TOP + plot * (self.max - v) / (self.max - self.min)
    }
}

fn cartesian_svg(kind: ChartKind, rows: &[Map<String, Value>], keys: &[&str]) -> String {
    let scale = Scale::new(
        rows.iter()
            .flat_map(|row| keys.iter().filter_map(|k| number(row.get(*k)))),
    );
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let band = plot_w / rows.len() as f64;
    let center = |i: usize| MARGIN_LEFT + band * (i as f64 + 0.5);

    let mut svg = open_svg(kind);

    // Grid and y-axis labels.
    for step in 0..=GRID_LINES {
        let v = scale.min + (scale.max - scale.min) * f64::from(step) / f64::from(GRID_LINES);
        let y = scale.y(v);
        let _ = write!(
            svg,
            r#"<line x1="{MARGIN_LEFT:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{GRID_STROKE}" stroke-dasharray="3 3"/><text x="{:.1}" y="{:.1}" fill="{AXIS_TEXT}" font-size="12" text-anchor="end">{}</text>"#,
            WIDTH - MARGIN_RIGHT,
            MARGIN_LEFT - 6.0,
            y + 4.0,
            format_tick(v)
        );
    }

    // Category labels.
    for (i, row) in rows.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" fill="{AXIS_TEXT}" font-size="12" text-anchor="middle">{}</text>"#,
            center(i),
            HEIGHT - MARGIN_BOTTOM + 18.0,
            escaped(&category(row))
        );
    }

    let zero = scale.y(0.0);
    match kind {
        ChartKind::Bar => {
            let group = band * 0.8;
            let bar_w = group / keys.len() as f64;
            for (i, row) in rows.iter().enumerate() {
                let left = center(i) - group / 2.0;
                for (s, key) in keys.iter().enumerate() {
                    let Some(v) = number(row.get(*key)) else {
                        continue;
                    };
                    let top = scale.y(v.max(0.0));
                    let height = (scale.y(v.min(0.0)) - top).max(0.0);
                    let _ = write!(
                        svg,
                        r#"<rect x="{:.1}" y="{top:.1}" width="{:.1}" height="{height:.1}" rx="4" fill="{}"><title>{}: {}</title></rect>"#,
                        left + bar_w * s as f64,
                        (bar_w - 2.0).max(1.0),
                        color(s),
                        escaped(key),
                        format_tick(v)
                    );
                }
            }
        }
        ChartKind::Line | ChartKind::Area => {
            for (s, key) in keys.iter().enumerate() {
                let points: Vec<(f64, f64)> = rows
                    .iter()
                    .enumerate()
                    .filter_map(|(i, row)| number(row.get(*key)).map(|v| (center(i), scale.y(v))))
                    .collect();
                let (Some(first), Some(last)) = (points.first(), points.last()) else {
                    continue;
                };
                let path = points
                    .iter()
                    .map(|(x, y)| format!("{x:.1},{y:.1}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                let c = color(s);
                if kind == ChartKind::Area {
                    let _ = write!(
                        svg,
                        r#"<polygon points="{:.1},{zero:.1} {path} {:.1},{zero:.1}" fill="{c}" fill-opacity="0.3"/>"#,
                        first.0, last.0
                    );
                }
                let _ = write!(
                    svg,
                    r#"<polyline points="{path}" fill="none" stroke="{c}" stroke-width="2"/>"#
                );
                if kind == ChartKind::Line {
                    for (x, y) in &points {
                        let _ = write!(svg, r#"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="{c}"/>"#);
                    }
                }
            }
        }
        ChartKind::Pie => {}
    }

    svg.push_str("</svg>");
    svg
}

fn pie_svg(slices: &[PieSlice]) -> String {
    let cx = WIDTH / 2.0;
    let cy = HEIGHT / 2.0;
    let total: f64 = slices.iter().map(|s| s.value).sum();

    let mut svg = open_svg(ChartKind::Pie);
    let mut angle = -std::f64::consts::FRAC_PI_2;
    for slice in slices {
        let sweep = slice.value / total * std::f64::consts::TAU;
        if slices.len() == 1 {
            let _ = write!(
                svg,
                r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{PIE_RADIUS:.1}" fill="{}"/>"#,
                slice.color
            );
        } else {
            let (x0, y0) = polar(cx, cy, PIE_RADIUS, angle);
            let (x1, y1) = polar(cx, cy, PIE_RADIUS, angle + sweep);
            let large = u8::from(sweep > std::f64::consts::PI);
            let _ = write!(
                svg,
                r#"<path d="M{cx:.1},{cy:.1} L{x0:.2},{y0:.2} A{PIE_RADIUS:.1},{PIE_RADIUS:.1} 0 {large} 1 {x1:.2},{y1:.2} Z" fill="{}"/>"#,
                slice.color
            );
        }

        let mid = angle + sweep / 2.0;
        let (lx, ly) = polar(cx, cy, PIE_RADIUS + 18.0, mid);
        let anchor = if mid.cos() >= 0.0 { "start" } else { "end" };
        let _ = write!(
            svg,
            r#"<text x="{lx:.1}" y="{ly:.1}" fill="{}" font-size="12" text-anchor="{anchor}">{}</text>"#,
            slice.color,
            escaped(&slice.label())
        );
        angle += sweep;
    }
    svg.push_str("</svg>");
    svg
}

fn open_svg(kind: ChartKind) -> String {
    format!(
        r#"<svg class="chart-svg" viewBox="0 0 {WIDTH} {HEIGHT}" width="100%" height="{HEIGHT}" role="img" aria-label="{} chart" xmlns="http://www.w3.org/2000/svg">"#,
        kind.as_str()
    )
}

fn polar(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    (cx + r * angle.cos(), cy + r * angle.sin())
}

/// Short axis label: `50k`, `1.2M`, `3`, `0.25`.
fn format_tick(v: f64) -> String {
    let abs = v.abs();
    let (scaled, suffix) = if abs >= 1_000_000.0 {
        (v / 1_000_000.0, "M")
    } else if abs >= 1_000.0 {
        (v / 1_000.0, "k")
    } else {
        (v, "")
    };
    let text = format!("{scaled:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    let text = if text == "-0" { "0" } else { text };
    format!("{text}{suffix}")
}
