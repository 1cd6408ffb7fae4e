//! ASCII/Unicode charts for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual checks in a terminal or a cron mail
//! - deterministic output (helpful for golden tests)
//!
//! Chart shapes:
//! - revenue trend: vertical columns, one per period, left to right
//! - quantity distribution: horizontal bars, one line per period

use crate::report::{PeriodValue, fmt_grouped, truncate};

const LABEL_WIDTH: usize = 16;

/// Render per-period values as vertical columns (`█`), chronological left to right.
///
/// Periods beyond what fits in `width` are dropped from the left so the most
/// recent ones stay visible.
pub fn render_column_chart(title: &str, series: &[PeriodValue], width: usize, height: usize) -> String {
    let mut out = format!("{title}\n");
    if series.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    let width = width.max(10);
    let height = height.max(3);
    let axis_width = 10usize;
    let col_width = 3usize;
    let max_cols = ((width.saturating_sub(axis_width)) / col_width).max(1);
    let visible = &series[series.len().saturating_sub(max_cols)..];

    let max = visible.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    let levels: Vec<usize> = visible.iter().map(|p| scale(p.value, max, height)).collect();

    for row in (1..=height).rev() {
        let axis = if row == height {
            fmt_grouped(max)
        } else if row == 1 {
            "0".to_string()
        } else {
            String::new()
        };
        let mut line = format!("{axis:>9}│");
        for &level in &levels {
            line.push_str(if level >= row { " █ " } else { "   " });
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out.push_str(&format!("{:>9}└{}\n", "", "─".repeat(visible.len() * col_width)));

    // Legend: column index → period label, since labels do not fit under columns.
    for (idx, p) in visible.iter().enumerate() {
        out.push_str(&format!(
            "{:>9} {:>2}: {:<width$} {}\n",
            "",
            idx + 1,
            truncate(&p.period, LABEL_WIDTH),
            fmt_grouped(p.value),
            width = LABEL_WIDTH
        ));
    }

    out
}

/// Render per-period values as horizontal bars (`■`), one line per period.
pub fn render_bar_chart(title: &str, series: &[PeriodValue], width: usize, unit: &str) -> String {
    let mut out = format!("{title}\n");
    if series.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    let bar_width = width.saturating_sub(LABEL_WIDTH + 16).max(5);
    let max = series.iter().map(|p| p.value).fold(0.0_f64, f64::max);

    for p in series {
        let len = scale(p.value, max, bar_width);
        out.push_str(&format!(
            "{:<label$} │{:<bar$} {}{unit}\n",
            truncate(&p.period, LABEL_WIDTH),
            "■".repeat(len),
            fmt_grouped(p.value),
            label = LABEL_WIDTH,
            bar = bar_width
        ));
    }

    out
}

/// Map `value` in `[0, max]` onto `0..=cells`. Non-positive values stay empty.
fn scale(value: f64, max: f64, cells: usize) -> usize {
    if !(value.is_finite() && max.is_finite()) || value <= 0.0 || max <= 0.0 {
        return 0;
    }
    let cells_f = cells as f64;
    ((value / max) * cells_f).round().clamp(1.0, cells_f) as usize
}
