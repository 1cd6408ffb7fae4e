//! Plotters-powered period chart widget for Ratatui.
//!
//! Both dashboard charts share one shape: a categorical x-axis (billing
//! periods, in the order given) and a numeric y-axis. Revenue is drawn as a
//! line, quantity as bars.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bars,
}

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call, so `render()`
/// stays focused on drawing.
pub struct PeriodChart<'a> {
    /// One value per period, in x order.
    pub values: &'a [f64],
    pub kind: ChartKind,
    /// Y bounds (value units).
    pub y_bounds: [f64; 2],
    pub color: RGBColor,
}

impl PeriodChart<'_> {
    /// X bounds covering every category with half a slot of padding.
    pub fn x_bounds(&self) -> [f64; 2] {
        [-0.5, self.values.len().max(1) as f64 - 0.5]
    }
}

impl Widget for PeriodChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 6 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds();
        let [y0, y1] = self.y_bounds;
        if !(y0.is_finite() && y1.is_finite()) || y1 <= y0 || self.values.is_empty() {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 1)
                .set_label_area_size(LabelAreaPosition::Bottom, 1)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Tick labels are drawn by the TUI around the chart rect; Plotters
            // only draws the axes here.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(0)
                .y_labels(0)
                .axis_style(&WHITE)
                .draw()?;

            match self.kind {
                ChartKind::Line => {
                    let points = self.values.iter().enumerate().map(|(i, &v)| (i as f64, v));
                    chart.draw_series(LineSeries::new(points, &self.color))?;
                    // Mark each period so single-point series stay visible.
                    chart.draw_series(
                        self.values
                            .iter()
                            .enumerate()
                            .map(|(i, &v)| Pixel::new((i as f64, v), WHITE)),
                    )?;
                }
                ChartKind::Bars => {
                    let color = self.color;
                    chart.draw_series(self.values.iter().enumerate().map(|(i, &v)| {
                        let x = i as f64;
                        Rectangle::new([(x - 0.35, y0.max(0.0)), (x + 0.35, v)], ShapeStyle::from(&color).filled())
                    }))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Y bounds from zero to just above the largest value.
pub fn value_bounds(values: &[f64]) -> [f64; 2] {
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let min = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::min);

    if max <= min {
        return [min, min + 1.0];
    }
    let pad = (max - min) * 0.1;
    [min, max + pad]
}
