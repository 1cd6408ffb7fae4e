//! Ratatui-based terminal dashboard.
//!
//! The dashboard shows the period selector, six metric cards, the revenue
//! trend and quantity distribution charts, and a searchable customer table.
//! Data is loaded in the background by `RecordFeed`; the derived view is
//! rebuilt only when the records or the selection change.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
};

use crate::cli::TuiArgs;
use crate::data::{RecordFeed, open_source};
use crate::domain::{PeriodMatch, Record};
use crate::error::AppError;
use crate::report::{CURRENCY, DashboardView, fmt_currency, fmt_grouped, fmt_liters, metric_cards};
use crate::select::{PeriodSelection, PeriodSelector, search_records};
use crate::session::Session;

mod plotters_chart;

use plotters_chart::{ChartKind, PeriodChart, value_bounds};

const CARD_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::LightMagenta,
    Color::Green,
    Color::Cyan,
    Color::Magenta,
];

/// Start the TUI. Refuses to render without an authenticated session.
pub fn run(args: TuiArgs, session: &mut dyn Session) -> Result<(), AppError> {
    if !session.is_authenticated() {
        return Err(AppError::new(2, "Not signed in; the dashboard requires an active session."));
    }

    let source = open_source(&args.source.to_spec())?;
    let current_year = Local::now().year();
    let selection = args.filter.selection(current_year);
    let browse_year = selection
        .month
        .map(|m| m.year())
        .or(selection.year)
        .unwrap_or(current_year);

    let mut app = App::new(
        RecordFeed::new(source),
        PeriodSelector::with_selection(browse_year, selection),
        args.filter.period_match(),
        args.filter.search.clone(),
        session,
    );

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.feed.refetch();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// What the key handler asks the loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App<'s> {
    feed: RecordFeed,
    selector: PeriodSelector,
    period_match: PeriodMatch,
    search: String,
    editing_search: bool,
    table_offset: usize,
    status: String,
    session: &'s mut dyn Session,
    /// Bumped whenever the feed hands over a new record list.
    data_version: u64,
    view: Option<DashboardView>,
    view_key: Option<(u64, PeriodSelection)>,
    tick: usize,
}

impl<'s> App<'s> {
    fn new(
        feed: RecordFeed,
        selector: PeriodSelector,
        period_match: PeriodMatch,
        search: String,
        session: &'s mut dyn Session,
    ) -> Self {
        Self {
            feed,
            selector,
            period_match,
            search,
            editing_search: false,
            table_offset: 0,
            status: "Loading dashboard data...".to_string(),
            session,
            data_version: 0,
            view: None,
            view_key: None,
            tick: 0,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.feed.poll() {
                self.on_feed_update();
                needs_redraw = true;
            }
            if self.feed.is_loading() {
                self.tick = self.tick.wrapping_add(1);
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) == Flow::Quit {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn on_feed_update(&mut self) {
        match self.feed.error() {
            Some(err) => {
                self.status = format!("Error loading data: {err}");
            }
            None => {
                self.data_version += 1;
                self.table_offset = 0;
                self.refresh_view();
                let at = self
                    .feed
                    .fetched_at()
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_default();
                self.status = format!("Loaded {} records at {at}.", self.feed.data().len());
            }
        }
    }

    /// Rebuild the derived view if the records or selection changed.
    fn refresh_view(&mut self) {
        let key = (self.data_version, self.selector.selection());
        if self.view_key == Some(key) {
            return;
        }
        self.view = Some(DashboardView::build(self.feed.data(), key.1, self.period_match));
        self.view_key = Some(key);
    }

    fn handle_key(&mut self, code: KeyCode) -> Flow {
        if self.editing_search {
            self.handle_search_edit(code);
            return Flow::Continue;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('x') => {
                self.session.sign_out();
                return Flow::Quit;
            }
            KeyCode::Char('r') => {
                self.feed.refetch();
                self.status = "Refreshing...".to_string();
            }
            KeyCode::Left => self.change_selection(|s| s.step_month(false)),
            KeyCode::Right => self.change_selection(|s| s.step_month(true)),
            KeyCode::Char('[') => self.change_selection(|s| s.shift_year(-1)),
            KeyCode::Char(']') => self.change_selection(|s| s.shift_year(1)),
            KeyCode::Char('c') => {
                let year = Local::now().year();
                self.change_selection(|s| s.clear_month(year));
            }
            KeyCode::Char('l') => self.change_selection(PeriodSelector::lifetime),
            KeyCode::Char('/') => {
                self.editing_search = true;
                self.status = "Search: type to filter, Enter to keep, Esc to clear.".to_string();
            }
            KeyCode::Up => self.scroll_table(-1),
            KeyCode::Down => self.scroll_table(1),
            KeyCode::PageUp => self.scroll_table(-10),
            KeyCode::PageDown => self.scroll_table(10),
            KeyCode::Char('e') => self.export_view(),
            KeyCode::Char(c) => {
                if let Some(index) = month_index_for_key(c) {
                    self.change_selection(|s| s.select_month(index));
                }
            }
            _ => {}
        }

        Flow::Continue
    }

    fn handle_search_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_search = false;
                self.search.clear();
                self.status = "Search cleared.".to_string();
            }
            KeyCode::Enter => {
                self.editing_search = false;
                self.status = format!("Search: '{}'", self.search);
            }
            KeyCode::Backspace => {
                self.search.pop();
            }
            KeyCode::Char(c) => {
                self.search.push(c);
            }
            _ => {}
        }
        self.table_offset = 0;
    }

    fn change_selection(&mut self, f: impl FnOnce(&mut PeriodSelector)) {
        f(&mut self.selector);
        self.table_offset = 0;
        self.refresh_view();
        self.status = format!("Period: {}", self.selector.label());
    }

    /// Move the table window, keeping at least the last row in view.
    fn scroll_table(&mut self, delta: isize) {
        let max_offset = self.table_rows().len().saturating_sub(1);
        self.table_offset = self.table_offset.saturating_add_signed(delta).min(max_offset);
    }

    fn table_rows(&self) -> Vec<&Record> {
        match &self.view {
            Some(view) => search_records(&view.records, &self.search),
            None => Vec::new(),
        }
    }

    fn export_view(&mut self) {
        if self.view.is_none() {
            self.status = "Nothing to export yet.".to_string();
            return;
        }
        let ts = Local::now().format("%Y%m%d_%H%M%S");
        let slug: String = self
            .selector
            .label()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let path = PathBuf::from(format!("dairy_export_{slug}_{ts}.csv"));

        let rows = self.table_rows();
        let count = rows.len();
        match crate::io::write_records_csv(&path, &rows) {
            Ok(()) => {
                self.status = format!("Exported {count} rows to {}", path.display());
            }
            Err(err) => {
                self.status = format!("Export failed: {err}");
            }
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();

        if let Some(err) = self.feed.error() {
            self.draw_error(frame, size, err);
            return;
        }
        let Some(view) = self.view.as_ref().filter(|_| self.feed.fetched_at().is_some()) else {
            self.draw_loading(frame, size);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Percentage(45),
                Constraint::Min(6),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_cards(frame, chunks[1], view);
        self.draw_charts(frame, chunks[2], view);
        self.draw_table(frame, chunks[3]);
        self.draw_footer(frame, chunks[4]);
    }

    fn draw_loading(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
        let spinner = SPINNER[self.tick % SPINNER.len()];
        let text = Text::from(vec![
            Line::from(Span::styled(spinner.to_string(), Style::default().fg(Color::Cyan))),
            Line::from(Span::styled(
                "Loading dashboard data...",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(self.feed.source_description(), Style::default().fg(Color::Gray))),
        ]);
        let p = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, centered(area, 60, 7));
    }

    fn draw_error(&self, frame: &mut ratatui::Frame<'_>, area: Rect, err: &str) {
        let mut lines = vec![
            Line::from(Span::styled("⚠", Style::default().fg(Color::Red))),
            Line::from(Span::styled(format!("Error loading data: {err}"), Style::default().fg(Color::Red))),
        ];
        if self.feed.is_loading() {
            lines.push(Line::from(Span::styled("Retrying...", Style::default().fg(Color::Yellow))));
        } else {
            lines.push(Line::from(Span::styled("r retry  q quit", Style::default().fg(Color::Gray))));
        }
        let p = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, centered(area, 70, 7));
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let live = if self.feed.is_loading() {
            Span::styled("◌ Refreshing", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("● Live", Style::default().fg(Color::Green))
        };
        let user = self.session.user_label().unwrap_or_else(|| "-".to_string());
        let fetched = self
            .feed
            .fetched_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());

        let lines = vec![
            Line::from(vec![
                Span::styled(
                    "Dairy Analytics Hub",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                live,
            ]),
            Line::from(Span::styled(
                format!(
                    "period: {} | browsing: {} | user: {user} | fetched: {fetched}",
                    self.selector.label(),
                    self.selector.browse_year(),
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_cards(&self, frame: &mut ratatui::Frame<'_>, area: Rect, view: &DashboardView) {
        let cards = metric_cards(&view.metrics);
        let slots = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, cards.len() as u32); 6])
            .split(area);

        for ((card, slot), color) in cards.iter().zip(slots.iter()).zip(CARD_COLORS) {
            let p = Paragraph::new(Span::styled(
                card.value.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center)
            .block(Block::default().title(card.title).borders(Borders::ALL));
            frame.render_widget(p, *slot);
        }
    }

    fn draw_charts(&self, frame: &mut ratatui::Frame<'_>, area: Rect, view: &DashboardView) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let revenue: Vec<f64> = view.revenue_by_period.iter().map(|p| p.value).collect();
        let revenue_labels: Vec<&str> = view.revenue_by_period.iter().map(|p| p.period.as_str()).collect();
        draw_period_chart(
            frame,
            halves[0],
            "Revenue Trends".to_string(),
            &revenue,
            &revenue_labels,
            ChartKind::Line,
            RGBColor(0, 255, 255),
            fmt_axis_revenue,
        );

        let quantity: Vec<f64> = view.quantity_by_period.iter().map(|p| p.value).collect();
        let quantity_labels: Vec<&str> = view.quantity_by_period.iter().map(|p| p.period.as_str()).collect();
        draw_period_chart(
            frame,
            halves[1],
            format!("Milk Distribution (total {})", fmt_liters(view.metrics.total_quantity)),
            &quantity,
            &quantity_labels,
            ChartKind::Bars,
            RGBColor(191, 64, 255),
            fmt_axis_liters,
        );
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = self.table_rows();
        let search_hint = if self.editing_search {
            format!(" search: {}▏", self.search)
        } else if self.search.is_empty() {
            String::new()
        } else {
            format!(" search: {}", self.search)
        };
        let block = Block::default()
            .title(format!("Customer Analytics ({} rows){search_hint}", rows.len()))
            .borders(Borders::ALL);

        if rows.is_empty() {
            let p = Paragraph::new("No customers found matching your search.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray))
                .block(block);
            frame.render_widget(p, area);
            return;
        }

        let header = Row::new(["Customer", "Contact", "Period", "Quantity", "Rate", "Total"])
            .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
        let body = rows.iter().map(|r| {
            Row::new(vec![
                Cell::from(r.customer_name.clone()),
                Cell::from(r.mobile_number.clone()).style(Style::default().fg(Color::Magenta)),
                Cell::from(r.billing_period.clone()).style(Style::default().fg(Color::LightMagenta)),
                Cell::from(fmt_liters(r.milk_quantity)),
                Cell::from(format!("{CURRENCY}{:.2}", r.price_per_liter)),
                Cell::from(fmt_currency(r.total_amount)).style(Style::default().fg(Color::Green)),
            ])
        });

        let widths = [
            Constraint::Percentage(24),
            Constraint::Percentage(16),
            Constraint::Percentage(18),
            Constraint::Percentage(12),
            Constraint::Percentage(12),
            Constraint::Percentage(18),
        ];
        let table = Table::new(body, widths).header(header).block(block);

        let max_offset = rows.len().saturating_sub(1);
        let mut state = TableState::default().with_offset(self.table_offset.min(max_offset));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "1-9 0 - = pick month  ←/→ month  [/] year  c clear  l lifetime  / search  ↑/↓ scroll  r refresh  e export  x sign out  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_period_chart(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: String,
    values: &[f64],
    labels: &[&str],
    kind: ChartKind,
    color: RGBColor,
    fmt_y: fn(f64) -> String,
) {
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    if values.is_empty() {
        let msg = Paragraph::new("No data for this period.").style(Style::default().fg(Color::Yellow));
        frame.render_widget(msg, inner);
        return;
    }

    let y_bounds = value_bounds(values);
    let (chart_rect, insets) = chart_layout(inner);
    let widget = PeriodChart {
        values,
        kind,
        y_bounds,
        color,
    };
    let x_bounds = widget.x_bounds();

    frame.render_widget(widget, chart_rect);
    if let Some(insets) = insets {
        draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, labels, fmt_y);
    }
}

/// Month-grid shortcut: `1`-`9` are January-September, then `0`, `-`, `=`.
fn month_index_for_key(c: char) -> Option<u32> {
    match c {
        '1'..='9' => c.to_digit(10).map(|d| d - 1),
        '0' => Some(9),
        '-' => Some(10),
        '=' => Some(11),
        _ => None,
    }
}

/// `₹12K`-style revenue ticks.
fn fmt_axis_revenue(v: f64) -> String {
    format!("{CURRENCY}{:.0}K", v / 1000.0)
}

fn fmt_axis_liters(v: f64) -> String {
    format!("{}L", fmt_grouped(v.round()))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 1,
        top: 0,
        bottom: 1,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

/// Period labels under the chart and value ticks to its left.
#[allow(clippy::too_many_arguments)]
fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    labels: &[&str],
    fmt_y: fn(f64) -> String,
) {
    let style = Style::default().fg(Color::Gray);

    // X: label up to four evenly spaced periods.
    let y = chart.y + chart.height;
    if y < inner.y + inner.height {
        for idx in x_label_indices(labels.len(), 4) {
            let u = (idx as f64 - x_bounds[0]) / (x_bounds[1] - x_bounds[0]);
            let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
            let label = crate::report::truncate(labels[idx], 14);
            let label_len = label.chars().count() as u16;
            let start = x
                .saturating_sub(label_len / 2)
                .clamp(inner.x, (inner.x + inner.width).saturating_sub(label_len));
            frame.render_widget(
                Paragraph::new(label).style(style),
                Rect {
                    x: start,
                    y,
                    width: label_len.min(inner.width),
                    height: 1,
                },
            );
        }
    }

    // Y: five ticks from bottom to top.
    let ticks = 5usize;
    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_y(y_val);
        let label_len = label.chars().count() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }
}

/// Up to `max` category indices spread evenly across `0..len`, first and last included.
fn x_label_indices(len: usize, max: usize) -> Vec<usize> {
    if len == 0 || max == 0 {
        return Vec::new();
    }
    if len <= max {
        return (0..len).collect();
    }
    let mut out: Vec<usize> = (0..max)
        .map(|i| ((len - 1) as f64 * i as f64 / (max - 1).max(1) as f64).round() as usize)
        .collect();
    out.dedup();
    out
}
