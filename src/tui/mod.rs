//! Ratatui-based terminal dashboard.
//!
//! Two charts (daily figures as lines, cumulative vaccinations as areas) and a
//! settings panel for the active chart: column multi-select, date range, and
//! linear/log scale. `r` refreshes both tables from the live API; a failed
//! refresh keeps the current tables and disables further refreshes.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::info;

use crate::app::dashboard::{Dashboard, RefreshState};
use crate::app::pipeline::{fetch_tables, startup_source};
use crate::config::AppConfig;
use crate::data::ApiSource;
use crate::domain::Dataset;
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{CovidChart, ratatui_color};

/// Days moved by PgUp/PgDn on a date control.
const PAGE_DAYS: i64 = 30;

/// Start the TUI.
pub fn run(config: AppConfig) -> Result<(), AppError> {
    // Load before touching the terminal so errors print normally.
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::external(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::external(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::external(format!("Failed to enter alternate screen: {e}")));
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

/// Settings panel rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Columns,
    From,
    To,
    Scale,
}

impl Control {
    const ALL: [Control; 4] = [Control::Columns, Control::From, Control::To, Control::Scale];
}

struct App {
    config: AppConfig,
    dash: Dashboard,
    active: Dataset,
    selected_control: usize,
    column_cursor: usize,
    status: String,
    pending_refresh: bool,
}

impl App {
    fn new(config: AppConfig) -> Result<Self, AppError> {
        let source = startup_source(&config)?;
        let tables = fetch_tables(source.as_ref())?;
        let status = format!("Loaded {}.", source.describe());
        info!(source = %source.describe(), "dashboard started");
        Ok(Self {
            config,
            dash: Dashboard::new(tables),
            active: Dataset::Daily,
            selected_control: 0,
            column_cursor: 0,
            status,
            pending_refresh: false,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::external(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            // The "Fetching..." status is on screen now; do the blocking work.
            if self.pending_refresh {
                self.pending_refresh = false;
                self.refresh();
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::external(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::external(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
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

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.active = self.active.next();
                self.column_cursor = 0;
                self.status = format!("Editing: {}", self.active.title());
            }
            KeyCode::Up => {
                self.selected_control = self.selected_control.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_control + 1 < Control::ALL.len() {
                    self.selected_control += 1;
                }
            }
            KeyCode::Left => self.adjust(-1, 1),
            KeyCode::Right => self.adjust(1, 1),
            KeyCode::PageDown => self.adjust(-1, PAGE_DAYS),
            KeyCode::PageUp => self.adjust(1, PAGE_DAYS),
            KeyCode::Char(' ') => self.toggle_column_under_cursor(),
            KeyCode::Char('l') => {
                let scale = self.dash.toggle_scale(self.active);
                self.status = format!("scale: {}", scale.label());
            }
            KeyCode::Char('r') => {
                if self.dash.refresh_enabled() {
                    self.status = "Fetching from API...".to_string();
                    self.pending_refresh = true;
                } else {
                    self.status = "Refresh disabled after a failed fetch.".to_string();
                }
            }
            _ => {}
        }
        false
    }

    fn adjust(&mut self, direction: i64, days: i64) {
        let columns = self.active.columns();
        match Control::ALL[self.selected_control] {
            Control::Columns => {
                let n = columns.len();
                self.column_cursor = if direction >= 0 {
                    (self.column_cursor + 1) % n
                } else {
                    (self.column_cursor + n - 1) % n
                };
            }
            Control::From => {
                self.dash.shift_start(self.active, direction * days);
                self.status = format!("from: {}", self.dash.view(self.active).range.start);
            }
            Control::To => {
                self.dash.shift_end(self.active, direction * days);
                self.status = format!("to: {}", self.dash.view(self.active).range.end);
            }
            Control::Scale => {
                let scale = self.dash.toggle_scale(self.active);
                self.status = format!("scale: {}", scale.label());
            }
        }
    }

    fn toggle_column_under_cursor(&mut self) {
        let Some(&column) = self.active.columns().get(self.column_cursor) else {
            return;
        };
        let on = self.dash.toggle_column(self.active, column);
        self.status = format!("{column}: {}", if on { "shown" } else { "hidden" });
    }

    fn refresh(&mut self) {
        let state = match ApiSource::from_config(&self.config) {
            Ok(source) => self.dash.refresh(&source).clone(),
            Err(err) => self.dash.fail_refresh(err.to_string()).clone(),
        };
        self.status = match state {
            RefreshState::Ready => format!(
                "Refreshed: data to {}.",
                self.dash.table(Dataset::Daily).last_date()
            ),
            RefreshState::Failed(msg) => format!("Refresh failed: {msg}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let span = self.dash.table(Dataset::Daily).span();
        let refresh = match self.dash.refresh_state() {
            RefreshState::Ready => Span::styled("refresh: ready", Style::default().fg(Color::Green)),
            RefreshState::Failed(_) => Span::styled(
                "refresh: FAILED",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        };
        let line = Line::from(vec![
            Span::styled("covid", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                " - UK COVID-19 | {} | data {span} | ",
                self.config.filter.to_query()
            )),
            refresh,
        ]);
        let p = Paragraph::new(Text::from(line)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(50),
                Constraint::Min(0),
                Constraint::Length(6),
            ])
            .split(area);

        self.draw_chart(frame, chunks[0], Dataset::Daily);
        self.draw_chart(frame, chunks[1], Dataset::Vaccinations);
        self.draw_settings(frame, chunks[2]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, dataset: Dataset) {
        let data = self.dash.chart_data(dataset);
        let colors: Vec<usize> = data
            .series
            .iter()
            .map(|s| dataset.columns().iter().position(|c| *c == s.name).unwrap_or(0))
            .collect();

        let mut title = vec![Span::raw(format!(" {} ({}) ", dataset.title(), data.scale.label()))];
        for (series, &idx) in data.series.iter().zip(&colors) {
            title.push(Span::styled(
                format!("■ {} ", series.name),
                Style::default().fg(ratatui_color(idx)),
            ));
        }

        let border = if dataset == self.active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_style(border);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let widget = CovidChart {
            data: &data,
            style: dataset.style(),
            colors: &colors,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let view = self.dash.view(self.active);

        let mut column_spans = vec![Span::raw("Columns: ")];
        for (i, column) in self.active.columns().iter().enumerate() {
            let mark = if view.is_selected(column) { "[x]" } else { "[ ]" };
            let mut style = Style::default().fg(ratatui_color(i));
            if i == self.column_cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            column_spans.push(Span::styled(format!("{mark} {column}"), style));
            column_spans.push(Span::raw("  "));
        }

        let items = vec![
            ListItem::new(Line::from(column_spans)),
            ListItem::new(format!("From: {}", view.range.start)),
            ListItem::new(format!("To:   {}", view.range.end)),
            ListItem::new(format!("Scale: {}", view.scale.label())),
        ];

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("Settings: {}", self.active.title()))
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_control));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let refresh_hint = if self.dash.refresh_enabled() {
            "r refresh"
        } else {
            "refresh disabled"
        };
        let help = format!(
            "Tab chart  ↑/↓ select  ←/→ adjust  PgUp/PgDn ±{PAGE_DAYS}d  Space toggle  l log  {refresh_hint}  q quit"
        );
        let status_style = match self.dash.refresh_state() {
            RefreshState::Failed(_) => Style::default().fg(Color::Red),
            RefreshState::Ready => Style::default().fg(Color::Yellow),
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, status_style),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}
