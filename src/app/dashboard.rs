//! Presentation-layer state: the current tables and per-chart view settings.
//!
//! `Dashboard` is the single owner of the wrangled tables. They only change
//! through `replace`, which `refresh` calls after a fully successful
//! fetch-and-wrangle cycle. A failed refresh leaves the tables untouched and
//! disables further refreshes; there is no automatic retry.

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::app::pipeline::{Tables, fetch_tables};
use crate::data::RecordSource;
use crate::domain::{Dataset, DateRange, ScaleMode};
use crate::error::AppError;
use crate::wrangle::WrangledTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshState {
    Ready,
    Failed(String),
}

/// User-chosen view of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub selected: Vec<String>,
    pub range: DateRange,
    pub scale: ScaleMode,
}

impl ChartView {
    /// Everything selected, full span, linear.
    pub fn for_table(table: &WrangledTable) -> Self {
        Self {
            selected: table.columns().to_vec(),
            range: table.span(),
            scale: ScaleMode::Linear,
        }
    }

    pub fn is_selected(&self, column: &str) -> bool {
        self.selected.iter().any(|c| c == column)
    }
}

/// One plotted series, already transformed by the view's scale.
///
/// Points the scale cannot place (non-positive values on a log axis) are
/// omitted, so consumers should treat missing dates as gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(NaiveDate, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub dataset: Dataset,
    pub range: DateRange,
    pub scale: ScaleMode,
    pub series: Vec<Series>,
}

impl ChartData {
    /// Min/max over every plotted point, or `None` if nothing is plotted.
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for s in &self.series {
            for &(_, y) in &s.points {
                lo = lo.min(y);
                hi = hi.max(y);
            }
        }
        (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
    }
}

pub struct Dashboard {
    tables: Tables,
    daily: ChartView,
    vaccinations: ChartView,
    refresh: RefreshState,
}

impl Dashboard {
    pub fn new(tables: Tables) -> Self {
        Self {
            daily: ChartView::for_table(&tables.daily),
            vaccinations: ChartView::for_table(&tables.vaccinations),
            tables,
            refresh: RefreshState::Ready,
        }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn table(&self, dataset: Dataset) -> &WrangledTable {
        self.tables.get(dataset)
    }

    pub fn view(&self, dataset: Dataset) -> &ChartView {
        match dataset {
            Dataset::Daily => &self.daily,
            Dataset::Vaccinations => &self.vaccinations,
        }
    }

    fn view_mut(&mut self, dataset: Dataset) -> &mut ChartView {
        match dataset {
            Dataset::Daily => &mut self.daily,
            Dataset::Vaccinations => &mut self.vaccinations,
        }
    }

    pub fn refresh_state(&self) -> &RefreshState {
        &self.refresh
    }

    pub fn refresh_enabled(&self) -> bool {
        self.refresh == RefreshState::Ready
    }

    /// Flip a column in or out of the selection. Returns whether it is now selected.
    pub fn toggle_column(&mut self, dataset: Dataset, column: &str) -> bool {
        if self.table(dataset).column(column).is_none() {
            return false;
        }
        let view = self.view_mut(dataset);
        if let Some(pos) = view.selected.iter().position(|c| c == column) {
            view.selected.remove(pos);
            false
        } else {
            view.selected.push(column.to_string());
            true
        }
    }

    /// Replace the column selection wholesale (unknown names are dropped).
    pub fn select_columns(&mut self, dataset: Dataset, columns: &[String]) {
        let known: Vec<String> = columns
            .iter()
            .filter(|c| self.table(dataset).column(c).is_some())
            .cloned()
            .collect();
        self.view_mut(dataset).selected = known;
    }

    pub fn set_range(&mut self, dataset: Dataset, range: DateRange) {
        let span = self.table(dataset).span();
        self.view_mut(dataset).range = range.clamp_to(&span);
    }

    /// Move the start date by `days`, never past the end date.
    pub fn shift_start(&mut self, dataset: Dataset, days: i64) {
        let span = self.table(dataset).span();
        let view = self.view_mut(dataset);
        let moved = shift_date(view.range.start, days).clamp(span.start, view.range.end);
        view.range.start = moved;
    }

    /// Move the end date by `days`, never before the start date.
    pub fn shift_end(&mut self, dataset: Dataset, days: i64) {
        let span = self.table(dataset).span();
        let view = self.view_mut(dataset);
        let moved = shift_date(view.range.end, days).clamp(view.range.start, span.end);
        view.range.end = moved;
    }

    pub fn toggle_scale(&mut self, dataset: Dataset) -> ScaleMode {
        let view = self.view_mut(dataset);
        view.scale = view.scale.toggle();
        view.scale
    }

    pub fn set_scale(&mut self, dataset: Dataset, scale: ScaleMode) {
        self.view_mut(dataset).scale = scale;
    }

    /// Swap in freshly wrangled tables.
    ///
    /// View ranges are clamped to the new spans; a range that ended on the
    /// previous last date keeps following the latest data.
    pub fn replace(&mut self, tables: Tables) {
        for dataset in Dataset::ALL {
            let old_last = self.table(dataset).last_date();
            let new_span = tables.get(dataset).span();
            let view = self.view_mut(dataset);
            let mut range = view.range;
            if range.end == old_last {
                range.end = new_span.end;
            }
            view.range = range.clamp_to(&new_span);
        }
        self.tables = tables;
    }

    /// Re-fetch and re-wrangle both tables from `source`.
    ///
    /// Does nothing once a refresh has failed.
    pub fn refresh(&mut self, source: &dyn RecordSource) -> &RefreshState {
        if !self.refresh_enabled() {
            warn!("refresh requested after a failure; ignoring");
            return &self.refresh;
        }
        match fetch_tables(source) {
            Ok(tables) => {
                info!(source = %source.describe(), "refresh succeeded");
                self.replace(tables);
                self.refresh = RefreshState::Ready;
            }
            Err(err) => {
                warn!(source = %source.describe(), error = %err, "refresh failed");
                self.refresh = RefreshState::Failed(err.to_string());
            }
        }
        &self.refresh
    }

    /// Record a refresh that failed before a source could even be built
    /// (e.g. the HTTP client could not be constructed).
    pub fn fail_refresh(&mut self, message: impl Into<String>) -> &RefreshState {
        let message = message.into();
        warn!(error = %message, "refresh failed");
        self.refresh = RefreshState::Failed(message);
        &self.refresh
    }

    /// The current view of `dataset`, ready to draw.
    pub fn chart_data(&self, dataset: Dataset) -> ChartData {
        let table = self.table(dataset);
        let view = self.view(dataset);

        let series = table
            .columns()
            .iter()
            .filter(|c| view.is_selected(c))
            .filter_map(|name| {
                let values = table.column(name)?;
                let points = table
                    .dates()
                    .iter()
                    .zip(values)
                    .filter(|(date, _)| view.range.contains(**date))
                    .filter_map(|(&date, &v)| view.scale.apply(v).map(|y| (date, y)))
                    .collect();
                Some(Series {
                    name: name.clone(),
                    points,
                })
            })
            .collect();

        ChartData {
            dataset,
            range: view.range,
            scale: view.scale,
            series,
        }
    }

    /// The current view of `dataset` as a table (unscaled values).
    pub fn selected_table(&self, dataset: Dataset) -> Result<WrangledTable, AppError> {
        let view = self.view(dataset);
        let table = self.table(dataset);
        let columns: Vec<&str> = table
            .columns()
            .iter()
            .filter(|c| view.is_selected(c))
            .map(String::as_str)
            .collect();
        Ok(table.select(view.range, &columns)?)
    }
}

fn shift_date(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}
