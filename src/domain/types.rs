//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - deserialized straight from API pages and snapshot files
//! - handed to the wrangler without conversion
//! - selected from the command line (`Dataset`, `ScaleMode`)

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the date field every raw record carries.
pub const DATE_FIELD: &str = "Date";

/// One day's worth of reported statistics, keyed by field name.
///
/// Values are kept as raw JSON: a number, `null` (the API's "no data"
/// marker), or occasionally a numeric string. Interpretation happens in
/// the wrangler so that malformed values surface as parse errors there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Map<String, Value>);

impl RawRecord {
    /// A record carrying only its date.
    pub fn new(date: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(DATE_FIELD.to_string(), Value::String(date.into()));
        Self(map)
    }

    /// Builder-style field insert (mostly used by tests and fixtures).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn date(&self) -> Option<&Value> {
        self.0.get(DATE_FIELD)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

/// How a dataset is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStyle {
    Line,
    Area,
}

/// The two fixed column sets the dashboard charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// New cases, hospital occupancy, ventilator beds, and deaths.
    Daily,
    /// Cumulative people vaccinated by dose.
    Vaccinations,
}

impl Dataset {
    pub const ALL: [Dataset; 2] = [Dataset::Daily, Dataset::Vaccinations];

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Dataset::Daily => &["cases", "hospital", "ventilators", "deaths"],
            Dataset::Vaccinations => &["first dose", "second dose", "third dose"],
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Dataset::Daily => "Daily figures",
            Dataset::Vaccinations => "Vaccinations (cumulative)",
        }
    }

    pub fn style(self) -> ChartStyle {
        match self {
            Dataset::Daily => ChartStyle::Line,
            Dataset::Vaccinations => ChartStyle::Area,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Dataset::Daily => Dataset::Vaccinations,
            Dataset::Vaccinations => Dataset::Daily,
        }
    }
}

/// Vertical axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    #[default]
    Linear,
    Log,
}

impl ScaleMode {
    pub fn toggle(self) -> Self {
        match self {
            ScaleMode::Linear => ScaleMode::Log,
            ScaleMode::Log => ScaleMode::Linear,
        }
    }

    /// Map a table value onto the plotted axis.
    ///
    /// Log scale plots `log10(v)`; values `<= 0` have no position on a log
    /// axis and come back as `None`.
    pub fn apply(self, value: f64) -> Option<f64> {
        match self {
            ScaleMode::Linear => Some(value),
            ScaleMode::Log if value > 0.0 => Some(value.log10()),
            ScaleMode::Log => None,
        }
    }

    /// Inverse of `apply`, for tick labels.
    pub fn invert(self, axis_value: f64) -> f64 {
        match self {
            ScaleMode::Linear => axis_value,
            ScaleMode::Log => 10f64.powf(axis_value),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScaleMode::Linear => "linear",
            ScaleMode::Log => "log",
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered (inclusive).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Clamp both ends into `bounds`.
    pub fn clamp_to(&self, bounds: &DateRange) -> DateRange {
        let start = self.start.clamp(bounds.start, bounds.end);
        let end = self.end.clamp(bounds.start, bounds.end);
        DateRange::new(start, end)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// Geographic filter sent as the API `filters` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaFilter {
    pub area_type: String,
    pub area_name: Option<String>,
}

impl Default for AreaFilter {
    fn default() -> Self {
        Self {
            area_type: "overview".to_string(),
            area_name: None,
        }
    }
}

impl AreaFilter {
    /// Render as `areaType=...;areaName=...`.
    pub fn to_query(&self) -> String {
        match &self.area_name {
            Some(name) => format!("areaType={};areaName={}", self.area_type, name),
            None => format!("areaType={}", self.area_type),
        }
    }
}

/// Renames API metrics to the field names the wrangler uses.
///
/// Sent as the API `structure` parameter: a JSON object of
/// `output name -> metric name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub fields: Vec<(String, String)>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        let pairs = [
            (DATE_FIELD, "date"),
            ("cases", "newCasesByPublishDate"),
            ("hospital", "hospitalCases"),
            ("ventilators", "covidOccupiedMVBeds"),
            ("deaths", "newDeaths28DaysByPublishDate"),
            ("first dose", "cumPeopleVaccinatedFirstDoseByPublishDate"),
            ("second dose", "cumPeopleVaccinatedSecondDoseByPublishDate"),
            ("third dose", "cumPeopleVaccinatedThirdInjectionByPublishDate"),
        ];
        Self {
            fields: pairs
                .iter()
                .map(|(out, metric)| (out.to_string(), metric.to_string()))
                .collect(),
        }
    }
}

impl FieldMapping {
    pub fn to_structure_json(&self) -> String {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(out, metric)| (out.clone(), Value::String(metric.clone())))
            .collect();
        Value::Object(map).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_scale_drops_non_positive_values() {
        assert_eq!(ScaleMode::Log.apply(100.0), Some(2.0));
        assert_eq!(ScaleMode::Log.apply(0.0), None);
        assert_eq!(ScaleMode::Log.apply(-3.0), None);
        assert_eq!(ScaleMode::Linear.apply(0.0), Some(0.0));
        assert!((ScaleMode::Log.invert(3.0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn date_range_orders_and_clamps() {
        let d = |day| NaiveDate::from_ymd_opt(2021, 1, day).unwrap();
        let r = DateRange::new(d(10), d(2));
        assert_eq!(r.start, d(2));
        assert_eq!(r.days(), 9);

        let bounds = DateRange::new(d(5), d(8));
        assert_eq!(r.clamp_to(&bounds), DateRange::new(d(5), d(8)));
    }

    #[test]
    fn area_filter_query() {
        let mut filter = AreaFilter::default();
        assert_eq!(filter.to_query(), "areaType=overview");
        filter.area_type = "nation".to_string();
        filter.area_name = Some("england".to_string());
        assert_eq!(filter.to_query(), "areaType=nation;areaName=england");
    }

    #[test]
    fn default_mapping_covers_every_dataset_column() {
        let mapping = FieldMapping::default();
        for dataset in Dataset::ALL {
            for col in dataset.columns() {
                assert!(mapping.fields.iter().any(|(out, _)| out == col), "missing {col}");
            }
        }
        let json: Value = serde_json::from_str(&mapping.to_structure_json()).unwrap();
        assert_eq!(json[DATE_FIELD], "date");
    }
}
