use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default lookback when the dashboard first opens.
pub const DEFAULT_RANGE_DAYS: u32 = 30;

/// Sales metric shown by the dashboard charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    #[serde(alias = "GMV")]
    Gmv,
    #[serde(alias = "ORDERS")]
    Orders,
    #[serde(alias = "REVENUE")]
    Revenue,
    #[serde(alias = "PROFIT")]
    Profit,
    #[serde(alias = "REFUNDS")]
    Refunds,
    #[serde(alias = "VISITORS")]
    Visitors,
    #[serde(alias = "CONVERSION_RATE")]
    ConversionRate,
}

impl Metric {
    pub fn all() -> &'static [Metric] {
        &[
            Metric::Gmv,
            Metric::Orders,
            Metric::Revenue,
            Metric::Profit,
            Metric::Refunds,
            Metric::Visitors,
            Metric::ConversionRate,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Gmv => "GMV",
            Metric::Orders => "Orders",
            Metric::Revenue => "Revenue",
            Metric::Profit => "Profit",
            Metric::Refunds => "Refunds",
            Metric::Visitors => "Visitors",
            Metric::ConversionRate => "Conversion rate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    #[serde(alias = "LINE")]
    Line,
    #[serde(alias = "BAR")]
    Bar,
    #[serde(alias = "AREA")]
    Area,
    #[serde(alias = "PIE")]
    Pie,
    #[serde(alias = "TABLE")]
    Table,
}

impl ChartKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Area => "area",
            ChartKind::Pie => "pie",
            ChartKind::Table => "table",
        }
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `[today - days, today]`
    pub fn last_days(today: NaiveDate, days: u32) -> Self {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }
}

/// SKU and/or product the dashboard is focused on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusedSku {
    pub sku: Option<String>,
    pub product_id: Option<i64>,
}

/// Dashboard-wide view state shared by every chart and table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardState {
    pub date_range: DateRange,
    /// Empty means no shop filter
    pub selected_shops: Vec<i64>,
    pub metric: Metric,
    pub focus: Option<FocusedSku>,
    pub chart: ChartKind,
}

impl DashboardState {
    /// Defaults: last 30 days, all shops, GMV, line chart.
    pub fn initial(today: NaiveDate) -> Self {
        Self {
            date_range: DateRange::last_days(today, DEFAULT_RANGE_DAYS),
            selected_shops: Vec::new(),
            metric: Metric::default(),
            focus: None,
            chart: ChartKind::default(),
        }
    }
}
