//! Dashboard commands embedded in the chat stream.
//!
//! Wire shape: `{"type": "SET_DATE_RANGE", "payload": {"days": 7}}`.
//! Unrecognized kinds decode to [`DashboardCommand::Unknown`] instead of
//! failing, so the dispatcher can log and ignore them.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::dashboard::{ChartKind, Metric};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DateRangePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(default, alias = "startDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, alias = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricChartPayload {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
    #[serde(
        default,
        alias = "chartType",
        alias = "chart_type",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub chart: Option<ChartKind>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FocusSkuPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, alias = "productId", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
}

/// `shop_ids: None` (absent) and `Some(vec![])` (explicitly empty) are distinct.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompareShopsPayload {
    #[serde(default, alias = "shopIds", skip_serializing_if = "Option::is_none")]
    pub shop_ids: Option<Vec<i64>>,
    #[serde(
        default,
        alias = "compareMetric",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub compare_metric: Option<Metric>,
}

/// Optional field that decodes to `None` when its value is not understood,
/// so the command's other fields still apply.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                log::warn!("Ignoring unrecognized command field value {}: {}", value, e);
                Ok(None)
            }
        },
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RefreshPayload {
    #[serde(default)]
    pub force: bool,
}

/// A structured instruction from the assistant to the dashboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawCommand")]
pub enum DashboardCommand {
    SetDateRange(DateRangePayload),
    SetMetricAndChart(MetricChartPayload),
    FocusSku(FocusSkuPayload),
    CompareShops(CompareShopsPayload),
    RefreshData(RefreshPayload),
    /// Kind this client does not understand
    Unknown { kind: String },
}

pub const SET_DATE_RANGE: &str = "SET_DATE_RANGE";
pub const SET_METRIC_AND_CHART: &str = "SET_METRIC_AND_CHART";
pub const SET_METRIC: &str = "SET_METRIC";
pub const FOCUS_SKU: &str = "FOCUS_SKU";
pub const COMPARE_SHOPS: &str = "COMPARE_SHOPS";
pub const REFRESH_DATA: &str = "REFRESH_DATA";

#[derive(Deserialize)]
struct RawCommand {
    #[serde(rename = "type", alias = "kind")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl TryFrom<RawCommand> for DashboardCommand {
    type Error = serde_json::Error;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        let payload = match raw.payload {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        let command = match raw.kind.as_str() {
            SET_DATE_RANGE => DashboardCommand::SetDateRange(serde_json::from_value(payload)?),
            SET_METRIC_AND_CHART | SET_METRIC => {
                DashboardCommand::SetMetricAndChart(serde_json::from_value(payload)?)
            }
            FOCUS_SKU => DashboardCommand::FocusSku(serde_json::from_value(payload)?),
            COMPARE_SHOPS => DashboardCommand::CompareShops(serde_json::from_value(payload)?),
            REFRESH_DATA => DashboardCommand::RefreshData(serde_json::from_value(payload)?),
            _ => DashboardCommand::Unknown { kind: raw.kind },
        };
        Ok(command)
    }
}

impl DashboardCommand {
    /// Wire name of this command's kind
    pub fn kind(&self) -> &str {
        match self {
            DashboardCommand::SetDateRange(_) => SET_DATE_RANGE,
            DashboardCommand::SetMetricAndChart(_) => SET_METRIC_AND_CHART,
            DashboardCommand::FocusSku(_) => FOCUS_SKU,
            DashboardCommand::CompareShops(_) => COMPARE_SHOPS,
            DashboardCommand::RefreshData(_) => REFRESH_DATA,
            DashboardCommand::Unknown { kind } => kind,
        }
    }

    /// Human-readable description, used in the chat transcript marker.
    pub fn label(&self) -> String {
        match self {
            DashboardCommand::SetDateRange(p) => match (p.days, p.start_date, p.end_date) {
                (Some(days), _, _) => format!("date range set to last {} days", days),
                (None, Some(start), Some(end)) => {
                    format!("date range set to {} to {}", start, end)
                }
                _ => "date range unchanged".to_string(),
            },
            DashboardCommand::SetMetricAndChart(p) => {
                let mut parts = Vec::new();
                if let Some(metric) = p.metric {
                    parts.push(format!("metric {}", metric.label()));
                }
                if let Some(chart) = p.chart {
                    parts.push(format!("{} chart", chart.label()));
                }
                if let Some(days) = p.days {
                    parts.push(format!("last {} days", days));
                }
                if parts.is_empty() {
                    "view unchanged".to_string()
                } else {
                    format!("view set to {}", parts.join(", "))
                }
            }
            DashboardCommand::FocusSku(p) => match (&p.sku, p.product_id) {
                (Some(sku), _) => format!("focused on SKU {}", sku),
                (None, Some(id)) => format!("focused on product {}", id),
                (None, None) => "focus cleared".to_string(),
            },
            DashboardCommand::CompareShops(p) => match &p.shop_ids {
                Some(ids) if ids.is_empty() => "shop comparison cleared".to_string(),
                Some(ids) => {
                    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                    format!("comparing shops {}", ids.join(", "))
                }
                None => match p.compare_metric {
                    Some(metric) => format!("comparing by {}", metric.label()),
                    None => "shop comparison unchanged".to_string(),
                },
            },
            DashboardCommand::RefreshData(p) => {
                if p.force {
                    "data force-refreshed".to_string()
                } else {
                    "data refreshed".to_string()
                }
            }
            DashboardCommand::Unknown { kind } => format!("unsupported command {}", kind),
        }
    }
}
