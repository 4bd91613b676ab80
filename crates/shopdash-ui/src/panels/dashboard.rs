//! Dashboard summary: what the charts are currently showing.
//!
//! Changes made here go through the store like assistant commands do, so the
//! panel returns a command instead of editing state.

use egui::{self, RichText};
use shopdash_core::dispatcher::RefreshSignal;
use shopdash_types::command::{DashboardCommand, MetricChartPayload, RefreshPayload};
use shopdash_types::dashboard::{ChartKind, DashboardState, Metric};
use crate::theme::*;

const CHART_KINDS: [ChartKind; 5] = [
    ChartKind::Line,
    ChartKind::Bar,
    ChartKind::Area,
    ChartKind::Pie,
    ChartKind::Table,
];

/// Label/value pairs describing the current view.
pub fn summary_rows(state: &DashboardState, last_refresh: Option<RefreshSignal>) -> Vec<(&'static str, String)> {
    let shops = if state.selected_shops.is_empty() {
        "All shops".to_string()
    } else {
        state
            .selected_shops
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let focus = match &state.focus {
        None => "None".to_string(),
        Some(focus) => match (&focus.sku, focus.product_id) {
            (Some(sku), Some(id)) => format!("{} (product {})", sku, id),
            (Some(sku), None) => sku.clone(),
            (None, Some(id)) => format!("product {}", id),
            (None, None) => "None".to_string(),
        },
    };
    let refreshed = match last_refresh {
        None => "Never".to_string(),
        Some(signal) if signal.force => format!("#{} (forced)", signal.seq),
        Some(signal) => format!("#{}", signal.seq),
    };

    vec![
        ("Dates", format!("{} → {}", state.date_range.start, state.date_range.end)),
        ("Shops", shops),
        ("Metric", state.metric.label().to_string()),
        ("Chart", state.chart.label().to_string()),
        ("Focus", focus),
        ("Refresh", refreshed),
    ]
}

/// Render the summary. Returns a command when the user changes the view.
pub fn dashboard_panel(
    ui: &mut egui::Ui,
    state: &DashboardState,
    last_refresh: Option<RefreshSignal>,
) -> Option<DashboardCommand> {
    let mut command = None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("Dashboard").color(TEXT_PRIMARY));
            ui.separator();

            egui::Grid::new("dashboard_summary")
                .num_columns(2)
                .spacing([12.0, 4.0])
                .show(ui, |ui| {
                    for (label, value) in summary_rows(state, last_refresh) {
                        ui.label(RichText::new(label).color(TEXT_SECONDARY).small());
                        ui.label(RichText::new(value).color(TEXT_PRIMARY));
                        ui.end_row();
                    }
                });

            ui.add_space(8.0);

            let mut metric = state.metric;
            egui::ComboBox::from_id_salt("dashboard_metric")
                .selected_text(metric.label())
                .show_ui(ui, |ui| {
                    for m in Metric::all() {
                        ui.selectable_value(&mut metric, *m, m.label());
                    }
                });
            if metric != state.metric {
                command = Some(DashboardCommand::SetMetricAndChart(MetricChartPayload {
                    metric: Some(metric),
                    ..Default::default()
                }));
            }

            let mut chart = state.chart;
            egui::ComboBox::from_id_salt("dashboard_chart")
                .selected_text(chart.label())
                .show_ui(ui, |ui| {
                    for c in CHART_KINDS {
                        ui.selectable_value(&mut chart, c, c.label());
                    }
                });
            if chart != state.chart {
                command = Some(DashboardCommand::SetMetricAndChart(MetricChartPayload {
                    chart: Some(chart),
                    ..Default::default()
                }));
            }

            ui.add_space(4.0);
            if ui.button("Refresh data").clicked() {
                command = Some(DashboardCommand::RefreshData(RefreshPayload { force: true }));
            }
        });

    command
}
