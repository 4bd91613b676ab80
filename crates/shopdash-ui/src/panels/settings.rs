//! Settings panel: backend endpoints, shop scope, retry and timeout knobs.

use egui::{self, RichText, Vec2};
use shopdash_types::config::ClientConfig;
use shopdash_types::session::ShopScope;
use crate::state::parse_shop_ids;
use crate::theme::*;

/// What the caller should do after rendering the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    /// Nothing changed
    None,
    /// A draft field was edited; nothing is applied until Save
    Changed,
    /// The user clicked the explicit Save button
    SaveClicked,
}

/// Save feedback passed in from the app layer
#[derive(Clone)]
pub struct SaveFeedback {
    pub message: String,
    pub success: bool,
}

/// Unsaved settings edits, kept apart from the config the app is running with.
#[derive(Clone)]
pub struct SettingsForm {
    pub draft: ClientConfig,
    /// Raw shop id text; `draft.shop_scope` only follows it when it parses
    pub scope_input: String,
    pub feedback: Option<SaveFeedback>,
}

impl SettingsForm {
    pub fn new(applied: &ClientConfig) -> Self {
        Self {
            draft: applied.clone(),
            scope_input: scope_to_input(&applied.shop_scope),
            feedback: None,
        }
    }

    /// Throw away edits and start again from `applied`.
    pub fn reset(&mut self, applied: &ClientConfig) {
        *self = Self::new(applied);
    }

    /// Update the draft scope from `scope_input`. False when the text does not parse.
    pub fn sync_scope(&mut self) -> bool {
        match parse_shop_ids(&self.scope_input) {
            Some(ids) => {
                self.draft.shop_scope = ShopScope::from_ids(ids);
                true
            }
            None => false,
        }
    }

    pub fn is_dirty(&self, applied: &ClientConfig) -> bool {
        self.draft != *applied
    }
}

/// Text shown in the shop id field for a scope.
pub fn scope_to_input(scope: &ShopScope) -> String {
    scope
        .shop_ids()
        .unwrap_or_default()
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the settings panel over `form`. Returns an action for the caller to handle.
pub fn settings_panel(ui: &mut egui::Ui, form: &mut SettingsForm) -> SettingsAction {
    let mut changed = false;
    let mut save_clicked = false;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("Settings").color(TEXT_PRIMARY));
            ui.separator();

            // ── Backend ──────────────────────────────────────
            ui.label(RichText::new("Backend").color(ACCENT).strong());
            ui.add_space(2.0);

            ui.label(RichText::new("API Base URL (optional)").color(TEXT_SECONDARY).small());
            if ui
                .add(egui::TextEdit::singleline(&mut form.draft.api_base).hint_text("same origin"))
                .changed()
            {
                changed = true;
            }

            ui.label(RichText::new("Session path").color(TEXT_SECONDARY).small());
            changed |= ui.text_edit_singleline(&mut form.draft.session_path).changed();

            ui.label(RichText::new("Stream path").color(TEXT_SECONDARY).small());
            changed |= ui.text_edit_singleline(&mut form.draft.stream_path).changed();

            ui.label(RichText::new("Token storage key").color(TEXT_SECONDARY).small());
            changed |= ui.text_edit_singleline(&mut form.draft.token_storage_key).changed();

            ui.add_space(12.0);
            ui.separator();
            ui.add_space(4.0);

            // ── Scope ────────────────────────────────────────
            ui.label(RichText::new("Shops").color(ACCENT).strong());
            ui.add_space(2.0);

            let scope_edit =
                egui::TextEdit::singleline(&mut form.scope_input).hint_text("all shops");
            if ui.add(scope_edit).changed() && form.sync_scope() {
                changed = true;
            }
            let scope_valid = parse_shop_ids(&form.scope_input).is_some();
            let hint = if scope_valid {
                format!("Chat scoped to {}", form.draft.shop_scope.label())
            } else {
                "Shop ids must be numbers separated by commas".to_string()
            };
            ui.label(
                RichText::new(hint)
                    .color(if scope_valid { TEXT_SECONDARY } else { ERROR })
                    .small()
                    .italics(),
            );

            ui.add_space(12.0);
            ui.separator();
            ui.add_space(4.0);

            // ── Reliability ──────────────────────────────────
            ui.label(RichText::new("Reliability").color(ACCENT).strong());
            ui.add_space(2.0);

            ui.label(RichText::new("Session retries").color(TEXT_SECONDARY).small());
            changed |= ui
                .add(egui::Slider::new(&mut form.draft.session_retries, 0..=5))
                .changed();

            ui.label(RichText::new("Retry backoff (ms)").color(TEXT_SECONDARY).small());
            changed |= ui
                .add(egui::Slider::new(&mut form.draft.retry_backoff_ms, 100..=10_000))
                .changed();

            ui.label(RichText::new("Request timeout (ms)").color(TEXT_SECONDARY).small());
            changed |= ui
                .add(egui::Slider::new(&mut form.draft.request_timeout_ms, 1_000..=60_000))
                .changed();

            // ── Save Button ──────────────────────────────────
            ui.add_space(16.0);
            ui.separator();
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                let btn = ui.add(
                    egui::Button::new(RichText::new("Save Settings").color(TEXT_PRIMARY).strong())
                        .fill(ACCENT)
                        .corner_radius(PANEL_ROUNDING)
                        .min_size(Vec2::new(120.0, 28.0)),
                );
                if btn.clicked() {
                    save_clicked = true;
                }

                if let Some(fb) = &form.feedback {
                    let color = if fb.success { SUCCESS } else { ERROR };
                    ui.label(RichText::new(&fb.message).color(color).small());
                }
            });
        });

    if save_clicked {
        SettingsAction::SaveClicked
    } else if changed {
        SettingsAction::Changed
    } else {
        SettingsAction::None
    }
}
