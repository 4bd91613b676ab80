//! Chat panel: conversation, live reply, input row.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use shopdash_core::engine::is_command_marker;
use shopdash_types::message::{ChatMessage, Role};
use crate::state::{SessionStatus, TurnPhase, UiState};
use crate::theme::*;

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    Send(String),
    Cancel,
    Regenerate,
    /// Copy a committed message by id
    Copy(String),
    RetrySession,
    NewConversation,
}

/// Render the chat panel. At most one action per frame.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<ChatAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                header(ui, state, &mut action);
                ui.separator();

                if state.auth_expired {
                    ui.label(
                        RichText::new("Your login has expired. Sign in again to keep chatting.")
                            .color(ERROR),
                    );
                }
                if let SessionStatus::Failed(message) = &state.session {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(message).color(ERROR).small());
                        if ui.button("Retry").clicked() {
                            action = Some(ChatAction::RetrySession);
                        }
                    });
                }

                let available_height = ui.available_height() - 60.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for message in &state.messages {
                            if let Some(id) = render_message(ui, message) {
                                action = Some(ChatAction::Copy(id));
                            }
                            ui.add_space(4.0);
                        }
                        live_reply(ui, state);
                    });

                ui.add_space(8.0);
                input_row(ui, state, &mut action);
            });
        });

    action
}

fn header(ui: &mut egui::Ui, state: &UiState, action: &mut Option<ChatAction>) {
    ui.horizontal(|ui| {
        ui.heading(RichText::new("Assistant").color(TEXT_PRIMARY).strong());
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui
                .add_enabled(!state.is_busy(), egui::Button::new("New chat"))
                .clicked()
            {
                *action = Some(ChatAction::NewConversation);
            }
            let status_color = match (&state.session, state.phase) {
                (SessionStatus::Failed(_), _) => ERROR,
                (_, TurnPhase::Idle) => SUCCESS,
                _ => WARNING,
            };
            ui.label(RichText::new(&state.status_text).color(status_color).small());
        });
    });
}

fn live_reply(ui: &mut egui::Ui, state: &mut UiState) {
    if !state.thinking_text.is_empty() {
        let thinking = egui::CollapsingHeader::new(RichText::new("Thinking").color(THINKING_FG).small())
            .open(Some(state.show_thinking))
            .show(ui, |ui| {
                ui.label(RichText::new(&state.thinking_text).color(THINKING_FG).italics());
            });
        if thinking.header_response.clicked() {
            state.show_thinking = !state.show_thinking;
        }
    }

    match state.phase {
        TurnPhase::Sending if state.streaming_text.is_empty() => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new("Waiting for reply...").color(TEXT_SECONDARY).small());
            });
        }
        TurnPhase::Idle => {}
        _ => {
            egui::Frame::default()
                .fill(BG_SECONDARY)
                .corner_radius(PANEL_ROUNDING)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    content_lines(ui, &state.streaming_text);
                    ui.label(RichText::new("▌").color(ACCENT).strong());
                });
        }
    }
}

fn input_row(ui: &mut egui::Ui, state: &mut UiState, action: &mut Option<ChatAction>) {
    ui.horizontal(|ui| {
        let input = egui::TextEdit::singleline(&mut state.input_text)
            .hint_text("Ask about your shops...")
            .desired_width(ui.available_width() - 150.0)
            .font(egui::FontId::proportional(14.0));
        let response = ui.add(input);

        if state.is_busy() {
            let stop = ui.add(
                egui::Button::new(RichText::new("Stop").color(TEXT_PRIMARY))
                    .fill(ERROR)
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(60.0, 0.0)),
            );
            if stop.clicked() {
                *action = Some(ChatAction::Cancel);
            }
        } else {
            let send_enabled = state.can_send();
            let send = ui.add_enabled(
                send_enabled,
                egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                    .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(60.0, 0.0)),
            );
            let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if send_enabled && (entered || send.clicked()) {
                let text = state.input_text.trim().to_string();
                state.input_text.clear();
                *action = Some(ChatAction::Send(text));
                response.request_focus();
            }
        }

        if ui
            .add_enabled(state.can_regenerate(), egui::Button::new("↻"))
            .on_hover_text("Regenerate last reply")
            .clicked()
        {
            *action = Some(ChatAction::Regenerate);
        }
    });
}

/// Returns the message id when its copy button was clicked.
fn render_message(ui: &mut egui::Ui, message: &ChatMessage) -> Option<String> {
    let (label, label_color) = match message.role {
        Role::User => ("You", ACCENT),
        Role::Assistant => ("Assistant", SUCCESS),
        Role::System => ("System", WARNING),
    };
    let mut copy = None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(label).color(label_color).strong().small());
                if message.role == Role::Assistant {
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.small_button("Copy").clicked() {
                            copy = Some(message.id.clone());
                        }
                    });
                }
            });
            content_lines(ui, &message.content);
        });

    copy
}

/// Message body with command markers set apart.
fn content_lines(ui: &mut egui::Ui, text: &str) {
    if !text.lines().any(is_command_marker) {
        ui.label(RichText::new(text).color(TEXT_PRIMARY));
        return;
    }
    for line in text.lines() {
        if is_command_marker(line) {
            ui.label(RichText::new(line).color(COMMAND_FG).small().monospace());
        } else if !line.is_empty() {
            ui.label(RichText::new(line).color(TEXT_PRIMARY));
        }
    }
}
