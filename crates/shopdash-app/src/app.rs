//! Main egui application: composes the panels and owns the chat engine.

use std::cell::RefCell;
use std::rc::Rc;

use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};

use shopdash_core::dispatcher::DashboardStore;
use shopdash_core::engine::{ChatEngine, Turn};
use shopdash_core::event_bus::EventBus;
use shopdash_core::ports::{ClockPort, StoragePort};
use shopdash_platform::clock::BrowserClock;
use shopdash_platform::http::HttpChatApi;
use shopdash_platform::storage::auto_detect_storage;
use shopdash_types::config::ClientConfig;
use shopdash_types::event::NoticeLevel;
use shopdash_ui::panels::chat::{self, ChatAction};
use shopdash_ui::panels::settings::{self, SaveFeedback, SettingsAction, SettingsForm};
use shopdash_ui::panels::dashboard;
use shopdash_ui::state::UiState;
use shopdash_ui::theme;

const CONFIG_STORAGE_KEY: &str = "shopdash:config";

pub struct ShopDashApp {
    ui_state: UiState,
    /// Config the engine is running with
    config: ClientConfig,
    settings_form: SettingsForm,
    /// Filled once the stored config has been read
    restored: Rc<RefCell<Option<ClientConfig>>>,
    storage: Rc<dyn StoragePort>,
    clock: Rc<dyn ClockPort>,
    store: DashboardStore,
    event_bus: EventBus,
    engine: ChatEngine,
    first_frame: bool,
}

impl ShopDashApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = ClientConfig::default();
        let storage = auto_detect_storage();
        let clock: Rc<dyn ClockPort> = Rc::new(BrowserClock::new());
        let event_bus = EventBus::new();

        let store = DashboardStore::new(clock.clone());
        let ctx = cc.egui_ctx.clone();
        store.subscribe(move |_| ctx.request_repaint());
        store.on_refresh(|signal| {
            log::info!("Dashboard data refresh #{} (force: {})", signal.seq, signal.force);
        });

        let engine = Self::build_engine(&config, &storage, &clock, &store, &event_bus);
        let restored = Rc::new(RefCell::new(None));
        Self::restore_config(storage.clone(), restored.clone(), cc.egui_ctx.clone());

        Self {
            ui_state: UiState::new(),
            settings_form: SettingsForm::new(&config),
            config,
            restored,
            storage,
            clock,
            store,
            event_bus,
            engine,
            first_frame: true,
        }
    }

    fn build_engine(
        config: &ClientConfig,
        storage: &Rc<dyn StoragePort>,
        clock: &Rc<dyn ClockPort>,
        store: &DashboardStore,
        event_bus: &EventBus,
    ) -> ChatEngine {
        let api = Rc::new(HttpChatApi::new(config.clone(), storage.clone()));
        ChatEngine::new(api, clock.clone(), store.clone(), event_bus.clone(), config)
    }

    /// Read config from storage (async). Always fills `slot`, with defaults
    /// when nothing usable is stored.
    fn restore_config(
        storage: Rc<dyn StoragePort>,
        slot: Rc<RefCell<Option<ClientConfig>>>,
        ctx: egui::Context,
    ) {
        wasm_bindgen_futures::spawn_local(async move {
            let config = match storage.get(CONFIG_STORAGE_KEY).await {
                Ok(Some(data)) => match serde_json::from_slice::<ClientConfig>(&data) {
                    Ok(config) => {
                        log::info!("Config restored from {}", storage.backend_name());
                        config
                    }
                    Err(e) => {
                        log::warn!("Stored config unreadable ({}), using defaults", e);
                        ClientConfig::default()
                    }
                },
                Ok(None) => ClientConfig::default(),
                Err(e) => {
                    log::warn!("Config restore failed: {}", e);
                    ClientConfig::default()
                }
            };
            *slot.borrow_mut() = Some(config);
            ctx.request_repaint();
        });
    }

    /// Save config to storage (async, fire-and-forget)
    fn save_config(storage: Rc<dyn StoragePort>, config: &ClientConfig) {
        match serde_json::to_vec(config) {
            Ok(json) => wasm_bindgen_futures::spawn_local(async move {
                match storage.set(CONFIG_STORAGE_KEY, &json).await {
                    Ok(()) => log::info!("Config saved to storage"),
                    Err(e) => log::warn!("Config save failed: {}", e),
                }
            }),
            Err(e) => log::warn!("Config not serializable: {}", e),
        }
    }

    /// Swap in `config`: new HTTP adapter, fresh conversation and session.
    fn apply_config(&mut self, config: ClientConfig, ctx: &egui::Context) {
        self.engine.reset();
        self.config = config;
        self.settings_form.reset(&self.config);
        self.engine = Self::build_engine(
            &self.config,
            &self.storage,
            &self.clock,
            &self.store,
            &self.event_bus,
        );
        self.start_session(ctx);
    }

    fn start_session(&self, ctx: &egui::Context) {
        let engine = self.engine.clone();
        let scope = self.config.shop_scope.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = engine.ensure_session(&scope).await {
                log::warn!("Chat session unavailable: {}", e);
            }
            ctx.request_repaint();
        });
    }

    fn retry_session(&self, ctx: &egui::Context) {
        let engine = self.engine.clone();
        let scope = self.config.shop_scope.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = engine.retry_session(&scope).await {
                log::warn!("Session retry failed: {}", e);
            }
            ctx.request_repaint();
        });
    }

    /// Drive a started turn to completion (async)
    fn spawn_turn(&self, turn: Turn, ctx: &egui::Context) {
        let engine = self.engine.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let turn_id = turn.id();
            if let Err(e) = engine.run_turn(turn).await {
                log::warn!("Turn {} ended with error: {}", turn_id, e);
            }
            ctx.request_repaint();
        });
    }

    fn handle_chat_action(&mut self, action: ChatAction, ctx: &egui::Context) {
        match action {
            ChatAction::Send(text) => match self.engine.start_message(&text) {
                Ok(turn) => self.spawn_turn(turn, ctx),
                Err(e) => self.ui_state.notify(NoticeLevel::Warning, e.to_string()),
            },
            ChatAction::Cancel => {
                self.engine.cancel();
            }
            ChatAction::Regenerate => match self.engine.regenerate() {
                Ok(Some(turn)) => self.spawn_turn(turn, ctx),
                Ok(None) => self.ui_state.notify(NoticeLevel::Info, "Nothing to regenerate"),
                Err(e) => self.ui_state.notify(NoticeLevel::Warning, e.to_string()),
            },
            ChatAction::Copy(id) => {
                if let Some(text) = self.engine.message_text(&id) {
                    ctx.copy_text(text);
                    self.ui_state.notify(NoticeLevel::Info, "Copied to clipboard");
                }
            }
            ChatAction::RetrySession => self.retry_session(ctx),
            ChatAction::NewConversation => {
                self.engine.reset();
                self.start_session(ctx);
            }
        }
    }

    fn notices(&mut self, ui: &mut egui::Ui) {
        let mut dismissed = None;
        for (index, notice) in self.ui_state.notices.iter().enumerate() {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(&notice.message)
                        .color(theme::notice_color(notice.level))
                        .small(),
                );
                if ui.small_button("×").clicked() {
                    dismissed = Some(index);
                }
            });
        }
        if let Some(index) = dismissed {
            self.ui_state.dismiss_notice(index);
        }
    }
}

impl eframe::App for ShopDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        let restored = self.restored.borrow_mut().take();
        if let Some(config) = restored {
            self.apply_config(config, ctx);
        }

        // Drain events from the chat engine
        let events = self.event_bus.drain();
        if !events.is_empty() {
            self.ui_state.process_events(events);
            ctx.request_repaint();
        }

        if self.ui_state.is_busy() {
            ctx.request_repaint();
        }

        // ── Top bar ──────────────────────────────────────────
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("ShopDash Assistant")
                        .strong()
                        .color(theme::ACCENT)
                        .size(16.0),
                );
                ui.separator();
                ui.label(
                    RichText::new(format!("Scope: {}", self.config.shop_scope.label()))
                        .color(theme::TEXT_SECONDARY)
                        .small(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .selectable_label(self.ui_state.show_settings, "Settings")
                        .clicked()
                    {
                        self.ui_state.show_settings = !self.ui_state.show_settings;
                        if self.ui_state.show_settings {
                            self.settings_form.reset(&self.config);
                        }
                    }
                    if ui
                        .selectable_label(self.ui_state.show_thinking, "Thinking")
                        .clicked()
                    {
                        self.ui_state.show_thinking = !self.ui_state.show_thinking;
                    }
                });
            });
        });

        if !self.ui_state.notices.is_empty() {
            TopBottomPanel::bottom("notices").show(ctx, |ui| self.notices(ui));
        }

        // ── Settings side panel ──────────────────────────────
        if self.ui_state.show_settings {
            SidePanel::right("settings_panel")
                .min_width(280.0)
                .max_width(350.0)
                .show(ctx, |ui| {
                    match settings::settings_panel(ui, &mut self.settings_form) {
                        SettingsAction::SaveClicked => {
                            let saved = self.settings_form.draft.clone();
                            Self::save_config(self.storage.clone(), &saved);
                            self.apply_config(saved, ctx);
                            self.settings_form.feedback = Some(SaveFeedback {
                                message: "Saved, new session started".to_string(),
                                success: true,
                            });
                        }
                        SettingsAction::Changed => self.settings_form.feedback = None,
                        SettingsAction::None => {}
                    }
                    if self.settings_form.is_dirty(&self.config) {
                        ui.label(
                            RichText::new("Unsaved changes")
                                .color(theme::TEXT_SECONDARY)
                                .small()
                                .italics(),
                        );
                    }
                });
        }

        // ── Dashboard side panel ─────────────────────────────
        SidePanel::left("dashboard_panel")
            .min_width(220.0)
            .max_width(300.0)
            .show(ctx, |ui| {
                let snapshot = self.store.snapshot();
                if let Some(command) =
                    dashboard::dashboard_panel(ui, &snapshot, self.store.last_refresh())
                {
                    self.store.dispatch(&command);
                }
            });

        // ── Chat ─────────────────────────────────────────────
        CentralPanel::default().show(ctx, |ui| {
            if let Some(action) = chat::chat_panel(ui, &mut self.ui_state) {
                self.handle_chat_action(action, ctx);
            }
        });
    }
}
