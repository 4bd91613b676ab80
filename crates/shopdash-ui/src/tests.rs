#[cfg(test)]
mod tests {
    use crate::panels::dashboard::summary_rows;
    use crate::panels::settings::{scope_to_input, SettingsForm};
    use crate::state::*;
    use chrono::NaiveDate;
    use shopdash_core::dispatcher::RefreshSignal;
    use shopdash_types::config::ClientConfig;
    use shopdash_types::dashboard::{DashboardState, FocusedSku, Metric};
    use shopdash_types::event::{ChatEvent, NoticeLevel};
    use shopdash_types::message::ChatMessage;
    use shopdash_types::session::ShopScope;

    fn ready_state() -> UiState {
        let mut state = UiState::new();
        state.process_events(vec![ChatEvent::SessionReady {
            session_id: "s-1".to_string(),
        }]);
        state
    }

    // ─── UiState Tests ───────────────────────────────────────

    #[test]
    fn test_ui_state_initial() {
        let state = UiState::new();
        assert!(state.messages.is_empty());
        assert_eq!(state.session, SessionStatus::Connecting);
        assert_eq!(state.phase, TurnPhase::Idle);
        assert!(state.streaming_text.is_empty());
        assert!(state.notices.is_empty());
        assert!(!state.auth_expired);
        assert!(!state.show_settings);
        assert_eq!(state.status_text, "Connecting...");
        assert!(!state.is_busy());
        assert!(!state.can_send());
    }

    #[test]
    fn test_ui_state_session_ready_enables_send() {
        let mut state = ready_state();
        assert_eq!(state.session, SessionStatus::Ready("s-1".to_string()));
        assert_eq!(state.status_text, "Ready");

        assert!(!state.can_send());
        state.input_text = "  how are sales?  ".to_string();
        assert!(state.can_send());
    }

    #[test]
    fn test_ui_state_session_failed() {
        let mut state = UiState::new();
        state.process_events(vec![ChatEvent::SessionFailed {
            message: "Session creation failed: HTTP 503".to_string(),
        }]);
        assert!(matches!(state.session, SessionStatus::Failed(_)));
        state.input_text = "hi".to_string();
        assert!(!state.can_send());

        // A later turn end must not hide the failure
        state.process_events(vec![ChatEvent::TurnEnd { turn_id: 1 }]);
        assert_eq!(state.status_text, "Session unavailable");
    }

    #[test]
    fn test_ui_state_full_turn_lifecycle() {
        let mut state = ready_state();

        state.process_events(vec![
            ChatEvent::UserMessage { message: ChatMessage::user("sales last week?") },
            ChatEvent::TurnStart { turn_id: 1 },
        ]);
        assert_eq!(state.phase, TurnPhase::Sending);
        assert!(state.is_busy());
        assert_eq!(state.messages.len(), 1);

        state.process_events(vec![
            ChatEvent::StreamOpened { turn_id: 1 },
            ChatEvent::ThinkingDelta { text: "checking".to_string() },
            ChatEvent::ContentDelta { text: "Sales ".to_string() },
            ChatEvent::CommandExecuted {
                kind: "SET_DATE_RANGE".to_string(),
                label: "date range set to last 7 days".to_string(),
            },
            ChatEvent::ContentDelta { text: "rose.".to_string() },
        ]);
        assert_eq!(state.phase, TurnPhase::Streaming);
        assert_eq!(state.streaming_text, "Sales rose.");
        assert_eq!(state.thinking_text, "checking");
        assert_eq!(state.status_text, "Dashboard: date range set to last 7 days");

        state.process_events(vec![
            ChatEvent::MessageCommitted { message: ChatMessage::assistant("Sales rose.") },
            ChatEvent::TurnEnd { turn_id: 1 },
        ]);
        assert!(!state.is_busy());
        assert_eq!(state.status_text, "Ready");
        assert_eq!(state.messages.len(), 2);
        assert!(state.streaming_text.is_empty());
        assert!(state.thinking_text.is_empty());
        assert!(state.can_regenerate());
    }

    #[test]
    fn test_ui_state_cancel_clears_live_text() {
        let mut state = ready_state();
        state.process_events(vec![
            ChatEvent::TurnStart { turn_id: 2 },
            ChatEvent::ContentDelta { text: "partial".to_string() },
            ChatEvent::TurnCancelled { turn_id: 2 },
            ChatEvent::TurnEnd { turn_id: 2 },
        ]);
        assert!(state.streaming_text.is_empty());
        assert!(!state.is_busy());
        assert_eq!(state.notices.len(), 1);
        assert_eq!(state.notices[0].level, NoticeLevel::Info);
    }

    #[test]
    fn test_ui_state_history_truncated() {
        let mut state = ready_state();
        state.process_events(vec![
            ChatEvent::UserMessage { message: ChatMessage::user("a") },
            ChatEvent::MessageCommitted { message: ChatMessage::assistant("b") },
            ChatEvent::HistoryTruncated { len: 0 },
        ]);
        assert!(state.messages.is_empty());
        assert!(!state.can_regenerate());
    }

    #[test]
    fn test_ui_state_auth_expired_and_reset() {
        let mut state = ready_state();
        state.process_events(vec![
            ChatEvent::UserMessage { message: ChatMessage::user("a") },
            ChatEvent::AuthExpired,
        ]);
        assert!(state.auth_expired);

        state.process_events(vec![ChatEvent::Reset]);
        assert!(!state.auth_expired);
        assert!(state.messages.is_empty());
        assert_eq!(state.session, SessionStatus::Connecting);
    }

    #[test]
    fn test_ui_state_notices_capped() {
        let mut state = UiState::new();
        for i in 0..(MAX_NOTICES + 3) {
            state.process_events(vec![ChatEvent::Notification {
                level: NoticeLevel::Warning,
                message: format!("notice {}", i),
            }]);
        }
        assert_eq!(state.notices.len(), MAX_NOTICES);
        assert_eq!(state.notices[0].message, "notice 3");

        state.dismiss_notice(0);
        state.dismiss_notice(99);
        assert_eq!(state.notices.len(), MAX_NOTICES - 1);
    }

    #[test]
    fn test_ui_state_default() {
        let state = UiState::default();
        assert!(state.messages.is_empty());
        assert!(!state.is_busy());
    }

    // ─── Shop id parsing ─────────────────────────────────────

    #[test]
    fn test_parse_shop_ids() {
        assert_eq!(parse_shop_ids(""), Some(vec![]));
        assert_eq!(parse_shop_ids("7"), Some(vec![7]));
        assert_eq!(parse_shop_ids("1, 2,3  4"), Some(vec![1, 2, 3, 4]));
        assert_eq!(parse_shop_ids("1,"), Some(vec![1]));
        assert_eq!(parse_shop_ids("1, x"), None);
    }

    #[test]
    fn test_scope_to_input() {
        assert_eq!(scope_to_input(&ShopScope::All), "");
        assert_eq!(scope_to_input(&ShopScope::Single(4)), "4");
        assert_eq!(scope_to_input(&ShopScope::Many(vec![1, 2])), "1, 2");
    }

    // ─── Settings form ───────────────────────────────────────

    #[test]
    fn test_settings_form_edits_stay_in_draft() {
        let applied = ClientConfig::default();
        let mut form = SettingsForm::new(&applied);
        assert!(!form.is_dirty(&applied));

        form.scope_input = "3, 5".to_string();
        assert!(form.sync_scope());
        form.draft.session_path = "/v2/sessions".to_string();

        assert_eq!(form.draft.shop_scope, ShopScope::Many(vec![3, 5]));
        assert!(form.is_dirty(&applied));
        assert_eq!(applied, ClientConfig::default());
    }

    #[test]
    fn test_settings_form_bad_scope_keeps_draft_scope() {
        let applied = ClientConfig {
            shop_scope: ShopScope::Single(4),
            ..ClientConfig::default()
        };
        let mut form = SettingsForm::new(&applied);
        assert_eq!(form.scope_input, "4");

        form.scope_input = "4, x".to_string();
        assert!(!form.sync_scope());
        assert_eq!(form.draft.shop_scope, ShopScope::Single(4));
    }

    #[test]
    fn test_settings_form_reset_discards_edits() {
        let applied = ClientConfig::default();
        let mut form = SettingsForm::new(&applied);
        form.scope_input = "9".to_string();
        form.sync_scope();
        form.draft.request_timeout_ms = 2_000;

        form.reset(&applied);
        assert!(!form.is_dirty(&applied));
        assert_eq!(form.scope_input, scope_to_input(&applied.shop_scope));
        assert!(form.feedback.is_none());
    }

    // ─── Dashboard summary ───────────────────────────────────

    #[test]
    fn test_summary_rows() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut state = DashboardState::initial(today);
        state.selected_shops = vec![1, 2];
        state.metric = Metric::Orders;
        state.focus = Some(FocusedSku { sku: Some("SKU-1".to_string()), product_id: None });

        let rows = summary_rows(&state, Some(RefreshSignal { seq: 3, force: true }));
        let value = |name: &str| {
            rows.iter()
                .find(|(label, _)| *label == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(value("Dates"), "2024-05-16 → 2024-06-15");
        assert_eq!(value("Shops"), "1, 2");
        assert_eq!(value("Metric"), "Orders");
        assert_eq!(value("Focus"), "SKU-1");
        assert_eq!(value("Refresh"), "#3 (forced)");
    }

    #[test]
    fn test_summary_rows_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let rows = summary_rows(&DashboardState::initial(today), None);
        assert!(rows.contains(&("Shops", "All shops".to_string())));
        assert!(rows.contains(&("Focus", "None".to_string())));
        assert!(rows.contains(&("Refresh", "Never".to_string())));
    }
}
