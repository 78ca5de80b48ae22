#[cfg(test)]
mod tests {
    use crate::chat::*;
    use crate::event::*;
    use crate::config::*;
    use crate::error::*;

    fn sample_message() -> Message {
        Message {
            id: 1,
            chat_id: 7,
            role: "user".to_string(),
            content: "hi".to_string(),
            created_at: "2025-05-01T12:00:00.000Z".to_string(),
        }
    }

    // ─── Record Tests ────────────────────────────────────────

    #[test]
    fn test_chat_uses_camel_case_fields() {
        let chat = Chat {
            id: 3,
            title: DEFAULT_CHAT_TITLE.to_string(),
            created_at: "2025-05-01T12:00:00.000Z".to_string(),
        };
        let json = serde_json::to_value(&chat).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["title"], "New Chat");
        assert_eq!(json["createdAt"], "2025-05-01T12:00:00.000Z");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_message_uses_camel_case_fields() {
        let json = serde_json::to_value(sample_message()).unwrap();
        assert_eq!(json["chatId"], 7);
        assert_eq!(json["role"], "user");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_message_parses_js_shape() {
        let js = r#"{"id":2,"chatId":1,"role":"assistant","content":"hello","createdAt":"2025-05-01T12:00:01.000Z"}"#;
        let msg: Message = serde_json::from_str(js).unwrap();
        assert_eq!(msg.id, 2);
        assert_eq!(msg.chat_id, 1);
        assert_eq!(msg.role, "assistant");
    }

    #[test]
    fn test_chat_turn_from_message_drops_metadata() {
        let turn = ChatTurn::from(&sample_message());
        assert_eq!(turn, ChatTurn::user("hi"));
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn test_chat_turn_constructors() {
        assert_eq!(ChatTurn::system("x").role, "system");
        assert_eq!(ChatTurn::user("x").role, "user");
        assert_eq!(ChatTurn::assistant("x").role, "assistant");
        assert_eq!(ChatTurn::new("narrator", "x").role, "narrator");
    }

    #[test]
    fn test_request_body_from_history_keeps_order() {
        let mut second = sample_message();
        second.id = 2;
        second.role = "assistant".to_string();
        second.content = "hello there".to_string();

        let body = ChatRequestBody::from_history(&[sample_message(), second]);
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0], ChatTurn::user("hi"));
        assert_eq!(body.messages[1], ChatTurn::assistant("hello there"));

        let json = serde_json::to_value(&body).unwrap();
        assert!(json["messages"].is_array());
    }

    #[test]
    fn test_now_timestamp_format() {
        let ts = now_timestamp();
        // 2025-05-01T12:00:00.000Z
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_now_timestamp_is_monotonic_as_string() {
        let a = now_timestamp();
        let b = now_timestamp();
        assert!(a <= b);
    }

    // ─── Event Tests ─────────────────────────────────────────

    #[test]
    fn test_store_event_tagged_serialization() {
        let event = StoreEvent::MessageSaved { chat_id: 1, message_id: 4 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "MessageSaved");
        assert_eq!(json["messageId"], 4);
        assert_eq!(json["chatId"], 1);
    }

    #[test]
    fn test_store_event_chat_id() {
        assert_eq!(StoreEvent::ChatCreated { chat_id: 1 }.chat_id(), 1);
        assert_eq!(
            StoreEvent::ChatRenamed { chat_id: 2, title: "t".to_string() }.chat_id(),
            2
        );
        assert_eq!(StoreEvent::ChatDeleted { chat_id: 3 }.chat_id(), 3);
        assert_eq!(
            StoreEvent::MessageSaved { chat_id: 4, message_id: 9 }.chat_id(),
            4
        );
    }

    // ─── Config Tests ────────────────────────────────────────

    #[test]
    fn test_default_proxy_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.model, "gpt-4.1-nano");
        assert_eq!(config.system_prompt, "You are a helpful assistant named Lexi.");
        assert_eq!(config.max_duration_secs, 30);
        assert_eq!(config.max_duration_ms(), 30_000);
        assert!(config.smoothing.enabled);
        assert_eq!(config.smoothing.delay_ms, 10);
    }

    #[test]
    fn test_default_client_config() {
        let config = ClientConfig::default();
        assert_eq!(config.proxy_url, "/api/chat");
        assert_eq!(config.storage.backend, StorageBackendType::Auto);
        assert_eq!(config.storage.db_name, "chatApp");
    }

    #[test]
    fn test_client_config_partial_options() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"storage":{"backend":"Memory"}}"#).unwrap();
        assert_eq!(config.storage.backend, StorageBackendType::Memory);
        assert_eq!(config.storage.db_name, "chatApp");
        assert_eq!(config.proxy_url, "/api/chat");

        let config: ClientConfig = serde_json::from_str(r#"{"proxyUrl":"/chat"}"#).unwrap();
        assert_eq!(config.proxy_url, "/chat");
    }

    #[test]
    fn test_proxy_config_serialization_roundtrip() {
        let config = ProxyConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ProxyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.model, config.model);
        assert_eq!(back.smoothing, config.smoothing);
    }

    // ─── Error Tests ─────────────────────────────────────────

    #[test]
    fn test_error_display() {
        let err = ChatError::Storage("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Storage error: quota exceeded");

        let err = ChatError::Timeout(30_000);
        assert_eq!(err.to_string(), "Timeout after 30000ms");

        let err = ChatError::SchemaMismatch { found: 2, supported: 1 };
        assert_eq!(
            err.to_string(),
            "Schema version 2 is newer than supported version 1"
        );

        let err = ChatError::MissingCredential;
        assert_eq!(err.to_string(), "No API credential configured");
    }

    #[test]
    fn test_upstream_error_display() {
        let err = ChatError::upstream(Some(401), "bad credentials");
        assert_eq!(err.to_string(), "Upstream error (HTTP 401): bad credentials");

        let err = ChatError::upstream(None, "stream reset");
        assert_eq!(err.to_string(), "Upstream error: stream reset");
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{{invalid}}").unwrap_err();
        let err: ChatError = serde_err.into();
        assert!(matches!(err, ChatError::Serialization(_)));
    }
}
