#[cfg(test)]
mod tests {
    use crate::{Inner, OpenDb};
    use futures::future::FutureExt;
    use lexi_types::config::ClientConfig;
    use lexi_types::ChatError;

    fn failed_open() -> OpenDb {
        futures::future::ready(Err(ChatError::Storage("blocked".to_string())))
            .boxed_local()
            .shared()
    }

    fn slot_holds(inner: &Inner, open: &OpenDb) -> bool {
        inner.db.borrow().as_ref().is_some_and(|current| current.ptr_eq(open))
    }

    #[test]
    fn test_failed_open_clears_its_own_slot() {
        let inner = Inner::new(ClientConfig::default());
        let failed = failed_open();
        *inner.db.borrow_mut() = Some(failed.clone());

        inner.forget_open(&failed);
        assert!(inner.db.borrow().is_none());
    }

    #[test]
    fn test_late_failure_keeps_newer_attempt() {
        let inner = Inner::new(ClientConfig::default());
        let stale = failed_open();
        let retry = failed_open();
        *inner.db.borrow_mut() = Some(retry.clone());

        inner.forget_open(&stale);
        assert!(slot_holds(&inner, &retry));
    }

    #[test]
    fn test_inner_uses_configured_proxy_url() {
        let config = ClientConfig {
            proxy_url: "/chat".to_string(),
            ..ClientConfig::default()
        };
        let inner = Inner::new(config);
        assert_eq!(inner.client.url(), "/chat");
        assert!(!inner.events.has_pending());
    }
}
