//! CSRF token bookkeeping.
//!
//! A token can come from three places. In priority order: the value synced
//! from the last response header, a process-wide value set by the host, and
//! the page meta tag captured at start-up. A refreshed token is written into
//! all three so later readers agree.

use std::sync::{PoisonError, RwLock};

use tracing::debug;

/// Request header carrying the token on mutating requests.
pub const REQUEST_HEADER: &str = "X-CSRFToken";
/// Response header that may carry a refreshed token.
pub const RESPONSE_HEADER: &str = "X-CSRF-Token";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Slots {
    synced: Option<String>,
    global: Option<String>,
    meta: Option<String>,
}

#[derive(Debug, Default)]
pub struct CsrfTokens {
    slots: RwLock<Slots>,
}

fn non_blank(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}

impl CsrfTokens {
    /// Start with only the meta-tag token known.
    pub fn from_meta(token: Option<String>) -> Self {
        Self {
            slots: RwLock::new(Slots {
                meta: non_blank(token),
                ..Default::default()
            }),
        }
    }

    /// Token to send, by priority.
    pub fn current(&self) -> Option<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .synced
            .clone()
            .or_else(|| slots.global.clone())
            .or_else(|| slots.meta.clone())
    }

    pub fn set_global(&self, token: Option<String>) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.global = non_blank(token);
    }

    /// Record a refreshed token from a response. Blank tokens are ignored.
    pub fn sync(&self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            return;
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if slots.synced.as_deref() == Some(token) {
            return;
        }
        debug!("csrf token refreshed");
        slots.synced = Some(token.to_string());
        slots.global = Some(token.to_string());
        slots.meta = Some(token.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order() {
        let tokens = CsrfTokens::from_meta(Some("meta".into()));
        assert_eq!(tokens.current().as_deref(), Some("meta"));
        tokens.set_global(Some("global".into()));
        assert_eq!(tokens.current().as_deref(), Some("global"));
        tokens.sync("header");
        assert_eq!(tokens.current().as_deref(), Some("header"));
    }

    #[test]
    fn sync_writes_every_slot() {
        let tokens = CsrfTokens::from_meta(Some("old".into()));
        tokens.sync("fresh");
        let slots = tokens.slots.read().unwrap().clone();
        assert_eq!(slots.synced.as_deref(), Some("fresh"));
        assert_eq!(slots.global.as_deref(), Some("fresh"));
        assert_eq!(slots.meta.as_deref(), Some("fresh"));
    }

    #[test]
    fn blank_values_ignored() {
        let tokens = CsrfTokens::from_meta(Some("  ".into()));
        assert!(tokens.current().is_none());
        tokens.sync("");
        assert!(tokens.current().is_none());
    }
}
