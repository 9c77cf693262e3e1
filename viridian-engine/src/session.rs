use std::sync::Mutex;

use viridian_core::types::SessionId;

/// Session id owned by one controller for its whole lifetime.
///
/// Set once; never renewed.
#[derive(Debug, Default)]
pub struct SessionState {
    id: Mutex<Option<SessionId>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<SessionId> {
        self.guard().clone()
    }

    pub fn is_active(&self) -> bool {
        self.guard().is_some()
    }

    /// Stores `id` unless a session already exists. Returns the session in effect.
    pub fn set_once(&self, id: SessionId) -> SessionId {
        let mut guard = self.guard();
        guard.get_or_insert(id).clone()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Option<SessionId>> {
        match self.id.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_session_wins() {
        let s = SessionState::new();
        assert!(!s.is_active());
        assert_eq!(s.set_once(SessionId::new("a")), SessionId::new("a"));
        assert_eq!(s.set_once(SessionId::new("b")), SessionId::new("a"));
        assert_eq!(s.current(), Some(SessionId::new("a")));
    }
}
