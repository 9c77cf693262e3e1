use std::sync::{Arc, Mutex};

use viridian_core::transcript::Transcript;
use viridian_core::types::{EntryId, Sender};

use crate::traits::ChatView;

/// Handle over a transient transcript entry.
///
/// The entry is removed exactly once: by [`TransientIndicator::dismiss`], or
/// on drop if the owning operation bailed out early.
pub struct TransientIndicator {
    view: Arc<dyn ChatView>,
    id: Option<EntryId>,
}

impl TransientIndicator {
    pub fn show(view: &Arc<dyn ChatView>, sender: Sender, text: &str) -> Self {
        let id = view.append_transient(sender, text);
        Self {
            view: view.clone(),
            id: Some(id),
        }
    }

    pub fn id(&self) -> Option<EntryId> {
        self.id
    }

    pub fn dismiss(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            if !self.view.remove(id) {
                log::warn!("transient entry {:?} was already gone", id);
            }
        }
    }
}

impl Drop for TransientIndicator {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for TransientIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransientIndicator")
            .field("id", &self.id)
            .finish()
    }
}

/// In-memory view, used by tests and headless callers.
#[derive(Debug, Default)]
pub struct MemoryView {
    transcript: Mutex<Transcript>,
    pub removals: Mutex<Vec<EntryId>>,
    pub input_clears: Mutex<usize>,
}

impl MemoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Transcript {
        lock(&self.transcript).clone()
    }

    pub fn messages(&self) -> Vec<(String, Sender)> {
        lock(&self.transcript).messages()
    }
}

impl ChatView for MemoryView {
    fn append(&self, sender: Sender, text: &str) -> EntryId {
        lock(&self.transcript).append(sender, text)
    }

    fn append_transient(&self, sender: Sender, text: &str) -> EntryId {
        lock(&self.transcript).append_transient(sender, text)
    }

    fn remove(&self, id: EntryId) -> bool {
        let removed = lock(&self.transcript).remove(id);
        if removed {
            lock(&self.removals).push(id);
        }
        removed
    }

    fn clear_input(&self) {
        *lock(&self.input_clears) += 1;
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}
