use crate::types::{EntryId, Sender};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub sender: Sender,
    pub text: String,

    // Indicator entries ("typing…", "listening…") that are removed later.
    pub transient: bool,
}

/// Ordered, render-only list of chat entries.
///
/// Entries are only ever appended; the single exception is removal of
/// transient entries. Nothing is evicted and nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sender: Sender, text: impl Into<String>) -> EntryId {
        self.push(sender, text.into(), false)
    }

    pub fn append_transient(&mut self, sender: Sender, text: impl Into<String>) -> EntryId {
        self.push(sender, text.into(), true)
    }

    fn push(&mut self, sender: Sender, text: String, transient: bool) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(Entry {
            id,
            sender,
            text,
            transient,
        });
        id
    }

    /// Removes a transient entry. Permanent entries and unknown ids are left alone.
    pub fn remove(&mut self, id: EntryId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(idx) if self.entries[idx].transient => {
                self.entries.remove(idx);
                true
            }
            _ => false,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn transient_count(&self) -> usize {
        self.entries.iter().filter(|e| e.transient).count()
    }

    /// `(text, sender)` pairs in display order.
    pub fn messages(&self) -> Vec<(String, Sender)> {
        self.entries
            .iter()
            .map(|e| (e.text.clone(), e.sender))
            .collect()
    }
}
