use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use viridian_core::transcript::Transcript;
use viridian_core::types::{EntryId, Sender};
use viridian_engine::traits::ChatView;

/// Prints transcript entries to stdout as they arrive.
///
/// Terminal output cannot be retracted, so transient entries are printed once
/// and only dropped from the mirrored transcript.
pub struct TerminalView {
    bot_name: String,
    transcript: Mutex<Transcript>,
}

impl TerminalView {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            transcript: Mutex::new(Transcript::default()),
        }
    }

    pub fn label(&self, sender: Sender) -> &str {
        match sender {
            Sender::User => "you",
            Sender::Bot => self.bot_name.as_str(),
            Sender::System => "..",
        }
    }

    pub fn format_entry(&self, sender: Sender, text: &str) -> String {
        let label = self.label(sender);
        let pad = " ".repeat(label.chars().count() + 2);
        // Continuation lines line up under the first.
        let body = text.lines().collect::<Vec<_>>().join(&format!("\n{pad}"));
        format!("{label}: {body}")
    }

    fn print(&self, sender: Sender, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", self.format_entry(sender, text));
        let _ = out.flush();
    }

    fn transcript(&self) -> MutexGuard<'_, Transcript> {
        match self.transcript.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ChatView for TerminalView {
    fn append(&self, sender: Sender, text: &str) -> EntryId {
        self.print(sender, text);
        self.transcript().append(sender, text)
    }

    fn append_transient(&self, sender: Sender, text: &str) -> EntryId {
        self.print(sender, text);
        self.transcript().append_transient(sender, text)
    }

    fn remove(&self, id: EntryId) -> bool {
        self.transcript().remove(id)
    }
}
