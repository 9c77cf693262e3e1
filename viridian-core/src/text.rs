use regex::Regex;
use std::sync::OnceLock;

// User-visible notices rendered into the transcript.
pub const NOTICE_SESSION_FAILED: &str = "⚠️ Could not start session";
pub const NOTICE_NO_REPLY: &str = "⚠️ No reply from server";
pub const NOTICE_DISPATCH_FAILED: &str = "⚠️ Something went wrong. Please try again.";
pub const NOTICE_BUSY: &str = "⚠️ Still waiting on the last reply. Please try again.";
pub const NOTICE_LISTENING: &str = "🎙 Listening… speak now";
pub const NOTICE_NOT_CAUGHT: &str = "⚠️ I didn't catch that";
pub const NOTICE_RECOGNITION_FAILED: &str = "⚠️ Could not understand audio";
pub const NOTICE_RECOGNITION_UNSUPPORTED: &str = "❌ Speech recognition not supported";
pub const NOTICE_NO_AUDIO: &str = "⚠️ No audio captured from the microphone.";
pub const NOTICE_UPLOAD_FAILED: &str = "⚠️ Could not process audio";
pub const NOTICE_SUMMARY_PENDING: &str = "🧠 Generating session summary…";
pub const NOTICE_SUMMARY_MISSING: &str = "⚠️ Summary not available yet";
pub const NOTICE_SUMMARY_FAILED: &str = "⚠️ Failed to generate summary";

pub fn typing_notice(bot_name: &str) -> String {
    let name = bot_name.trim();
    if name.is_empty() {
        "Typing…".into()
    } else {
        format!("{name} is typing…")
    }
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]{2,}").expect("valid whitespace regex"))
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Whole-string bracketed markers such as "[Could not understand audio]".
    RE.get_or_init(|| Regex::new(r"^\s*\[[^\]]*\]\s*$").expect("valid placeholder regex"))
}

/// Trims user input. Returns `None` when nothing sendable is left.
pub fn normalize_input(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Cleans up a finalized speech transcript before it is sent.
///
/// Bracketed server placeholders count as "nothing heard".
pub fn normalize_transcript(raw: &str) -> Option<String> {
    if placeholder_re().is_match(raw) {
        return None;
    }
    let collapsed = whitespace_re().replace_all(raw, " ");
    normalize_input(&collapsed)
}

/// Short single-line preview for log records.
pub fn preview_text(text: &str) -> String {
    const MAX: usize = 60;
    let flat = text.trim().replace('\n', " ");
    if flat.chars().count() <= MAX {
        return flat;
    }

    flat.chars().take(MAX).collect::<String>() + "…"
}
