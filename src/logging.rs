//! Logging utilities for llm-debate
//!
//! Re-exports tracing macros with log_* naming convention for consistency,
//! plus a helper for keeping prompt and body previews short in log fields.

pub(crate) use tracing::{debug as log_debug, error as log_error, info as log_info, warn as log_warn};

/// Maximum number of characters of a prompt or body placed in a log field
pub(crate) const PREVIEW_CHARS: usize = 200;

/// First [`PREVIEW_CHARS`] characters of `text`, with an ellipsis when cut
pub(crate) fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}
