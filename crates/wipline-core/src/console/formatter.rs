//! Status line formatting for work-in-progress slots

use unicode_width::UnicodeWidthChar;

use crate::constants::render::{FALLBACK_WIDTH, IDLE_TEXT, LINEAGE_SEPARATOR, LINE_PREFIX};
use crate::progress::{ProgressOperation, ProgressOperations};

/// Builds the text shown in a slot
///
/// An operation is shown with the messages of its lineage, outermost first:
/// `> :app > :app:compileJava > 12 files`. The build progress operation and
/// everything above it are left out.
#[derive(Debug, Clone)]
pub struct WorkInProgressFormatter {
    max_width: usize,
    idle_text: String,
}

impl Default for WorkInProgressFormatter {
    fn default() -> Self {
        Self::new(0, IDLE_TEXT)
    }
}

impl WorkInProgressFormatter {
    /// Formatter for a console `cols` wide (0 when unknown)
    ///
    /// The right-most column is never written to, since some consoles wrap
    /// the cursor onto the next line when it is.
    pub fn new(cols: u16, idle_text: impl Into<String>) -> Self {
        let max_width = if cols > 0 {
            usize::from(cols) - 1
        } else {
            FALLBACK_WIDTH
        };
        Self {
            max_width,
            idle_text: truncate_to_width(&idle_text.into(), max_width),
        }
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Placeholder for slots without an operation, already cut to width
    pub fn idle(&self) -> &str {
        &self.idle_text
    }

    /// Status line for `op`, or the idle text when its lineage has nothing
    /// to say
    pub fn format(&self, tree: &ProgressOperations, op: &ProgressOperation) -> String {
        let mut messages: Vec<&str> = tree
            .lineage(op)
            .take_while(|current| !current.is_build_progress())
            .filter_map(ProgressOperation::message)
            .collect();
        if messages.is_empty() {
            return self.idle_text.clone();
        }
        messages.reverse();

        let line = format!("{} {}", LINE_PREFIX, messages.join(LINEAGE_SEPARATOR));
        truncate_to_width(&line, self.max_width)
    }
}

/// Cut `text` to at most `max_width` display columns without splitting a
/// character
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end = text.len();
    for (idx, ch) in text.char_indices() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width > max_width {
            end = idx;
            break;
        }
        width += ch_width;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::progress::BUILD_PROGRESS_CATEGORY;
    use crate::events::OperationId;

    fn tree() -> ProgressOperations {
        let mut tree = ProgressOperations::new();
        tree.start(
            Some("Build".into()),
            Some("EXECUTING".into()),
            BUILD_PROGRESS_CATEGORY.into(),
            OperationId(1),
            None,
        );
        tree.start(
            Some(":app:compileJava".into()),
            None,
            "task".into(),
            OperationId(2),
            Some(OperationId(1)),
        );
        tree.start(
            None,
            Some("12 files".into()),
            "task".into(),
            OperationId(3),
            Some(OperationId(2)),
        );
        tree.start(None, None, "task".into(), OperationId(4), None);
        tree
    }

    #[test]
    fn test_format_joins_lineage_below_boundary() {
        let tree = tree();
        let formatter = WorkInProgressFormatter::new(120, IDLE_TEXT);
        let op = tree.get(OperationId(3)).unwrap();

        assert_eq!(formatter.format(&tree, op), "> :app:compileJava > 12 files");
    }

    #[test]
    fn test_format_without_message_is_idle() {
        let tree = tree();
        let formatter = WorkInProgressFormatter::default();
        let op = tree.get(OperationId(4)).unwrap();

        assert_eq!(formatter.format(&tree, op), "> IDLE");
        assert_eq!(formatter.idle(), "> IDLE");
    }

    #[test]
    fn test_format_trims_to_console_width() {
        let tree = tree();
        let formatter = WorkInProgressFormatter::new(11, IDLE_TEXT);
        let op = tree.get(OperationId(2)).unwrap();

        assert_eq!(formatter.max_width(), 10);
        assert_eq!(formatter.format(&tree, op), "> :app:com");
    }

    #[test]
    fn test_idle_text_trimmed_to_console_width() {
        let tree = tree();
        let formatter = WorkInProgressFormatter::new(6, "> waiting for work");
        let op = tree.get(OperationId(4)).unwrap();

        assert_eq!(formatter.idle(), "> wai");
        assert_eq!(formatter.format(&tree, op), "> wai");
    }

    #[test]
    fn test_unknown_width_falls_back() {
        assert_eq!(WorkInProgressFormatter::new(0, "idle").max_width(), FALLBACK_WIDTH);
    }

    #[test]
    fn test_truncate_respects_wide_characters() {
        assert_eq!(truncate_to_width("日本語", 5), "日本");
        assert_eq!(truncate_to_width("abc", 10), "abc");
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
