//! Text-producing collaborator for report documents.

use std::path::Path;

/// Supplies the raw text of a report document.
///
/// Document parsing (PDF and friends) lives outside this crate.
/// Implementations return the concatenated text, or an empty string when
/// the document is unreadable; the pipeline treats empty text as "no
/// claims possible".
pub trait TextSource: Send + Sync {
    fn extract(&self, path: &Path) -> String;
}

/// Reads already-extracted plain-text reports from disk.
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn extract(&self, path: &Path) -> String {
        match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read report text");
                String::new()
            }
        }
    }
}
