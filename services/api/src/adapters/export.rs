//! services/api/src/adapters/export.rs
//!
//! The note download renderer. Document rendering is an external concern;
//! this adapter produces a plain-text export behind the `NoteExportService`
//! port so a richer renderer can be swapped in without touching handlers.

use studyhub_core::domain::Note;
use studyhub_core::ports::{NoteExportService, PortResult};

/// Renders a note as a plain-text document.
#[derive(Clone, Default)]
pub struct TextExporter;

impl TextExporter {
    pub fn new() -> Self {
        Self
    }
}

impl NoteExportService for TextExporter {
    fn render(&self, note: &Note) -> PortResult<Vec<u8>> {
        let underline = "=".repeat(note.title.chars().count().max(1));
        let document = format!(
            "{}\n{}\n\n{}\n\nCreated: {}\n",
            note.title,
            underline,
            note.body,
            note.created_at.format("%Y-%m-%d %H:%M UTC")
        );
        Ok(document.into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}
