//! ICS file generation.
//!
//! This module renders an [`EventRecord`](crate::EventRecord) as an
//! RFC 5545 document. sked only writes calendar files; it never reads them.

mod generate;

pub use generate::{IcsGenerator, escape_text, fold_line};

use crate::filename;

/// A rendered calendar file and the name to offer it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarArtifact {
    pub content: String,
    pub file_name: String,
}

impl CalendarArtifact {
    pub const CONTENT_TYPE: &'static str = "text/calendar; charset=utf-8";

    /// `Content-Disposition` header value for downloads.
    pub fn content_disposition(&self) -> String {
        filename::content_disposition(&self.file_name)
    }
}
