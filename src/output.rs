//! Progress events and their CLI formatting.
//!
//! The walker reports what it is doing as [`ScanEvent`]s sent over an mpsc
//! channel; the binary drains the channel on a printer thread. Events carry
//! the tree depth they happened at, so the printed log reads as an outline:
//!
//! ```text
//! 2024-05-01T10:00:00.000001   [walking]      photos
//! 2024-05-01T10:00:00.000120   [partial cache] photos
//! 2024-05-01T10:00:00.000300   |--[walking]      2020
//! 2024-05-01T10:00:00.000310   |  |--[metainfo]     beach.jpg
//! 2024-05-01T10:00:00.091000   |  |--[thumbing]     beach.jpg -> 75px, square
//! 2024-05-01T10:00:00.140000   |--[caching]      2020
//! ```
//!
//! [`format_event`] is pure, for testability; [`print_event`] adds the
//! timestamp and writes to stdout.

use chrono::Local;
use std::sync::mpsc::Sender;

/// What happened. Each kind prints as a fixed `[category]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Walking,
    AccessDenied,
    FullCache,
    PartialCache,
    CorruptCache,
    UnicodeError,
    CacheHit,
    Metainfo,
    Thumbing,
    Unreadable,
    SaveFailure,
    Caching,
    Empty,
    Collision,
    Cleanup,
    Complete,
    Keyboard,
}

impl EventKind {
    pub fn category(self) -> &'static str {
        match self {
            EventKind::Walking => "walking",
            EventKind::AccessDenied => "access denied",
            EventKind::FullCache => "full cache",
            EventKind::PartialCache => "partial cache",
            EventKind::CorruptCache => "corrupt cache",
            EventKind::UnicodeError => "unicode error",
            EventKind::CacheHit => "cache hit",
            EventKind::Metainfo => "metainfo",
            EventKind::Thumbing => "thumbing",
            EventKind::Unreadable => "unreadable",
            EventKind::SaveFailure => "save failure",
            EventKind::Caching => "caching",
            EventKind::Empty => "empty",
            EventKind::Collision => "collision",
            EventKind::Cleanup => "cleanup",
            EventKind::Complete => "complete",
            EventKind::Keyboard => "keyboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub depth: usize,
    pub kind: EventKind,
    pub text: String,
}

impl ScanEvent {
    pub fn new(depth: usize, kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            depth,
            kind,
            text: text.into(),
        }
    }
}

/// Optional event channel. A disconnected or absent receiver is not an error.
#[derive(Debug, Clone, Default)]
pub struct EventSink(Option<Sender<ScanEvent>>);

impl EventSink {
    pub fn new(sender: Sender<ScanEvent>) -> Self {
        Self(Some(sender))
    }

    /// A sink that drops every event.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn emit(&self, depth: usize, kind: EventKind, text: impl Into<String>) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(ScanEvent::new(depth, kind, text));
        }
    }
}

/// Format an event without its timestamp.
///
/// `"  |"` per depth level, then `"  "` at the root or `"--"` below it, then
/// the bracketed category padded so texts line up.
pub fn format_event(event: &ScanEvent) -> String {
    let sep = if event.depth == 0 { "  " } else { "--" };
    let category = event.kind.category();
    let pad = 14usize.saturating_sub(category.len()).max(1);
    format!(
        "{}{}[{}]{}{}",
        "  |".repeat(event.depth),
        sep,
        category,
        " ".repeat(pad),
        event.text
    )
}

/// Print an event to stdout, prefixed with the local time.
pub fn print_event(event: &ScanEvent) {
    println!(
        "{} {}",
        Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
        format_event(event)
    );
}
