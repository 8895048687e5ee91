//! Copying text (new order codes) for the operator.
//!
//! The system clipboard is tried first. Headless sessions and SSH shells have
//! none, so the text is then handed to the terminal as an OSC 52 sequence,
//! which most modern terminal emulators forward to the local clipboard.

use std::{
    io::{self, Write},
    time::Duration,
};
#[cfg(target_os = "linux")]
use std::time::Instant;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("system clipboard unavailable: {0}")]
    System(String),
    #[error("failed to write terminal clipboard sequence: {0}")]
    Terminal(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMethod {
    System,
    Terminal,
}

pub trait ClipboardBackend {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// How long the process keeps serving the selection on Linux when no
/// clipboard manager takes it over first. X11 clipboards live only as long
/// as their owner, and this binary exits right after copying.
pub const DEFAULT_CLIPBOARD_HOLD: Duration = Duration::from_secs(10);

pub struct SystemClipboard {
    hold: Duration,
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new(DEFAULT_CLIPBOARD_HOLD)
    }
}

impl SystemClipboard {
    pub fn new(hold: Duration) -> Self {
        Self { hold }
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }
}

fn system_error(err: arboard::Error) -> ClipboardError {
    ClipboardError::System(err.to_string())
}

impl ClipboardBackend for SystemClipboard {
    #[cfg(target_os = "linux")]
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        use arboard::SetExtLinux;

        let mut clipboard = arboard::Clipboard::new().map_err(system_error)?;
        // Returns early once a clipboard manager (or any other client) owns
        // the selection.
        clipboard
            .set()
            .wait_until(Instant::now() + self.hold)
            .text(text.to_string())
            .map_err(system_error)
    }

    #[cfg(not(target_os = "linux"))]
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = arboard::Clipboard::new().map_err(system_error)?;
        clipboard.set_text(text.to_string()).map_err(system_error)
    }
}

pub struct TerminalClipboard<W: Write> {
    out: W,
}

impl<W: Write> TerminalClipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ClipboardBackend for TerminalClipboard<W> {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        write!(self.out, "\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))?;
        self.out.flush()?;
        Ok(())
    }
}

/// Returns `None` for empty text, otherwise which backend took the copy.
pub fn copy_with_fallback(
    primary: &mut dyn ClipboardBackend,
    fallback: &mut dyn ClipboardBackend,
    text: &str,
) -> Result<Option<CopyMethod>, ClipboardError> {
    if text.is_empty() {
        return Ok(None);
    }
    match primary.set_text(text) {
        Ok(()) => {
            debug!("copied via system clipboard");
            Ok(Some(CopyMethod::System))
        }
        Err(err) => {
            warn!(error = %err, "falling back to terminal clipboard");
            fallback.set_text(text)?;
            Ok(Some(CopyMethod::Terminal))
        }
    }
}

pub fn copy_text(text: &str) -> Result<Option<CopyMethod>, ClipboardError> {
    copy_with_fallback(
        &mut SystemClipboard::default(),
        &mut TerminalClipboard::new(io::stderr()),
        text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingClipboard;

    impl ClipboardBackend for FailingClipboard {
        fn set_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
            Err(ClipboardError::System("no display".into()))
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        copied: Vec<String>,
    }

    impl ClipboardBackend for RecordingClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.copied.push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn primary_success_skips_fallback() {
        let mut primary = RecordingClipboard::default();
        let mut fallback = RecordingClipboard::default();

        let method = copy_with_fallback(&mut primary, &mut fallback, "X7K2").expect("copy");
        assert_eq!(method, Some(CopyMethod::System));
        assert_eq!(primary.copied, vec!["X7K2".to_string()]);
        assert!(fallback.copied.is_empty());
    }

    #[test]
    fn failing_primary_uses_terminal_sequence() {
        let mut fallback = TerminalClipboard::new(Vec::new());

        let method =
            copy_with_fallback(&mut FailingClipboard, &mut fallback, "X7K2").expect("copy");
        assert_eq!(method, Some(CopyMethod::Terminal));
        let written = String::from_utf8(fallback.into_inner()).expect("utf8");
        assert_eq!(written, "\x1b]52;c;WDdLMg==\x07");
    }

    #[test]
    fn system_clipboard_outlives_the_copy_call() {
        assert_eq!(SystemClipboard::default().hold(), DEFAULT_CLIPBOARD_HOLD);
        assert!(DEFAULT_CLIPBOARD_HOLD >= Duration::from_secs(1));
        assert_eq!(
            SystemClipboard::new(Duration::from_millis(250)).hold(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn empty_text_is_not_copied() {
        let mut primary = RecordingClipboard::default();
        let method =
            copy_with_fallback(&mut primary, &mut FailingClipboard, "").expect("no-op");
        assert_eq!(method, None);
        assert!(primary.copied.is_empty());
    }
}
