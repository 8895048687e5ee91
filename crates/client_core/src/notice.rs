//! Transient error/success messages: one slot, latest wins, each new notice
//! re-arms the expiry.

use std::time::Duration;

pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct NoticeSlot {
    current: Option<Notice>,
    generation: u64,
}

impl NoticeSlot {
    /// Replaces the current notice and returns the generation an expiry
    /// timer must present to clear it.
    pub fn post(&mut self, notice: Notice) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.current = Some(notice);
        self.generation
    }

    /// Clears the notice only if no newer one was posted since `generation`.
    pub fn expire(&mut self, generation: u64) -> bool {
        if self.generation != generation || self.current.is_none() {
            return false;
        }
        self.current = None;
        true
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    pub fn text_of(&self, kind: NoticeKind) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|notice| notice.kind == kind)
            .map(|notice| notice.text.as_str())
    }
}
