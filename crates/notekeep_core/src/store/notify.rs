//! Operation-result notification channel.
//!
//! # Responsibility
//! - Carry non-fatal outcome reports from the store to its host.
//! - Provide a log-backed default so reports are never silently lost.
//!
//! # Invariants
//! - Notifiers must not panic; the store calls them on every operation.

use log::{info, warn};
use std::fmt::{Display, Formatter};

/// Store operation a notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Update,
    Delete,
    Undo,
    Redo,
    Load,
    Save,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Load => "load",
            Self::Save => "save",
        }
    }
}

/// Outcome class of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// One operation-result notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub operation: Operation,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.level {
            NoticeLevel::Success => write!(f, "{}", self.message),
            NoticeLevel::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Receiver of store notices.
pub trait Notifier {
    fn notify(&self, notice: &Notice);
}

/// Default notifier: writes each notice as a structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Success => info!(
                "event=notice module=store op={} status=ok message={}",
                notice.operation.as_str(),
                notice.message
            ),
            NoticeLevel::Error => warn!(
                "event=notice module=store op={} status=error message={}",
                notice.operation.as_str(),
                notice.message
            ),
        }
    }
}

impl<F> Notifier for F
where
    F: Fn(&Notice),
{
    fn notify(&self, notice: &Notice) {
        self(notice)
    }
}
