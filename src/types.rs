//! Core identifiers and status values shared across the tracker and exporter.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Opaque chapter identifier assigned by the backend. Doubles as the session id.
    ChapterId
);
string_id!(
    /// Classroom identifier.
    ClassroomId
);
string_id!(
    /// Story idea identifier (e.g. `idea_1`).
    IdeaId
);

/// Lifecycle status of a chapter generation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Pending,
    Ready,
    Failed,
    TimedOut,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Ready => "ready",
            SessionStatus::Failed => "failed",
            SessionStatus::TimedOut => "timed-out",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Pending)
    }

    /// Map a backend status string onto a session status.
    ///
    /// The backend writes `generating` while panels are produced and `ready`
    /// once the chapter is complete. Unknown values count as still pending.
    pub fn from_remote(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ready" | "completed" | "complete" => SessionStatus::Ready,
            "failed" | "error" => SessionStatus::Failed,
            _ => SessionStatus::Pending,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
