//! Session identity
//!
//! Each recording session carries a unique id; virtual filesystem entry
//! names derive from it so overlapping sessions can never collide on names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::media::MediaType;

/// Unique id for one capture/convert session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Virtual filesystem entry names for one session's conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsNames {
    pub input: String,
    pub output: String,
}

impl VfsNames {
    /// Derive entry names from the session id and the source/target types
    pub fn for_session(id: SessionId, source: &MediaType, target: &MediaType) -> Self {
        Self {
            input: format!("in-{}.{}", id, source.container.extension()),
            output: format!("out-{}.{}", id, target.container.extension()),
        }
    }
}

/// What to do when a new session starts while a conversion is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Fail the new start request
    Reject,
    /// Wait for the in-flight conversion to finish
    Queue,
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        Self::Reject
    }
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapPolicy::Reject => write!(f, "reject"),
            OverlapPolicy::Queue => write!(f, "queue"),
        }
    }
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(Self::Reject),
            "queue" => Ok(Self::Queue),
            other => Err(format!(
                "invalid overlap policy \"{}\" (expected reject or queue)",
                other
            )),
        }
    }
}
