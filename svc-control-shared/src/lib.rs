pub mod format;
pub mod health;
pub mod settings;
pub mod status;

use serde::{Deserialize, Serialize};

/// Plain acknowledgment returned by fire-and-forget commands.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ReadyState {
    pub ready: bool,
}
