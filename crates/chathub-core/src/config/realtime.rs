//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-session outbound queue capacity. Pushes beyond it are dropped.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Per-session inbound event queue capacity.
    #[serde(default = "default_inbox_buffer")]
    pub inbox_buffer_size: usize,
    /// Capacity of the presence flag write queue.
    #[serde(default = "default_presence_queue")]
    pub presence_queue_size: usize,
    /// Maximum message content length in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Maximum accepted text frame size in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            inbox_buffer_size: default_inbox_buffer(),
            presence_queue_size: default_presence_queue(),
            max_message_length: default_max_message_length(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_inbox_buffer() -> usize {
    64
}

fn default_presence_queue() -> usize {
    1024
}

fn default_max_message_length() -> usize {
    4096
}

fn default_max_frame_bytes() -> usize {
    65_536
}
