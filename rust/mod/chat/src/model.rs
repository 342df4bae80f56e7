use serde::{Deserialize, Serialize};

/// Longest accepted message, in characters.
pub const MAX_BODY_CHARS: usize = 4000;
/// Long-poll wait when the client does not ask for one.
pub const DEFAULT_WAIT_SECS: u64 = 25;
/// Upper bound on a long-poll wait.
pub const MAX_WAIT_SECS: u64 = 60;

/// A conversation. Direct rooms hold exactly two members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    /// Staff ids, sorted.
    pub members: Vec<String>,
    pub direct: bool,
    pub created_by: String,
    pub created_at: String,
}

impl Room {
    pub fn has_member(&self, staff_id: &str) -> bool {
        self.members.iter().any(|m| m == staff_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Store-wide, strictly increasing.
    pub seq: i64,
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub body: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoom {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDirect {
    pub staff_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessage {
    pub body: String,
}

/// Paging for message history: messages with `seq > after`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageQuery {
    #[serde(default)]
    pub after: i64,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollQuery {
    #[serde(default)]
    pub after: i64,
    /// Seconds to wait, capped at [`MAX_WAIT_SECS`].
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Pair key identifying the direct room between two staff members.
pub fn direct_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}:{b}")
    } else {
        format!("{b}:{a}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_key_is_order_free() {
        assert_eq!(direct_key("b", "a"), direct_key("a", "b"));
        assert_eq!(direct_key("a", "b"), "a:b");
    }
}
