pub mod schema;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info};

use clinic_core::{new_id, now_rfc3339, transaction, Principal, ServiceError, Table};
use clinic_sql::{Executor, Row, SQLStore, Value};

use crate::model::{direct_key, Message, Room, DEFAULT_WAIT_SECS, MAX_BODY_CHARS, MAX_WAIT_SECS};

const ROOMS: Table = Table::new("chat_rooms", "room");

/// Rooms, messages and long-poll delivery.
pub struct ChatService {
    sql: Arc<dyn SQLStore>,
    /// Woken on every new message.
    arrivals: Notify,
}

fn message_from_row(row: &Row) -> Result<Message, ServiceError> {
    let text = |col: &str| {
        row.get_str(col)
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Storage(format!("chat message missing {col}")))
    };
    Ok(Message {
        seq: row
            .get_i64("seq")
            .ok_or_else(|| ServiceError::Storage("chat message missing seq".into()))?,
        id: text("id")?,
        room_id: text("room_id")?,
        sender_id: text("sender_id")?,
        body: text("body")?,
        created_at: text("created_at")?,
    })
}

fn insert_room(tx: &dyn Executor, room: &Room, key: Option<String>) -> Result<(), ServiceError> {
    ROOMS.insert(
        tx,
        &room.id,
        room,
        &[
            ("direct_key", Value::from(key)),
            ("created_at", Value::from(room.created_at.as_str())),
        ],
    )?;
    for member in &room.members {
        tx.exec(
            "INSERT INTO chat_members (room_id, staff_id) VALUES (?1, ?2)",
            &[Value::from(room.id.as_str()), Value::from(member.as_str())],
        )?;
    }
    Ok(())
}

impl ChatService {
    /// Create the service, initializing the schema.
    pub fn new(sql: Arc<dyn SQLStore>) -> Result<Arc<Self>, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self {
            sql,
            arrivals: Notify::new(),
        }))
    }

    /// Create a group room. The caller is always a member.
    pub fn create_room(&self, caller: &Principal, name: &str, members: &[String]) -> Result<Room, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("room name is required".into()));
        }
        let mut members: Vec<String> = members
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .chain(std::iter::once(caller.staff_id.clone()))
            .collect();
        members.sort();
        members.dedup();
        if members.len() < 2 {
            return Err(ServiceError::Validation("a room needs at least two members".into()));
        }

        let room = Room {
            id: new_id(),
            name: name.to_string(),
            members,
            direct: false,
            created_by: caller.staff_id.clone(),
            created_at: now_rfc3339(),
        };
        transaction(self.sql.as_ref(), |tx| insert_room(tx, &room, None))?;
        info!(room = %room.id, members = room.members.len(), "created chat room");
        Ok(room)
    }

    /// The direct room between the caller and `other`, created on first use.
    pub fn open_direct(&self, caller: &Principal, other: &str) -> Result<Room, ServiceError> {
        let other = other.trim();
        if other.is_empty() || other == caller.staff_id {
            return Err(ServiceError::Validation("pick another staff member to chat with".into()));
        }
        let key = direct_key(&caller.staff_id, other);
        transaction(self.sql.as_ref(), |tx| {
            let rows = tx.query("SELECT data FROM chat_rooms WHERE direct_key = ?1", &[Value::from(key.as_str())])?;
            if let Some(data) = rows.first().and_then(|r| r.get_str("data")) {
                return Ok(serde_json::from_str(data)?);
            }
            let mut members = vec![caller.staff_id.clone(), other.to_string()];
            members.sort();
            let room = Room {
                id: new_id(),
                name: key.clone(),
                members,
                direct: true,
                created_by: caller.staff_id.clone(),
                created_at: now_rfc3339(),
            };
            insert_room(tx, &room, Some(key.clone()))?;
            debug!(room = %room.id, "opened direct room");
            Ok(room)
        })
    }

    /// Rooms the caller belongs to.
    pub fn list_rooms(&self, caller: &Principal) -> Result<Vec<Room>, ServiceError> {
        let rows = self.sql.query(
            "SELECT r.data AS data FROM chat_rooms r
             JOIN chat_members m ON m.room_id = r.id
             WHERE m.staff_id = ?1
             ORDER BY r.created_at, r.id",
            &[Value::from(caller.staff_id.as_str())],
        )?;
        rows.iter()
            .map(|r| {
                let data = r
                    .get_str("data")
                    .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
                Ok(serde_json::from_str(data)?)
            })
            .collect()
    }

    /// A room the caller may read: members, or management for any room.
    pub fn get_room(&self, caller: &Principal, room_id: &str) -> Result<Room, ServiceError> {
        let room: Room = ROOMS.get(self.sql.as_ref(), room_id)?;
        if !room.has_member(&caller.staff_id) && !caller.is_management() {
            return Err(ServiceError::NotFound(format!("room '{room_id}' not found")));
        }
        Ok(room)
    }

    /// Post to a room. Only members may post.
    pub fn send_message(&self, caller: &Principal, room_id: &str, body: &str) -> Result<Message, ServiceError> {
        let room = self.get_room(caller, room_id)?;
        if !room.has_member(&caller.staff_id) {
            return Err(ServiceError::PermissionDenied("only members can post in this room".into()));
        }
        let body = body.trim();
        if body.is_empty() {
            return Err(ServiceError::Validation("message is empty".into()));
        }
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(ServiceError::Validation(format!(
                "message is longer than {MAX_BODY_CHARS} characters"
            )));
        }

        let id = new_id();
        let message = transaction(self.sql.as_ref(), |tx| {
            tx.exec(
                "INSERT INTO chat_messages (id, room_id, sender_id, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                &[
                    Value::from(id.as_str()),
                    Value::from(room_id),
                    Value::from(caller.staff_id.as_str()),
                    Value::from(body),
                    Value::from(now_rfc3339()),
                ],
            )?;
            let rows = tx.query("SELECT * FROM chat_messages WHERE id = ?1", &[Value::from(id.as_str())])?;
            let row = rows
                .first()
                .ok_or_else(|| ServiceError::Storage("message vanished after insert".into()))?;
            message_from_row(row)
        })?;
        self.arrivals.notify_waiters();
        debug!(room = %room_id, seq = message.seq, "message sent");
        Ok(message)
    }

    /// Messages after `after`, oldest first.
    pub fn list_messages(
        &self,
        caller: &Principal,
        room_id: &str,
        after: i64,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, ServiceError> {
        self.get_room(caller, room_id)?;
        self.messages_after(room_id, after, limit.unwrap_or(50).clamp(1, 200))
    }

    fn messages_after(&self, room_id: &str, after: i64, limit: usize) -> Result<Vec<Message>, ServiceError> {
        let rows = self.sql.query(
            "SELECT * FROM chat_messages WHERE room_id = ?1 AND seq > ?2 ORDER BY seq LIMIT ?3",
            &[Value::from(room_id), Value::from(after), Value::from(limit as i64)],
        )?;
        rows.iter().map(message_from_row).collect()
    }

    /// Long-poll: wait until the room has messages after `after`, or the
    /// timeout passes. An empty result means the wait timed out.
    pub async fn receive(
        &self,
        caller: &Principal,
        room_id: &str,
        after: i64,
        timeout_secs: Option<u64>,
    ) -> Result<Vec<Message>, ServiceError> {
        self.get_room(caller, room_id)?;
        let wait = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_WAIT_SECS).min(MAX_WAIT_SECS));
        let deadline = Instant::now() + wait;

        loop {
            // Register before checking so a send between the check and
            // the wait still wakes us.
            let notified = self.arrivals.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let messages = self.messages_after(room_id, after, 200)?;
            if !messages.is_empty() {
                return Ok(messages);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }
}
