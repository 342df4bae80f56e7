use clinic_core::ServiceError;
use clinic_sql::SQLStore;

/// Initialize the SQLite schema for chat.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    sql.exec_batch(
        "CREATE TABLE IF NOT EXISTS chat_rooms (
            id TEXT PRIMARY KEY,
            direct_key TEXT UNIQUE,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chat_members (
            room_id TEXT NOT NULL,
            staff_id TEXT NOT NULL,
            PRIMARY KEY (room_id, staff_id),
            FOREIGN KEY (room_id) REFERENCES chat_rooms(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_chat_members_staff ON chat_members(staff_id);

        CREATE TABLE IF NOT EXISTS chat_messages (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            room_id TEXT NOT NULL,
            sender_id TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (room_id) REFERENCES chat_rooms(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_chat_messages_room ON chat_messages(room_id, seq);",
    )?;
    Ok(())
}
