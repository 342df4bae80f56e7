use clinic_core::ServiceError;
use clinic_sql::SQLStore;

/// Initialize the SQLite schema for marketing.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    sql.exec_batch(
        "CREATE TABLE IF NOT EXISTS mkt_campaigns (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            platform TEXT NOT NULL,
            active INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS mkt_reports (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            report_date TEXT NOT NULL,
            spend INTEGER NOT NULL,
            impressions INTEGER NOT NULL,
            clicks INTEGER NOT NULL,
            leads INTEGER NOT NULL,
            messages INTEGER NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (campaign_id, report_date),
            FOREIGN KEY (campaign_id) REFERENCES mkt_campaigns(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_mkt_reports_date ON mkt_reports(report_date);",
    )?;
    Ok(())
}
