use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, walls, wishes)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE walls (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL UNIQUE REFERENCES users(id),
                title       TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE wishes (
                id          TEXT PRIMARY KEY,
                wall_id     TEXT NOT NULL REFERENCES walls(id),
                text        TEXT NOT NULL,
                sender      TEXT NOT NULL,
                color       TEXT NOT NULL,
                rotation    REAL NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_wishes_wall
                ON wishes(wall_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
