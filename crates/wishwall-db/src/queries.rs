use crate::Database;
use crate::models::{UserRow, WallRow, WishRow};
use anyhow::Result;
use rusqlite::{Connection, ErrorCode, OptionalExtension};

impl Database {
    // -- Users --

    /// Create a user and their wall in one transaction.
    /// Returns `false` if the email is already registered.
    pub fn create_user_with_wall(
        &self,
        user_id: &str,
        email: &str,
        password_hash: &str,
        wall_id: &str,
        title: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3)",
                (user_id, email, password_hash),
            );
            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }

            tx.execute(
                "INSERT INTO walls (id, owner_id, title) VALUES (?1, ?2, ?3)",
                (wall_id, user_id, title),
            )?;

            tx.commit()?;
            Ok(true)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Walls --

    pub fn get_wall(&self, id: &str) -> Result<Option<WallRow>> {
        self.with_conn(|conn| query_wall(conn, "id", id))
    }

    pub fn get_wall_by_owner(&self, owner_id: &str) -> Result<Option<WallRow>> {
        self.with_conn(|conn| query_wall(conn, "owner_id", owner_id))
    }

    // -- Wishes --

    pub fn insert_wish(&self, wish: &WishRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO wishes (id, wall_id, text, sender, color, rotation, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    wish.id,
                    wish.wall_id,
                    wish.text,
                    wish.sender,
                    wish.color,
                    wish.rotation,
                    wish.created_at
                ],
            )?;
            Ok(())
        })
    }

    /// Newest first. `before` is the id of the last wish on the previous page;
    /// the next page starts strictly after it, even among wishes sharing its
    /// timestamp. An id not on this wall yields an empty page.
    pub fn get_wishes(&self, wall_id: &str, limit: u32, before: Option<&str>) -> Result<Vec<WishRow>> {
        self.with_conn(|conn| query_wishes(conn, wall_id, limit, before))
    }

    pub fn count_wishes(&self, wall_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM wishes WHERE wall_id = ?1",
                [wall_id],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
    }
}

// `column` is always a literal from this module, never user input.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT id, email, password, created_at FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_wall(conn: &Connection, column: &str, value: &str) -> Result<Option<WallRow>> {
    let sql = format!("SELECT id, owner_id, title, created_at FROM walls WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(WallRow {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                title: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_wishes(conn: &Connection, wall_id: &str, limit: u32, before: Option<&str>) -> Result<Vec<WishRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, wall_id, text, sender, color, rotation, created_at
         FROM wishes
         WHERE wall_id = ?1
           AND (?2 IS NULL OR (created_at, rowid) < (
                SELECT created_at, rowid FROM wishes WHERE id = ?2 AND wall_id = ?1))
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?3",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![wall_id, before, limit], |row| {
            Ok(WishRow {
                id: row.get(0)?,
                wall_id: row.get(1)?,
                text: row.get(2)?,
                sender: row.get(3)?,
                color: row.get(4)?,
                rotation: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::models::format_timestamp;

    fn db_with_owner() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let wall_id = Uuid::new_v4().to_string();
        assert!(db
            .create_user_with_wall(&Uuid::new_v4().to_string(), "ann@example.com", "hash", &wall_id, "My Wishing Wall")
            .unwrap());
        (db, wall_id)
    }

    fn wish(wall_id: &str, text: &str, created_at: String) -> WishRow {
        WishRow {
            id: Uuid::new_v4().to_string(),
            wall_id: wall_id.to_string(),
            text: text.to_string(),
            sender: "Anonymous".to_string(),
            color: "#fff0f5".to_string(),
            rotation: 1.25,
            created_at,
        }
    }

    #[test]
    fn signup_creates_user_and_wall() {
        let (db, wall_id) = db_with_owner();
        let user = db.get_user_by_email("ann@example.com").unwrap().unwrap();
        let wall = db.get_wall_by_owner(&user.id).unwrap().unwrap();
        assert_eq!(wall.id, wall_id);
        assert_eq!(wall.title, "My Wishing Wall");
        assert!(db.get_user_by_id(&user.id).unwrap().is_some());
    }

    #[test]
    fn duplicate_email_is_reported_not_raised() {
        let (db, _) = db_with_owner();
        let created = db
            .create_user_with_wall(
                &Uuid::new_v4().to_string(),
                "ann@example.com",
                "hash",
                &Uuid::new_v4().to_string(),
                "My Wishing Wall",
            )
            .unwrap();
        assert!(!created);
    }

    #[test]
    fn wishes_come_back_newest_first_with_cursor() {
        let (db, wall_id) = db_with_owner();
        let base = Utc::now();
        for i in 0..3 {
            let ts = format_timestamp(base + Duration::seconds(i));
            db.insert_wish(&wish(&wall_id, &format!("wish {i}"), ts)).unwrap();
        }

        let rows = db.get_wishes(&wall_id, 10, None).unwrap();
        let texts: Vec<_> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["wish 2", "wish 1", "wish 0"]);
        assert_eq!(db.count_wishes(&wall_id).unwrap(), 3);

        let older = db.get_wishes(&wall_id, 10, Some(&rows[0].id)).unwrap();
        assert_eq!(older.len(), 2);
        assert_eq!(older[0].text, "wish 1");

        let limited = db.get_wishes(&wall_id, 1, None).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn cursor_pages_through_wishes_sharing_a_timestamp() {
        let (db, wall_id) = db_with_owner();
        let ts = format_timestamp(Utc::now());
        for i in 0..5 {
            db.insert_wish(&wish(&wall_id, &format!("burst {i}"), ts.clone())).unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = db.get_wishes(&wall_id, 2, cursor.as_deref()).unwrap();
            seen.extend(page.iter().map(|r| r.text.clone()));
            match page.last() {
                Some(last) if page.len() == 2 => cursor = Some(last.id.clone()),
                _ => break,
            }
        }

        assert_eq!(seen, ["burst 4", "burst 3", "burst 2", "burst 1", "burst 0"]);
    }

    #[test]
    fn unknown_cursor_yields_empty_page() {
        let (db, wall_id) = db_with_owner();
        db.insert_wish(&wish(&wall_id, "only", format_timestamp(Utc::now()))).unwrap();
        let page = db.get_wishes(&wall_id, 10, Some(&Uuid::new_v4().to_string())).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn wish_requires_existing_wall() {
        let (db, _) = db_with_owner();
        let orphan = wish(&Uuid::new_v4().to_string(), "lost", format_timestamp(Utc::now()));
        assert!(db.insert_wish(&orphan).is_err());
    }

    #[test]
    fn row_roundtrips_into_model() {
        let (db, wall_id) = db_with_owner();
        let row = wish(&wall_id, "hello", format_timestamp(Utc::now()));
        let id = row.id.clone();
        db.insert_wish(&row).unwrap();

        let stored = db.get_wishes(&wall_id, 1, None).unwrap().pop().unwrap();
        let model = stored.into_wish().unwrap();
        assert_eq!(model.id.to_string(), id);
        assert_eq!(model.text, "hello");
        assert_eq!(model.rotation, 1.25);
    }
}
