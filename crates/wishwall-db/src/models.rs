//! Database row types. These map directly to SQLite rows and are converted
//! into `wishwall_types` models at the edge.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};

use wishwall_types::models::{Wall, Wish};

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct WallRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub created_at: String,
}

pub struct WishRow {
    pub id: String,
    pub wall_id: String,
    pub text: String,
    pub sender: String,
    pub color: String,
    pub rotation: f64,
    pub created_at: String,
}

impl WallRow {
    pub fn into_wall(self) -> Result<Wall> {
        Ok(Wall {
            id: self.id.parse().map_err(|e| anyhow!("Corrupt wall id '{}': {}", self.id, e))?,
            owner_id: self
                .owner_id
                .parse()
                .map_err(|e| anyhow!("Corrupt owner_id '{}' on wall '{}': {}", self.owner_id, self.id, e))?,
            created_at: parse_timestamp(&self.created_at)?,
            title: self.title,
        })
    }
}

impl WishRow {
    pub fn from_wish(wish: &Wish) -> Self {
        Self {
            id: wish.id.to_string(),
            wall_id: wish.wall_id.to_string(),
            text: wish.text.clone(),
            sender: wish.sender.clone(),
            color: wish.color.clone(),
            rotation: wish.rotation,
            created_at: format_timestamp(wish.created_at),
        }
    }

    pub fn into_wish(self) -> Result<Wish> {
        Ok(Wish {
            id: self.id.parse().map_err(|e| anyhow!("Corrupt wish id '{}': {}", self.id, e))?,
            wall_id: self
                .wall_id
                .parse()
                .map_err(|e| anyhow!("Corrupt wall_id '{}' on wish '{}': {}", self.wall_id, self.id, e))?,
            created_at: parse_timestamp(&self.created_at)?,
            text: self.text,
            sender: self.sender,
            color: self.color,
            rotation: self.rotation,
        })
    }
}

/// RFC 3339 with millisecond precision, so lexical order matches time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; it is UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| anyhow!("Corrupt timestamp '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_timestamp_formats() {
        let a = parse_timestamp("2026-01-01 00:00:00").unwrap();
        let b = parse_timestamp("2026-01-01T00:00:00.000Z").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let early = format_timestamp("2026-01-01T09:00:00.005Z".parse().unwrap());
        let late = format_timestamp("2026-01-01T10:00:00Z".parse().unwrap());
        assert!(early < late);
    }
}
