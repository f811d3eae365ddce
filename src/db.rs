use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Artist, Event, Fan};
use crate::utils;
use crate::validation::{self, ValidationError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("payload error: {0}")]
    Payload(String),
    #[error("{0}")]
    NotFound(String),
    #[error("event {event_id} does not belong to artist {artist_id}")]
    NotOwner { event_id: String, artist_id: String },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filtered select over events. Empty query lists everything.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub artist_id: Option<String>,
    pub from_date: Option<NaiveDate>,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open_default() -> StoreResult<Self> {
        Self::open(&utils::database_path())
    }

    pub fn open(path: &Path) -> StoreResult<Self> {
        utils::ensure_parent(path);
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS artists(
                id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                follower_count INTEGER NOT NULL DEFAULT 0,
                updated_at_utc TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS fans(
                id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at_utc TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS events(
                id TEXT PRIMARY KEY,
                artist_id TEXT NOT NULL,
                event_date TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at_utc TEXT NOT NULL,
                updated_at_utc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS events_by_artist ON events(artist_id);
            CREATE INDEX IF NOT EXISTS events_by_date ON events(event_date);
            CREATE TABLE IF NOT EXISTS follows(
                fan_id TEXT NOT NULL,
                artist_id TEXT NOT NULL,
                created_at_utc TEXT NOT NULL,
                PRIMARY KEY (fan_id, artist_id)
            );",
        )
    }

    pub fn ping(&self) -> StoreResult<()> {
        let _: i64 = self.conn.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(())
    }

    // --- Profiles ---

    pub fn upsert_artist(&self, artist: &Artist) -> StoreResult<()> {
        validation::require("display name", &artist.display_name)?;
        let payload = encode(artist)?;
        self.conn.execute(
            "INSERT INTO artists (id, payload, follower_count, updated_at_utc)
             VALUES (?1, ?2, 0, ?3)
             ON CONFLICT(id) DO UPDATE SET
               payload = excluded.payload,
               updated_at_utc = excluded.updated_at_utc",
            params![artist.id, payload, Utc::now()],
        )?;
        Ok(())
    }

    pub fn get_artist(&self, id: &str) -> StoreResult<Artist> {
        let row: Option<(String, u32)> = self
            .conn
            .query_row(
                "SELECT payload, follower_count FROM artists WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (payload, followers) = row.ok_or_else(|| StoreError::NotFound(format!("artist {id}")))?;
        let mut artist: Artist = decode(&payload)?;
        artist.follower_count = followers;
        Ok(artist)
    }

    pub fn list_artists(&self) -> StoreResult<Vec<Artist>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload, follower_count FROM artists")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (payload, followers) = row?;
            let mut artist: Artist = decode(&payload)?;
            artist.follower_count = followers;
            out.push(artist);
        }
        out.sort_by_key(|artist| artist.display_name.to_lowercase());
        Ok(out)
    }

    pub fn upsert_fan(&self, fan: &Fan) -> StoreResult<()> {
        validation::require("display name", &fan.display_name)?;
        let payload = encode(fan)?;
        self.conn.execute(
            "INSERT INTO fans (id, payload, updated_at_utc)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
               payload = excluded.payload,
               updated_at_utc = excluded.updated_at_utc",
            params![fan.id, payload, Utc::now()],
        )?;
        Ok(())
    }

    pub fn get_fan(&self, id: &str) -> StoreResult<Fan> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM fans WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let payload = payload.ok_or_else(|| StoreError::NotFound(format!("fan {id}")))?;
        decode(&payload)
    }

    // --- Events ---

    pub fn insert_event(&self, event: &Event) -> StoreResult<()> {
        event.check()?;
        self.get_artist(&event.artist_id)?;
        let payload = encode(event)?;
        self.conn.execute(
            "INSERT INTO events (id, artist_id, event_date, payload, created_at_utc, updated_at_utc)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.id,
                event.artist_id,
                event.date,
                payload,
                event.created_at_utc,
                event.updated_at_utc
            ],
        )?;
        info!(event_id = %event.id, artist_id = %event.artist_id, "event created");
        Ok(())
    }

    pub fn get_event(&self, id: &str) -> StoreResult<Event> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM events WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let payload = payload.ok_or_else(|| StoreError::NotFound(format!("event {id}")))?;
        decode_event(&payload)
    }

    /// Owner-only. The stored owner and creation time always win over the
    /// incoming record.
    pub fn update_event(&self, actor_artist_id: &str, event: &Event) -> StoreResult<Event> {
        let existing = self.owned_event(actor_artist_id, &event.id)?;

        let mut updated = event.clone();
        updated.artist_id = existing.artist_id;
        updated.created_at_utc = existing.created_at_utc;
        updated.updated_at_utc = Utc::now();
        updated.check()?;

        let payload = encode(&updated)?;
        self.conn.execute(
            "UPDATE events SET event_date = ?2, payload = ?3, updated_at_utc = ?4 WHERE id = ?1",
            params![updated.id, updated.date, payload, updated.updated_at_utc],
        )?;
        info!(event_id = %updated.id, "event updated");
        Ok(updated)
    }

    pub fn delete_event(&self, actor_artist_id: &str, event_id: &str) -> StoreResult<()> {
        self.owned_event(actor_artist_id, event_id)?;
        self.conn
            .execute("DELETE FROM events WHERE id = ?1", params![event_id])?;
        info!(event_id, "event deleted");
        Ok(())
    }

    fn owned_event(&self, actor_artist_id: &str, event_id: &str) -> StoreResult<Event> {
        let existing = self.get_event(event_id)?;
        if existing.artist_id != actor_artist_id {
            return Err(StoreError::NotOwner {
                event_id: event_id.to_string(),
                artist_id: actor_artist_id.to_string(),
            });
        }
        Ok(existing)
    }

    pub fn list_events(&self, query: &EventQuery) -> StoreResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM events
             WHERE (?1 IS NULL OR artist_id = ?1)
               AND (?2 IS NULL OR event_date >= ?2)
             ORDER BY event_date ASC, created_at_utc ASC",
        )?;
        let rows = stmt.query_map(params![query.artist_id, query.from_date], |row| {
            row.get::<_, String>(0)
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(decode_event(&row?)?);
        }
        debug!(count = out.len(), "events listed");
        Ok(out)
    }

    // --- Follows ---

    /// Returns whether a new edge was created.
    pub fn follow(&self, fan_id: &str, artist_id: &str) -> StoreResult<bool> {
        self.get_fan(fan_id)?;
        self.get_artist(artist_id)?;

        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO follows (fan_id, artist_id, created_at_utc) VALUES (?1, ?2, ?3)",
            params![fan_id, artist_id, Utc::now()],
        )?;
        if inserted == 1 {
            tx.execute(
                "UPDATE artists SET follower_count = follower_count + 1 WHERE id = ?1",
                params![artist_id],
            )?;
        }
        tx.commit()?;
        Ok(inserted == 1)
    }

    /// Returns whether an edge was removed. Unknown edges are a no-op.
    pub fn unfollow(&self, fan_id: &str, artist_id: &str) -> StoreResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM follows WHERE fan_id = ?1 AND artist_id = ?2",
            params![fan_id, artist_id],
        )?;
        if removed == 1 {
            tx.execute(
                "UPDATE artists SET follower_count = MAX(follower_count - 1, 0) WHERE id = ?1",
                params![artist_id],
            )?;
        }
        tx.commit()?;
        Ok(removed == 1)
    }

    pub fn is_following(&self, fan_id: &str, artist_id: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM follows WHERE fan_id = ?1 AND artist_id = ?2",
                params![fan_id, artist_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn followed_artists(&self, fan_id: &str) -> StoreResult<Vec<Artist>> {
        let mut stmt = self.conn.prepare(
            "SELECT artist_id FROM follows WHERE fan_id = ?1 ORDER BY created_at_utc ASC",
        )?;
        let ids = stmt
            .query_map(params![fan_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        ids.iter().map(|id| self.get_artist(id)).collect()
    }

    pub fn follower_count(&self, artist_id: &str) -> StoreResult<u32> {
        Ok(self.get_artist(artist_id)?.follower_count)
    }
}

fn encode<T: Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|err| StoreError::Payload(err.to_string()))
}

fn decode<T: DeserializeOwned>(payload: &str) -> StoreResult<T> {
    serde_json::from_str(payload).map_err(|err| StoreError::Payload(err.to_string()))
}

fn decode_event(payload: &str) -> StoreResult<Event> {
    let event: Event = decode(payload)?;
    event.check()?;
    Ok(event)
}
