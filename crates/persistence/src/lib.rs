#![deny(warnings)]

//! Session storage: document and snapshot codecs plus versioned stores.
//!
//! Stores are keyed by room id. Every save names the version it expects to
//! overwrite and the check happens in the same step as the write, so of two
//! writers racing on one room only one succeeds. The other gets
//! [`StoreError::Conflict`] and must reload.

use campaign_core::GameSessionState;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
    #[error("room {room}: expected version {expected:?}, found {found:?}")]
    Conflict {
        room: String,
        expected: Option<u64>,
        found: Option<u64>,
    },
}

/// A stored value tagged with its write count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

pub fn encode_json(state: &GameSessionState) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(state)?)
}

pub fn decode_json(text: &str) -> Result<GameSessionState, StoreError> {
    Ok(serde_json::from_str(text)?)
}

/// Compact binary snapshot.
pub fn encode_snapshot(state: &GameSessionState) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(state)?)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<GameSessionState, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Room-keyed session storage with optimistic concurrency.
pub trait SessionStore {
    fn load(&self, room: &str) -> Result<Option<Versioned<GameSessionState>>, StoreError>;

    /// Write `state` if the stored version equals `expected` (`None` means
    /// the room must not exist yet). Returns the new version.
    fn save(
        &mut self,
        room: &str,
        state: &GameSessionState,
        expected: Option<u64>,
    ) -> Result<u64, StoreError>;

    fn rooms(&self) -> Result<Vec<String>, StoreError>;
}

fn conflict(room: &str, expected: Option<u64>, found: Option<u64>) -> StoreError {
    warn!(room, ?expected, ?found, "stale session write rejected");
    StoreError::Conflict {
        room: room.to_string(),
        expected,
        found,
    }
}

/// In-process store; snapshots are kept in bincode form.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: BTreeMap<String, Versioned<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, room: &str) -> Result<Option<Versioned<GameSessionState>>, StoreError> {
        self.rooms
            .get(room)
            .map(|v| {
                Ok(Versioned {
                    version: v.version,
                    value: decode_snapshot(&v.value)?,
                })
            })
            .transpose()
    }

    fn save(
        &mut self,
        room: &str,
        state: &GameSessionState,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let found = self.rooms.get(room).map(|v| v.version);
        if expected != found {
            return Err(conflict(room, expected, found));
        }
        let version = found.map_or(1, |v| v + 1);
        let value = encode_snapshot(state)?;
        self.rooms
            .insert(room.to_string(), Versioned { version, value });
        debug!(room, version, "session saved");
        Ok(version)
    }

    fn rooms(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.rooms.keys().cloned().collect())
    }
}

/// SQLite-backed store holding one JSON document per room.
///
/// Each handle owns its connection. Handles opened on the same file may be
/// used from different threads or processes.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        info!(path = %path.as_ref().display(), "session store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    fn configure(&mut self) -> Result<(), StoreError> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            self.conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(mode = %mode, "journal mode set");
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                room TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                doc TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}

impl SessionStore for SqliteStore {
    fn load(&self, room: &str) -> Result<Option<Versioned<GameSessionState>>, StoreError> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT version, doc FROM sessions WHERE room = ?1",
                params![room],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        row.map(|(version, doc)| {
            Ok(Versioned {
                version: version as u64,
                value: decode_json(&doc)?,
            })
        })
        .transpose()
    }

    fn save(
        &mut self,
        room: &str,
        state: &GameSessionState,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let doc = encode_json(state)?;
        // Take the write lock up front so the version read below sees the
        // row this statement just matched.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let written = match expected {
            None => tx.execute(
                "INSERT OR IGNORE INTO sessions (room, version, doc) VALUES (?1, 1, ?2)",
                params![room, doc],
            )?,
            Some(v) => tx.execute(
                "UPDATE sessions SET doc = ?1, version = version + 1 WHERE room = ?2 AND version = ?3",
                // Versions past i64::MAX never match a stored row.
                params![doc, room, i64::try_from(v).unwrap_or(-1)],
            )?,
        };
        let found: Option<i64> = tx
            .query_row(
                "SELECT version FROM sessions WHERE room = ?1",
                params![room],
                |row| row.get(0),
            )
            .optional()?;
        if written == 0 {
            return Err(conflict(room, expected, found.map(|v| v as u64)));
        }
        tx.commit()?;
        let version = found.map_or(1, |v| v as u64);
        debug!(room, version, "session saved");
        Ok(version)
    }

    fn rooms(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT room FROM sessions ORDER BY room")?;
        let rooms = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rooms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::{
        ActionId, ArchetypeId, Catalog, EngineConfig, RoomConfig, ScenarioLocation, VictoryConfig,
        VictoryType,
    };
    use campaign_engine::{generate_character, initialize_game, process_turn, SeededDice};
    use proptest::prelude::*;

    fn played_state(seed: u64, turns: usize) -> GameSessionState {
        let catalog = Catalog::default();
        let cfg = EngineConfig::default();
        let room = RoomConfig {
            id: "room-1".into(),
            name: "Store".into(),
            location: ScenarioLocation {
                city: "Porto Alegre".into(),
                state: "RS".into(),
                country: "Brazil".into(),
            },
            victory: VictoryConfig {
                kind: VictoryType::Cycles,
                value: 2,
            },
        };
        let mut dice = SeededDice::seeded(seed);
        let character = generate_character(&catalog, &ArchetypeId::from("arch_tech"), &mut dice).unwrap();
        let party = catalog.party("party_green").cloned().unwrap();
        let mut s = initialize_game(&cfg, &room, character, party);
        let dinner = catalog.action(&ActionId::from("act_dinner")).unwrap();
        for _ in 0..turns {
            s = process_turn(&cfg, &s, dinner, &mut dice);
        }
        s
    }

    #[test]
    fn json_document_round_trips() {
        let s = played_state(3, 5);
        let text = encode_json(&s).unwrap();
        assert!(text.contains("\"turnHistory\""));
        assert_eq!(decode_json(&text).unwrap(), s);
        assert!(matches!(decode_json("{}"), Err(StoreError::Json(_))));
    }

    #[test]
    fn memory_store_enforces_versions() {
        let mut store = MemoryStore::new();
        let s1 = played_state(1, 2);
        assert!(store.load("room-1").unwrap().is_none());
        assert_eq!(store.save("room-1", &s1, None).unwrap(), 1);

        let s2 = played_state(1, 3);
        assert_eq!(store.save("room-1", &s2, Some(1)).unwrap(), 2);
        let err = store.save("room-1", &s1, Some(1)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict { expected: Some(1), found: Some(2), .. }
        ));
        assert!(matches!(
            store.save("room-1", &s1, None),
            Err(StoreError::Conflict { .. })
        ));

        let loaded = store.load("room-1").unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.value, s2);
        assert_eq!(store.rooms().unwrap(), vec!["room-1".to_string()]);
    }

    #[test]
    fn sqlite_store_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.sqlite");
        let s = played_state(9, 4);
        {
            let mut store = SqliteStore::open(&path).unwrap();
            assert_eq!(store.save("room_2", &s, None).unwrap(), 1);
            assert_eq!(store.save("room-1", &s, None).unwrap(), 1);
        }
        let mut store = SqliteStore::open(&path).unwrap();
        let loaded = store.load("room-1").unwrap().unwrap();
        assert_eq!(loaded, Versioned { version: 1, value: s.clone() });
        assert!(matches!(
            store.save("room-1", &s, Some(0)),
            Err(StoreError::Conflict { found: Some(1), .. })
        ));
        assert!(matches!(
            store.save("room-1", &s, None),
            Err(StoreError::Conflict { expected: None, found: Some(1), .. })
        ));
        assert!(matches!(
            store.save("room-9", &s, Some(1)),
            Err(StoreError::Conflict { found: None, .. })
        ));
        assert_eq!(store.save("room-1", &s, Some(1)).unwrap(), 2);
        assert_eq!(store.rooms().unwrap(), vec!["room-1".to_string(), "room_2".to_string()]);
    }

    #[test]
    fn sqlite_store_accepts_any_room_text() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let s = played_state(2, 1);
        assert_eq!(store.save("../etc/passwd", &s, None).unwrap(), 1);
        assert!(store.load("../etc/passwd").unwrap().is_some());
        assert!(store.load("").unwrap().is_none());
    }

    #[test]
    fn concurrent_writers_never_lose_acknowledged_saves() {
        const WRITERS: usize = 4;
        const ROUNDS: usize = 40;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.sqlite");
        let s = played_state(5, 2);
        SqliteStore::open(&path)
            .unwrap()
            .save("room-1", &s, None)
            .unwrap();

        let acknowledged: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..WRITERS)
                .map(|_| {
                    let (path, s) = (&path, &s);
                    scope.spawn(move || {
                        let mut store = SqliteStore::open(path).unwrap();
                        let mut won = Vec::new();
                        for _ in 0..ROUNDS {
                            let current = store.load("room-1").unwrap().unwrap().version;
                            match store.save("room-1", s, Some(current)) {
                                Ok(v) => won.push(v),
                                Err(StoreError::Conflict { .. }) => {}
                                Err(e) => panic!("unexpected store error: {e}"),
                            }
                        }
                        won
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let store = SqliteStore::open(&path).unwrap();
        let final_version = store.load("room-1").unwrap().unwrap().version;
        assert!(!acknowledged.is_empty());
        assert_eq!(final_version, 1 + acknowledged.len() as u64);
        let mut versions = acknowledged.clone();
        versions.sort_unstable();
        versions.dedup();
        assert_eq!(versions.len(), acknowledged.len());
        assert_eq!(versions, (2..=final_version).collect::<Vec<_>>());
    }

    #[test]
    fn racing_creators_leave_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("create.sqlite");
        SqliteStore::open(&path).unwrap();
        let s = played_state(6, 0);
        let created = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let (path, s) = (&path, &s);
                    scope.spawn(move || {
                        let mut store = SqliteStore::open(path).unwrap();
                        store.save("fresh", s, None).is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|created| *created)
                .count()
        });
        assert_eq!(created, 1);
    }

    proptest! {
        #[test]
        fn snapshot_round_trips(seed in any::<u64>(), turns in 0usize..60) {
            let s = played_state(seed, turns);
            let bytes = encode_snapshot(&s).unwrap();
            prop_assert_eq!(decode_snapshot(&bytes).unwrap(), s);
        }
    }
}
