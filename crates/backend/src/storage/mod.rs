use mangrove_shared::models::Session;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Session snapshots keyed by session id, stored as JSON.
pub struct Storage {
    db: Database,
    path: PathBuf,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Arc<Self>, String> {
        let db = Database::create(path)
            .map_err(|e| format!("Failed to open database at {}: {}", path.display(), e))?;

        // Ensure table exists
        let write_txn = db.begin_write().map_err(|e| e.to_string())?;
        {
            write_txn
                .open_table(SESSIONS_TABLE)
                .map_err(|e| e.to_string())?;
        }
        write_txn.commit().map_err(|e| e.to_string())?;

        Ok(Arc::new(Storage {
            db,
            path: path.to_path_buf(),
        }))
    }

    pub fn save_session(&self, session: &Session) -> Result<(), String> {
        let json = serde_json::to_vec(session).map_err(|e| e.to_string())?;
        let id_str = session.id.to_string();

        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        {
            let mut table = write_txn
                .open_table(SESSIONS_TABLE)
                .map_err(|e| e.to_string())?;
            table
                .insert(id_str.as_str(), json.as_slice())
                .map_err(|e| e.to_string())?;
        }
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn get_session(&self, id: &str) -> Result<Option<Session>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(SESSIONS_TABLE)
            .map_err(|e| e.to_string())?;

        match table.get(id).map_err(|e| e.to_string())? {
            Some(value) => {
                let session: Session =
                    serde_json::from_slice(value.value()).map_err(|e| e.to_string())?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Read, modify and write one session inside a single write transaction.
    ///
    /// redb allows one writer at a time, so concurrent events for the same
    /// session are applied one after another, never interleaved.
    pub fn update_session<T>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut Session) -> T,
    ) -> Result<Option<(Session, T)>, String> {
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        let result = {
            let mut table = write_txn
                .open_table(SESSIONS_TABLE)
                .map_err(|e| e.to_string())?;
            let existing = table
                .get(id)
                .map_err(|e| e.to_string())?
                .map(|v| v.value().to_vec());
            match existing {
                Some(bytes) => {
                    let mut session: Session =
                        serde_json::from_slice(&bytes).map_err(|e| e.to_string())?;
                    let out = apply(&mut session);
                    session.updated_at = chrono::Utc::now().to_rfc3339();
                    let json = serde_json::to_vec(&session).map_err(|e| e.to_string())?;
                    table
                        .insert(id, json.as_slice())
                        .map_err(|e| e.to_string())?;
                    Some((session, out))
                }
                None => None,
            }
        };
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(result)
    }

    pub fn count_sessions(&self) -> Result<u64, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(SESSIONS_TABLE)
            .map_err(|e| e.to_string())?;
        table.len().map_err(|e| e.to_string())
    }

    pub fn db_size_bytes(&self) -> Result<u64, String> {
        std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| e.to_string())
    }

    pub fn delete_session(&self, id: &str) -> Result<bool, String> {
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        let removed = {
            let mut table = write_txn
                .open_table(SESSIONS_TABLE)
                .map_err(|e| e.to_string())?;
            let result = table.remove(id).map_err(|e| e.to_string())?;
            result.is_some()
        };
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(removed)
    }
}
