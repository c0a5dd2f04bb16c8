use crate::model::{Complex, Region, StorageError, TownComplexes};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

/// Summary line of a stored collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub id: i64,
    pub town: Region,
    pub complex_count: usize,
    pub collected_at: DateTime<Utc>,
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database and creates the schema when missing.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS collections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                region_no TEXT NOT NULL,
                region_name TEXT NOT NULL,
                region_type TEXT NOT NULL DEFAULT '',
                complex_count INTEGER NOT NULL,
                complexes TEXT NOT NULL,
                collected_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self { conn })
    }

    /// Stores the complexes of one town and returns the new collection id.
    pub fn save_collection(&self, entry: &TownComplexes) -> Result<i64, StorageError> {
        Self::insert_collection(&self.conn, entry)
    }

    /// Stores several towns in one transaction; either all are stored or none.
    pub fn save_collections(&mut self, entries: &[TownComplexes]) -> Result<Vec<i64>, StorageError> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            ids.push(Self::insert_collection(&tx, entry)?);
        }
        tx.commit()?;
        Ok(ids)
    }

    fn insert_collection(conn: &Connection, entry: &TownComplexes) -> Result<i64, StorageError> {
        let payload = serde_json::to_string(&entry.complexes)?;
        conn.execute(
            "INSERT INTO collections (
                region_no, region_name, region_type, complex_count, complexes, collected_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &entry.town.region_no,
                &entry.town.region_name,
                &entry.town.region_type,
                entry.complexes.len() as i64,
                &payload,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_collections(&self) -> Result<Vec<CollectionInfo>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, region_no, region_name, region_type, complex_count, collected_at
             FROM collections ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], Self::map_info)?;
        let mut infos = Vec::new();
        for info in rows {
            infos.push(info?);
        }
        Ok(infos)
    }

    pub fn load_collection(&self, id: i64) -> Result<TownComplexes, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT region_no, region_name, region_type, complexes FROM collections WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Self::map_collection(row),
            None => Err(StorageError::NotFound(id)),
        }
    }

    /// Every stored collection, oldest first.
    pub fn load_all(&self) -> Result<Vec<TownComplexes>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT region_no, region_name, region_type, complexes FROM collections ORDER BY id ASC",
        )?;
        let mut rows = stmt.query([])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(Self::map_collection(row)?);
        }
        Ok(result)
    }

    pub fn remove_collection(&self, id: i64) -> Result<(), StorageError> {
        let deleted = self
            .conn
            .execute("DELETE FROM collections WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    fn map_info(row: &Row) -> Result<CollectionInfo, rusqlite::Error> {
        let collected_at_str: String = row.get(5)?;
        let collected_at = collected_at_str.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let complex_count: i64 = row.get(4)?;

        Ok(CollectionInfo {
            id: row.get(0)?,
            town: Region {
                region_no: row.get(1)?,
                region_name: row.get(2)?,
                region_type: row.get(3)?,
            },
            complex_count: complex_count.max(0) as usize,
            collected_at,
        })
    }

    fn map_collection(row: &Row) -> Result<TownComplexes, StorageError> {
        let payload: String = row.get(3)?;
        let complexes: Vec<Complex> = serde_json::from_str(&payload)?;
        Ok(TownComplexes {
            town: Region {
                region_no: row.get(0)?,
                region_name: row.get(1)?,
                region_type: row.get(2)?,
            },
            complexes,
        })
    }
}
