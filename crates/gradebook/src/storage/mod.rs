//! Storage layer for gradebook.
//!
//! This module provides `SQLite`-based persistent storage for student records,
//! plus [`SharedStorage`], which exposes it to the async gateway.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::gateway::StudentStore;
use crate::grade::{Letter, Score};
use crate::student::{GradedScores, StudentId, StudentRecord};

use schema::STUDENT_COLUMNS;

/// Storage engine for student records.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List every record in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<StudentRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY seq"))?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Get a record by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: &StudentId) -> Result<Option<StudentRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
                [id.as_str()],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Insert a new record under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert(&self, name: &str, grades: &GradedScores) -> Result<StudentRecord> {
        let id = StudentId::generate();
        let scores = grades.scores();
        let [math_letter, science_letter, english_letter] = grades.letters();
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            r"
            INSERT INTO students (id, name, math_score, science_score, english_score,
                math_letter, science_letter, english_letter, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ",
            params![
                id.as_str(),
                name,
                scores.math.value(),
                scores.science.value(),
                scores.english.value(),
                math_letter.as_str(),
                science_letter.as_str(),
                english_letter.as_str(),
                now,
            ],
        )?;

        debug!("Inserted student {}", id);
        Ok(StudentRecord::new(id, name.to_string(), grades))
    }

    /// Replace the scores and letters of an existing record.
    ///
    /// Returns `None` without writing anything if no record has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_scores(
        &self,
        id: &StudentId,
        grades: &GradedScores,
    ) -> Result<Option<StudentRecord>> {
        let scores = grades.scores();
        let [math_letter, science_letter, english_letter] = grades.letters();

        let affected = self.conn.execute(
            r"
            UPDATE students SET
                math_score = ?2, science_score = ?3, english_score = ?4,
                math_letter = ?5, science_letter = ?6, english_letter = ?7,
                updated_at = ?8
            WHERE id = ?1
            ",
            params![
                id.as_str(),
                scores.math.value(),
                scores.science.value(),
                scores.english.value(),
                math_letter.as_str(),
                science_letter.as_str(),
                english_letter.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        if affected == 0 {
            return Ok(None);
        }
        debug!("Updated scores for student {}", id);
        self.get(id)
    }

    /// Delete a record by id.
    ///
    /// Returns `true` if a record was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, id: &StudentId) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM students WHERE id = ?1", [id.as_str()])?;
        Ok(affected > 0)
    }

    /// Count stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_students = self.count()?;

        let last_updated: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM students ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let last_updated = last_updated
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_students,
            last_updated,
            db_size_bytes,
        })
    }

    /// Convert a database row to a `StudentRecord`.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<StudentRecord> {
        Ok(StudentRecord {
            id: StudentId::from(row.get::<_, String>(0)?),
            name: row.get(1)?,
            math_score: Self::score_at(row, 2)?,
            science_score: Self::score_at(row, 3)?,
            english_score: Self::score_at(row, 4)?,
            math_letter: Self::letter_at(row, 5)?,
            science_letter: Self::letter_at(row, 6)?,
            english_letter: Self::letter_at(row, 7)?,
        })
    }

    fn score_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Score> {
        let value: f64 = row.get(idx)?;
        Score::new(value).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Real,
                Box::new(e),
            )
        })
    }

    fn letter_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Letter> {
        let value: String = row.get(idx)?;
        value.parse().map_err(|e: Error| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of student records stored.
    pub total_students: i64,
    /// When any record was last created or updated.
    pub last_updated: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// A [`Storage`] shared across request tasks.
///
/// `rusqlite` connections are blocking and not `Sync`, so calls take a mutex
/// and run on tokio's blocking pool. One statement runs at a time, which keeps
/// each record operation atomic.
#[derive(Debug, Clone)]
pub struct SharedStorage {
    inner: Arc<Mutex<Storage>>,
}

impl SharedStorage {
    /// Wrap an opened storage.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(storage)),
        }
    }

    async fn with_storage<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let storage = inner
                .lock()
                .map_err(|_| Error::store_unavailable("storage lock poisoned"))?;
            op(&storage)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl StudentStore for SharedStorage {
    async fn list(&self) -> Result<Vec<StudentRecord>> {
        self.with_storage(Storage::list).await
    }

    async fn insert(&self, name: &str, grades: GradedScores) -> Result<StudentRecord> {
        let name = name.to_string();
        self.with_storage(move |storage| storage.insert(&name, &grades))
            .await
    }

    async fn update_scores(
        &self,
        id: &StudentId,
        grades: GradedScores,
    ) -> Result<Option<StudentRecord>> {
        let id = id.clone();
        self.with_storage(move |storage| storage.update_scores(&id, &grades))
            .await
    }

    async fn delete(&self, id: &StudentId) -> Result<bool> {
        let id = id.clone();
        self.with_storage(move |storage| storage.delete(&id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::student::Scores;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn grades(math: f64, science: f64, english: f64) -> GradedScores {
        GradedScores::classify(Scores {
            math: Score::new(math).unwrap(),
            science: Score::new(science).unwrap(),
            english: Score::new(english).unwrap(),
        })
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let created = storage.insert("Amy", &grades(95.0, 72.0, 58.0)).unwrap();

        let retrieved = storage.get(&created.id).unwrap().unwrap();
        assert_eq!(retrieved, created);
        assert_eq!(retrieved.math_letter, Letter::A);
        assert_eq!(retrieved.science_letter, Letter::C);
        assert_eq!(retrieved.english_letter, Letter::F);
    }

    #[test]
    fn test_fractional_scores_preserved() {
        let storage = create_test_storage();
        let created = storage.insert("Cy", &grades(89.5, 70.25, -3.0)).unwrap();

        let retrieved = storage.get(&created.id).unwrap().unwrap();
        assert!((retrieved.math_score.value() - 89.5).abs() < f64::EPSILON);
        assert!((retrieved.science_score.value() - 70.25).abs() < f64::EPSILON);
        assert_eq!(retrieved.english_letter, Letter::F);
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get(&StudentId::from("missing")).unwrap().is_none());
    }

    #[test]
    fn test_list_in_insertion_order() {
        let storage = create_test_storage();
        assert!(storage.list().unwrap().is_empty());

        for name in ["first", "second", "third"] {
            storage.insert(name, &grades(1.0, 2.0, 3.0)).unwrap();
        }

        let names: Vec<_> = storage.list().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_update_scores() {
        let storage = create_test_storage();
        let created = storage.insert("Bo", &grades(95.0, 95.0, 95.0)).unwrap();

        let updated = storage
            .update_scores(&created.id, &grades(60.0, 59.0, 90.0))
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Bo");
        assert_eq!(updated.math_letter, Letter::D);
        assert_eq!(updated.science_letter, Letter::F);
        assert_eq!(updated.english_letter, Letter::A);
        assert_eq!(storage.get(&created.id).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_update_nonexistent_creates_nothing() {
        let storage = create_test_storage();
        let result = storage
            .update_scores(&StudentId::from("missing"), &grades(1.0, 1.0, 1.0))
            .unwrap();

        assert!(result.is_none());
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_delete() {
        let storage = create_test_storage();
        let created = storage.insert("Del", &grades(1.0, 1.0, 1.0)).unwrap();

        assert!(storage.delete(&created.id).unwrap());
        assert!(storage.get(&created.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_nonexistent() {
        let storage = create_test_storage();
        assert!(!storage.delete(&StudentId::from("missing")).unwrap());
    }

    #[test]
    fn test_count() {
        let storage = create_test_storage();
        assert_eq!(storage.count().unwrap(), 0);

        storage.insert("One", &grades(1.0, 1.0, 1.0)).unwrap();
        storage.insert("Two", &grades(1.0, 1.0, 1.0)).unwrap();

        assert_eq!(storage.count().unwrap(), 2);
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats.total_students, 0);
        assert!(stats.last_updated.is_none());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        storage.insert("First", &grades(1.0, 1.0, 1.0)).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_students, 1);
        assert!(stats.last_updated.is_some());
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_creates_parent_dirs_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("students.db");

        let id = {
            let storage = Storage::open(&path).unwrap();
            storage.insert("Kept", &grades(80.0, 80.0, 80.0)).unwrap().id
        };

        let reopened = Storage::open(&path).unwrap();
        let record = reopened.get(&id).unwrap().unwrap();
        assert_eq!(record.name, "Kept");
        assert_eq!(record.math_letter, Letter::B);
        assert!(reopened.stats().unwrap().db_size_bytes > 0);
    }

    #[tokio::test]
    async fn test_shared_storage_round_trip() {
        let shared = SharedStorage::new(create_test_storage());
        let created = shared
            .insert("Amy", grades(95.0, 72.0, 58.0))
            .await
            .unwrap();
        let listed = shared.list().await.unwrap();
        assert_eq!(listed, vec![created.clone()]);

        assert!(shared.delete(&created.id).await.unwrap());
        assert!(shared.list().await.unwrap().is_empty());
    }
}
