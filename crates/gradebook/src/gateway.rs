//! Record store gateway.
//!
//! [`Gateway`] mediates between API requests and a [`StudentStore`]. It is the
//! only place letters are derived: every write classifies all three scores
//! before the store sees them.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::student::{GradedScores, NewStudent, Scores, StudentId, StudentRecord};

/// Persistence operations the gateway needs from a record store.
///
/// Each call is independent and atomic for the single record it touches.
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// All records, in the store's native order.
    async fn list(&self) -> Result<Vec<StudentRecord>>;

    /// Persist a new record and return it with its assigned id.
    async fn insert(&self, name: &str, grades: GradedScores) -> Result<StudentRecord>;

    /// Overwrite the scores of an existing record. `None` if the id is unknown.
    async fn update_scores(
        &self,
        id: &StudentId,
        grades: GradedScores,
    ) -> Result<Option<StudentRecord>>;

    /// Remove a record. `false` if the id is unknown.
    async fn delete(&self, id: &StudentId) -> Result<bool>;
}

/// Create/read/update/delete entry points over an injected store.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn StudentStore>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn StudentStore>) -> Self {
        Self { store }
    }

    /// List all stored records.
    ///
    /// # Errors
    ///
    /// Returns a store error if the backing store fails.
    pub async fn list(&self) -> Result<Vec<StudentRecord>> {
        let records = self.store.list().await?;
        debug!("Listed {} students", records.len());
        Ok(records)
    }

    /// Create a record, deriving its letters from the submitted scores.
    ///
    /// # Errors
    ///
    /// Returns a store error if the record cannot be persisted.
    pub async fn create(&self, student: NewStudent) -> Result<StudentRecord> {
        let grades = GradedScores::classify(student.scores);
        let record = self.store.insert(&student.name, grades).await?;
        info!("Created student {}", record.id);
        Ok(record)
    }

    /// Replace all three scores of a record and recompute its letters.
    ///
    /// The name is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id, or a store error.
    pub async fn update(&self, id: &StudentId, scores: Scores) -> Result<StudentRecord> {
        let grades = GradedScores::classify(scores);
        let record = self
            .store
            .update_scores(id, grades)
            .await?
            .ok_or_else(|| Error::not_found(id.as_str()))?;
        info!("Updated student {}", record.id);
        Ok(record)
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id, or a store error.
    pub async fn delete(&self, id: &StudentId) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(Error::not_found(id.as_str()));
        }
        info!("Deleted student {}", id);
        Ok(())
    }
}
