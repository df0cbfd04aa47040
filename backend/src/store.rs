use std::sync::Mutex;
use futures::stream::{self, BoxStream, StreamExt};
use poll_shared::models::VoteRecord;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Vote list lock poisoned")]
    LockFailed,
    #[error("Store operation timed out")]
    Timeout,
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Append-only vote storage. Implemented by the remote database and by the
/// in-process fallback list.
#[rocket::async_trait]
pub trait VoteRepository: Send + Sync {
    async fn append(&self, record: &VoteRecord) -> Result<(), StoreError>;

    /// Yields every stored record in arrival order.
    fn stream(&self) -> BoxStream<'_, Result<VoteRecord, StoreError>>;

    fn kind(&self) -> &'static str;
}

/// Process-local vote list. Lost on restart.
#[derive(Debug, Default)]
pub struct EphemeralRepository {
    votes: Mutex<Vec<VoteRecord>>,
}

impl EphemeralRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.votes.lock().map(|votes| votes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[rocket::async_trait]
impl VoteRepository for EphemeralRepository {
    async fn append(&self, record: &VoteRecord) -> Result<(), StoreError> {
        let mut votes = self.votes.lock().map_err(|_| StoreError::LockFailed)?;
        votes.push(record.clone().stamped_now());
        Ok(())
    }

    fn stream(&self) -> BoxStream<'_, Result<VoteRecord, StoreError>> {
        match self.votes.lock() {
            Ok(votes) => stream::iter(votes.clone().into_iter().map(Ok)).boxed(),
            Err(_) => stream::iter(vec![Err(StoreError::LockFailed)]).boxed(),
        }
    }

    fn kind(&self) -> &'static str {
        "ephemeral"
    }
}
