use std::sync::Arc;
use std::time::Duration;
use futures::StreamExt;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use poll_shared::models::{StoreStatus, VoteRecord, VoteSnapshot, VoteSummary};
use poll_shared::tally::{summarize, DEFAULT_TOP_N};
use crate::connection::{ConnectionResolver, ConnectionResult};
use crate::store::{EphemeralRepository, StoreError, VoteRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Remote,
    Ephemeral,
    Dropped,
}

impl SaveOutcome {
    pub fn is_remote(self) -> bool {
        self == SaveOutcome::Remote
    }
}

/// Writes and reads votes through whichever repository is active: the remote
/// store when the resolver connects, the in-process list otherwise.
pub struct VoteProcessor {
    resolver: Arc<ConnectionResolver>,
    ephemeral: EphemeralRepository,
    store_timeout: Duration,
}

impl VoteProcessor {
    pub fn new(resolver: Arc<ConnectionResolver>, store_timeout: Duration) -> Self {
        Self {
            resolver,
            ephemeral: EphemeralRepository::new(),
            store_timeout,
        }
    }

    pub fn resolver(&self) -> &ConnectionResolver {
        &self.resolver
    }

    pub fn ephemeral(&self) -> &EphemeralRepository {
        &self.ephemeral
    }

    /// Returns `true` only when the vote reached the remote store.
    pub async fn save(&self, record: VoteRecord) -> bool {
        self.store(record).await.is_remote()
    }

    pub async fn store(&self, record: VoteRecord) -> SaveOutcome {
        match self.resolver.resolve().await {
            ConnectionResult::Connected(handle) => {
                match timeout(self.store_timeout, handle.repository().append(&record)).await {
                    Ok(Ok(())) => {
                        info!("✓ Vote stored remotely");
                        SaveOutcome::Remote
                    }
                    // a failed remote append is never retried into the ephemeral list
                    Ok(Err(e)) => {
                        error!("✗ Remote vote append failed, vote dropped: {}", e);
                        SaveOutcome::Dropped
                    }
                    Err(_) => {
                        error!("✗ Remote vote append failed, vote dropped: {}", StoreError::Timeout);
                        SaveOutcome::Dropped
                    }
                }
            }
            ConnectionResult::Unavailable(reason) => match self.ephemeral.append(&record).await {
                Ok(()) => {
                    debug!("Vote kept in memory ({})", reason);
                    SaveOutcome::Ephemeral
                }
                Err(e) => {
                    error!("✗ Ephemeral vote append failed: {}", e);
                    SaveOutcome::Dropped
                }
            },
        }
    }

    /// Best-effort read: a failure part-way through keeps what was read so far.
    pub async fn load_all(&self) -> VoteSnapshot {
        match self.resolver.resolve().await {
            ConnectionResult::Connected(handle) => {
                self.drain(handle.repository()).await
            }
            ConnectionResult::Unavailable(_) => self.drain(&self.ephemeral).await,
        }
    }

    pub async fn summary(&self) -> VoteSummary {
        summarize(&self.load_all().await, DEFAULT_TOP_N)
    }

    pub async fn status(&self) -> StoreStatus {
        match self.resolver.resolve().await {
            ConnectionResult::Connected(handle) => StoreStatus {
                online: true,
                backend: handle.repository().kind().to_string(),
                detail: None,
            },
            ConnectionResult::Unavailable(reason) => StoreStatus {
                online: false,
                backend: self.ephemeral.kind().to_string(),
                detail: Some(reason.to_string()),
            },
        }
    }

    async fn drain(&self, repository: &dyn VoteRepository) -> VoteSnapshot {
        let mut snapshot = VoteSnapshot::default();
        let mut votes = repository.stream();

        let read = async {
            while let Some(item) = votes.next().await {
                snapshot.push(item?);
            }
            Ok::<(), StoreError>(())
        };
        let outcome = timeout(self.store_timeout, read).await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(
                "Reading votes from {} failed after {} records: {}",
                repository.kind(), snapshot.total_votes(), e
            ),
            Err(_) => warn!(
                "Reading votes from {} timed out after {} records",
                repository.kind(), snapshot.total_votes()
            ),
        }
        snapshot
    }
}
