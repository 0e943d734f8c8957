use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{match_store::MatchStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Keep a match store connected, flipping degraded mode as connectivity comes and goes.
///
/// `connect` builds a fresh store; it is retried with exponential backoff. Once
/// connected the store is polled, and a failed poll triggers in-place reconnect
/// attempts before the store is dropped and `connect` runs again.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn MatchStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "match store connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
                continue;
            }
        };

        state.set_match_store(store.clone()).await;
        info!("match store connected; leaving degraded mode");
        delay = INITIAL_DELAY;

        watch_store(&state, store.as_ref()).await;

        state.clear_match_store().await;
        warn!("match store dropped; reconnecting from scratch");
        sleep(delay).await;
    }
}

/// Poll `store` until it fails and cannot be revived.
async fn watch_store(state: &SharedState, store: &dyn MatchStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("match store healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
            }
            Err(err) => {
                warn!(error = %err, "match store health check failed");
                if !recover(state, store).await {
                    warn!("exhausted match store reconnect attempts");
                    return;
                }
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Try to revive `store` in place. The service runs degraded while attempts fail.
async fn recover(state: &SharedState, store: &dyn MatchStore) -> bool {
    let mut backoff = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "match store reconnected");
                state.update_degraded(false);
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "match store reconnect failed; entering degraded mode");
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "match store reconnect failed");
                }
                sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_DELAY);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            match_store::memory::MemoryMatchStore,
            models::{MatchEntity, MatchListItemEntity, TeamDrawEntity},
            storage::StorageResult,
        },
        state::AppState,
    };

    /// Memory store whose reconnects always succeed.
    struct Revivable(MemoryMatchStore);

    impl MatchStore for Revivable {
        fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.0.insert_match(entity)
        }

        fn update_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<bool>> {
            self.0.update_match(entity)
        }

        fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
            self.0.find_match(id)
        }

        fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchListItemEntity>>> {
            self.0.list_matches()
        }

        fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
            self.0.delete_match(id)
        }

        fn save_team_draw(
            &self,
            match_id: Uuid,
            revision: u64,
            draw: TeamDrawEntity,
        ) -> BoxFuture<'static, StorageResult<bool>> {
            self.0.save_team_draw(match_id, revision, draw)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "ping failed".into(),
                    std::io::Error::other("down"),
                ))
            })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn successful_reconnect_leaves_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        let store = Revivable(MemoryMatchStore::new());

        assert!(recover(&state, &store).await);
        assert!(!state.is_degraded());
    }
}
