//! Background writer saving the latest campaign record to the store.

use std::time::Duration;

use tokio::{sync::watch, time::sleep};
use tracing::{debug, warn};

use crate::{dao::models::LiveStateEntity, state::SharedState};

const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Save every record published through [`crate::state::AppState::persist`].
///
/// Records published while a save is in flight are coalesced: only the most
/// recent one is written next. Transient failures are retried until a newer
/// record replaces them.
pub async fn run(state: SharedState, mut records: watch::Receiver<Option<LiveStateEntity>>) {
    let mut pending = records.borrow_and_update().clone();

    loop {
        if pending.is_none() {
            if records.changed().await.is_err() {
                break;
            }
            pending = records.borrow_and_update().clone();
        }

        let Some(entity) = pending.clone() else {
            continue;
        };

        match state.require_store().await {
            Ok(store) => match store.save_live_state(entity).await {
                Ok(()) => {
                    debug!("campaign record persisted");
                    pending = None;
                }
                Err(err) if err.is_transient() => {
                    warn!(error = %err, "failed to persist campaign record; will retry");
                    sleep(RETRY_DELAY).await;
                }
                Err(err) => {
                    warn!(error = %err, "campaign record rejected by the store; dropping it");
                    pending = None;
                }
            },
            Err(_) => sleep(RETRY_DELAY).await,
        }

        if records.has_changed().unwrap_or(false) {
            pending = records.borrow_and_update().clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::campaign_store::{CampaignStore, memory::MemoryCampaignStore},
        state::{AppState, campaign::CampaignState},
    };

    #[tokio::test(start_paused = true)]
    async fn latest_record_reaches_the_store() {
        let state = AppState::new(AppConfig::default());
        let store = MemoryCampaignStore::new();
        state.set_store(Arc::new(store.clone())).await;
        let writer = tokio::spawn(run(state.clone(), state.persisted_watcher()));

        let mut record = CampaignState::initial(state.config().defaults());
        record.banner_text = "first".into();
        state.persist(&record);
        record.banner_text = "second".into();
        state.persist(&record);

        sleep(Duration::from_millis(10)).await;
        let saved = store.load_live_state().await.unwrap().unwrap();
        assert_eq!(saved.banner_text, "second");
        writer.abort();
    }
}
