//! Control operations on the campaign record, shared by the HTTP routes and
//! the channel handlers.

use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::{campaign_store::CampaignStore, models::ProductFields, storage::StorageResult},
    dto::{
        campaign::{CampaignStateDto, ConfigPatch, PreviewResponse},
        ws::AdminAction,
    },
    error::ServiceError,
    state::{
        SharedState,
        campaign::{Phase, Product, SlotTemplate},
        state_machine::{CampaignCommand, ConfigUpdate},
        transitions::{apply_command, publish, run_command, run_config_update},
    },
};

/// Current record.
pub async fn current_state(state: &SharedState) -> CampaignStateDto {
    let machine = state.machine().lock().await;
    CampaignStateDto::from(machine.record())
}

/// Arm the countdown, restarting it if one is running.
pub async fn start_countdown(state: &SharedState) -> CampaignStateDto {
    CampaignStateDto::from(&run_command(state, CampaignCommand::StartCountdown).await)
}

/// Enter the active phase from any phase.
pub async fn start_now(state: &SharedState) -> CampaignStateDto {
    CampaignStateDto::from(&run_command(state, CampaignCommand::StartNow).await)
}

/// Enter the winner phase, or fall back to idle when no campaign message is set.
pub async fn show_winner(state: &SharedState) -> CampaignStateDto {
    CampaignStateDto::from(&run_command(state, CampaignCommand::ShowWinner).await)
}

/// Return to idle and cancel the timer.
pub async fn stop(state: &SharedState) -> CampaignStateDto {
    CampaignStateDto::from(&run_command(state, CampaignCommand::Stop).await)
}

/// Validate and merge a configuration patch.
pub async fn apply_config(
    state: &SharedState,
    patch: ConfigPatch,
) -> Result<CampaignStateDto, ServiceError> {
    patch.validate()?;
    let record = run_config_update(state, ConfigUpdate::from(patch)).await;
    Ok(CampaignStateDto::from(&record))
}

/// Copy a stored template into the record. Unknown ids leave the record untouched.
pub async fn load_template(
    state: &SharedState,
    template_id: i64,
) -> Result<CampaignStateDto, ServiceError> {
    let store = state.require_store().await?;
    let template: SlotTemplate = store
        .find_template(template_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("template {template_id}")))?
        .into();

    info!(template_id, name = %template.name, "loading slot template");
    let record = run_config_update(state, ConfigUpdate::from(&template)).await;
    Ok(CampaignStateDto::from(&record))
}

/// Resolve the record's slots against the catalogue.
pub async fn preview(state: &SharedState) -> Result<PreviewResponse, ServiceError> {
    let store = state.require_store().await?;
    let products: Vec<Product> = store
        .list_products()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let machine = state.machine().lock().await;
    Ok(PreviewResponse::resolve(machine.record(), &products))
}

/// Execute an action received over a channel.
pub async fn execute_action(state: &SharedState, action: AdminAction) -> Result<(), ServiceError> {
    match action {
        AdminAction::StartCountdown => {
            start_countdown(state).await;
        }
        AdminAction::StartNow => {
            start_now(state).await;
        }
        AdminAction::ShowWinner => {
            show_winner(state).await;
        }
        AdminAction::Stop => {
            stop(state).await;
        }
        AdminAction::UpdateConfig { config } => {
            apply_config(state, config).await?;
        }
        AdminAction::LoadTemplate { template_id } => {
            load_template(state, template_id).await?;
        }
    }
    Ok(())
}

/// Prepare a freshly installed store: seed the catalogue when empty, then
/// recover the persisted record.
///
/// A recovered non-idle phase has no timer behind it and is forced back to
/// idle. When the machine already left idle, or was reconfigured, before the
/// store came up, the in-memory record wins and overwrites the stored one.
pub async fn bootstrap_store(
    state: &SharedState,
    store: &Arc<dyn CampaignStore>,
) -> StorageResult<()> {
    seed_products(state, store).await?;
    let persisted = store.load_live_state().await?;

    let mut machine = state.machine().lock().await;
    let changed_locally =
        machine.is_armed() || machine.record().phase != Phase::Idle || machine.config_changed();
    if changed_locally {
        info!(
            phase = machine.record().phase.as_str(),
            config_changed = machine.config_changed(),
            "campaign changed before storage came up; keeping in-memory record"
        );
        state.persist(machine.record());
        state.mark_bootstrapped();
        return Ok(());
    }

    match persisted {
        Some(entity) => {
            let recovered = entity.into_state(state.config().defaults());
            let phase = recovered.phase;
            machine.restore(recovered);
            if phase != Phase::Idle && !machine.is_armed() {
                warn!(
                    phase = phase.as_str(),
                    "recovered an interrupted phase; resetting to idle"
                );
                apply_command(state, &mut machine, CampaignCommand::Stop);
            } else {
                info!("recovered persisted campaign record");
                let record = machine.record().clone();
                publish(state, &record);
            }
        }
        None => {
            info!("no persisted campaign record; storing the initial one");
            state.persist(machine.record());
        }
    }

    state.mark_bootstrapped();
    Ok(())
}

async fn seed_products(state: &SharedState, store: &Arc<dyn CampaignStore>) -> StorageResult<()> {
    let seeds = state.config().seed_products();
    if seeds.is_empty() || !store.list_products().await?.is_empty() {
        return Ok(());
    }

    for seed in seeds {
        store
            .create_product(ProductFields {
                name: seed.name.clone(),
                icon_url: seed.icon_url.clone(),
                base_price: seed.base_price,
                category: seed.category.clone(),
            })
            .await?;
    }
    info!(count = seeds.len(), "seeded product catalogue");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            campaign_store::memory::MemoryCampaignStore,
            models::{LiveStateEntity, TemplateConfigEntity, TemplateFields},
        },
        state::{
            AppState, ClientKind, ServerEvent,
            campaign::{CampaignState, SlotEntry},
        },
    };

    async fn campaign(countdown: u32, message: &str) -> SharedState {
        let state = AppState::new(AppConfig::default());
        apply_config(
            &state,
            ConfigPatch {
                countdown_seconds: Some(countdown),
                active_duration: Some(5),
                winner_duration: Some(4),
                campaign_message: Some(message.into()),
                ..ConfigPatch::default()
            },
        )
        .await
        .unwrap();
        state
    }

    fn listen(state: &SharedState) -> UnboundedReceiver<ServerEvent> {
        state.hub().register(ClientKind::WebSocket).1
    }

    async fn next(rx: &mut UnboundedReceiver<ServerEvent>) -> Value {
        let event = rx.recv().await.expect("hub closed");
        serde_json::from_str(&event.data).unwrap()
    }

    fn assert_state(message: &Value, phase: &str, timer: u64) {
        assert_eq!(message["type"], "state_update", "{message}");
        assert_eq!(message["data"]["phase"], phase, "{message}");
        assert_eq!(message["data"]["timer_remaining"], timer, "{message}");
    }

    fn assert_tick(message: &Value, remaining: u64) {
        assert_eq!(message["type"], "timer_tick", "{message}");
        assert_eq!(message["remaining"], remaining, "{message}");
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_down_then_spins() {
        let state = campaign(3, "Jackpot").await;
        let mut rx = listen(&state);

        let started = start_countdown(&state).await;
        assert_eq!(started.phase, Phase::Countdown);
        assert_eq!(started.timer_remaining, 3);

        assert_state(&next(&mut rx).await, "countdown", 3);
        assert_tick(&next(&mut rx).await, 2);
        assert_tick(&next(&mut rx).await, 1);
        assert_tick(&next(&mut rx).await, 0);
        assert_state(&next(&mut rx).await, "active", 5);
    }

    #[tokio::test(start_paused = true)]
    async fn full_cycle_returns_to_idle() {
        let state = AppState::new(AppConfig::default());
        apply_config(
            &state,
            ConfigPatch {
                countdown_seconds: Some(1),
                active_duration: Some(1),
                winner_duration: Some(1),
                campaign_message: Some("Two for one".into()),
                ..ConfigPatch::default()
            },
        )
        .await
        .unwrap();
        let mut rx = listen(&state);

        start_countdown(&state).await;
        assert_state(&next(&mut rx).await, "countdown", 1);
        assert_tick(&next(&mut rx).await, 0);
        assert_state(&next(&mut rx).await, "active", 1);
        assert_tick(&next(&mut rx).await, 0);
        assert_state(&next(&mut rx).await, "winner", 1);
        assert_tick(&next(&mut rx).await, 0);
        assert_state(&next(&mut rx).await, "idle", 0);

        assert!(!state.machine().lock().await.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_the_running_timer() {
        let state = campaign(3, "Jackpot").await;
        let mut rx = listen(&state);

        start_now(&state).await;
        assert_state(&next(&mut rx).await, "active", 5);
        assert_tick(&next(&mut rx).await, 4);

        let stopped = stop(&state).await;
        assert_eq!(stopped.phase, Phase::Idle);
        assert_eq!(stopped.timer_remaining, 0);
        assert_state(&next(&mut rx).await, "idle", 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_restarts_keep_a_single_timer() {
        let state = campaign(3, "Jackpot").await;
        let mut rx = listen(&state);

        for _ in 0..3 {
            start_countdown(&state).await;
        }
        for _ in 0..3 {
            assert_state(&next(&mut rx).await, "countdown", 3);
        }

        assert_tick(&next(&mut rx).await, 2);
        assert_tick(&next(&mut rx).await, 1);
        assert_tick(&next(&mut rx).await, 0);
        assert_state(&next(&mut rx).await, "active", 5);
    }

    #[tokio::test(start_paused = true)]
    async fn winner_without_message_falls_back_to_idle() {
        let state = campaign(3, "   ").await;
        let mut rx = listen(&state);

        start_now(&state).await;
        assert_state(&next(&mut rx).await, "active", 5);

        let result = show_winner(&state).await;
        assert_eq!(result.phase, Phase::Idle);
        assert_state(&next(&mut rx).await, "idle", 0);
        assert!(!state.machine().lock().await.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn config_changes_never_touch_the_timer() {
        let state = campaign(3, "Jackpot").await;
        let mut rx = listen(&state);

        start_countdown(&state).await;
        assert_state(&next(&mut rx).await, "countdown", 3);

        let updated = apply_config(
            &state,
            ConfigPatch {
                banner_text: Some("Last call".into()),
                countdown_seconds: Some(60),
                ..ConfigPatch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.phase, Phase::Countdown);
        assert_eq!(updated.timer_remaining, 3);
        assert_eq!(updated.banner_text, "Last call");

        let broadcast = next(&mut rx).await;
        assert_state(&broadcast, "countdown", 3);
        assert_tick(&next(&mut rx).await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_or_empty_patches_are_not_broadcast() {
        let state = campaign(3, "Jackpot").await;
        let mut rx = listen(&state);

        let err = apply_config(
            &state,
            ConfigPatch {
                active_slot: Some(5),
                ..ConfigPatch::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        apply_config(&state, ConfigPatch::default()).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    async fn store_with_template_seven(state: &SharedState) -> MemoryCampaignStore {
        let store = MemoryCampaignStore::new();
        for index in 1..=7 {
            let slots = if index == 7 {
                (1..=3)
                    .map(|id| SlotEntry {
                        product_id: Some(id),
                        ..SlotEntry::default()
                    })
                    .collect()
            } else {
                Vec::new()
            };
            store
                .create_template(TemplateFields {
                    name: format!("template {index}"),
                    slot_type: if index == 7 { "single" } else { "triple" }.into(),
                    config: TemplateConfigEntity {
                        slots,
                        active_slot: 1,
                        banner_text: "From template".into(),
                        campaign_message: "Template prize".into(),
                    }
                    .encode(),
                })
                .await
                .unwrap();
        }
        state.set_store(Arc::new(store.clone())).await;
        store
    }

    #[tokio::test(start_paused = true)]
    async fn load_template_copies_slots_without_touching_phase() {
        let state = campaign(3, "Jackpot").await;
        store_with_template_seven(&state).await;
        let mut rx = listen(&state);

        let loaded = load_template(&state, 7).await.unwrap();
        assert_eq!(loaded.phase, Phase::Idle);
        assert_eq!(loaded.slot_type, crate::state::campaign::SlotType::Single);
        let ids: Vec<_> = loaded.slot_config.iter().map(|s| s.product_id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(loaded.active_slot, 1);
        assert_eq!(loaded.campaign_message, "Template prize");

        let message = next(&mut rx).await;
        assert_state(&message, "idle", 0);
        assert_eq!(message["data"]["slot_type"], "single");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_template_is_not_found_and_changes_nothing() {
        let state = campaign(3, "Jackpot").await;
        store_with_template_seven(&state).await;
        let before = current_state(&state).await;
        let mut rx = listen(&state);

        let err = load_template(&state, 99).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(rx.try_recv().is_err());
        assert_eq!(current_state(&state).await.banner_text, before.banner_text);
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_mode_refuses_store_backed_operations() {
        let state = campaign(3, "Jackpot").await;
        let err = load_template(&state, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
        assert!(matches!(preview(&state).await, Err(ServiceError::Degraded)));
    }

    #[tokio::test(start_paused = true)]
    async fn channel_actions_report_failures() {
        let state = campaign(3, "Jackpot").await;
        store_with_template_seven(&state).await;

        execute_action(&state, AdminAction::StartCountdown).await.unwrap();
        assert_eq!(current_state(&state).await.phase, Phase::Countdown);

        let err = execute_action(&state, AdminAction::LoadTemplate { template_id: 42 })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        execute_action(&state, AdminAction::Stop).await.unwrap();
        assert_eq!(current_state(&state).await.phase, Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_resets_an_interrupted_phase() {
        let state = AppState::new(AppConfig::default());
        let store = MemoryCampaignStore::new();
        let mut persisted = CampaignState::initial(state.config().defaults());
        persisted.phase = Phase::Active;
        persisted.timer_remaining = 12;
        persisted.banner_text = "Before restart".into();
        store
            .save_live_state(LiveStateEntity::from(&persisted))
            .await
            .unwrap();
        let store: Arc<dyn CampaignStore> = Arc::new(store);
        let mut rx = listen(&state);

        bootstrap_store(&state, &store).await.unwrap();

        assert!(state.is_bootstrapped());
        let record = current_state(&state).await;
        assert_eq!(record.phase, Phase::Idle);
        assert_eq!(record.timer_remaining, 0);
        assert_eq!(record.banner_text, "Before restart");
        assert_state(&next(&mut rx).await, "idle", 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_keeps_a_campaign_started_before_the_store() {
        let state = campaign(3, "Jackpot").await;
        start_now(&state).await;

        let store = MemoryCampaignStore::new();
        let mut persisted = CampaignState::initial(state.config().defaults());
        persisted.banner_text = "Stale".into();
        store
            .save_live_state(LiveStateEntity::from(&persisted))
            .await
            .unwrap();
        let store: Arc<dyn CampaignStore> = Arc::new(store);

        bootstrap_store(&state, &store).await.unwrap();
        let record = current_state(&state).await;
        assert_eq!(record.phase, Phase::Active);
        assert_ne!(record.banner_text, "Stale");
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_keeps_config_applied_while_idle() {
        let state = AppState::new(AppConfig::default());
        apply_config(
            &state,
            ConfigPatch {
                banner_text: Some("Local".into()),
                ..ConfigPatch::default()
            },
        )
        .await
        .unwrap();

        let store = MemoryCampaignStore::new();
        let mut persisted = CampaignState::initial(state.config().defaults());
        persisted.banner_text = "Stale".into();
        store
            .save_live_state(LiveStateEntity::from(&persisted))
            .await
            .unwrap();
        let store: Arc<dyn CampaignStore> = Arc::new(store);

        bootstrap_store(&state, &store).await.unwrap();

        assert_eq!(current_state(&state).await.banner_text, "Local");
        let pending = state.persisted_watcher().borrow().clone().unwrap();
        assert_eq!(pending.banner_text, "Local");
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_restores_config_when_nothing_changed_locally() {
        let state = AppState::new(AppConfig::default());
        let store = MemoryCampaignStore::new();
        let mut persisted = CampaignState::initial(state.config().defaults());
        persisted.banner_text = "Saved".into();
        store
            .save_live_state(LiveStateEntity::from(&persisted))
            .await
            .unwrap();
        let store: Arc<dyn CampaignStore> = Arc::new(store);

        bootstrap_store(&state, &store).await.unwrap();

        assert_eq!(current_state(&state).await.banner_text, "Saved");
        assert!(!state.machine().lock().await.config_changed());
    }
}
