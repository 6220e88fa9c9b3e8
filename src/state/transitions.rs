//! Drives the campaign machine: every operation runs under the machine lock,
//! then persists and broadcasts before the lock is released.

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::{
    services::hub_events::{broadcast_state, broadcast_tick},
    state::{
        SharedState,
        campaign::CampaignState,
        state_machine::{CampaignCommand, CampaignMachine, ConfigUpdate, TickOutcome, TimerHandle},
    },
};

/// Run a phase command as one atomic unit and return the resulting record.
pub async fn run_command(state: &SharedState, command: CampaignCommand) -> CampaignState {
    let mut machine = state.machine().lock().await;
    apply_command(state, &mut machine, command)
}

/// Merge a configuration update without touching phase or timer.
///
/// An empty update is a no-op and is not broadcast.
pub async fn run_config_update(state: &SharedState, update: ConfigUpdate) -> CampaignState {
    let mut machine = state.machine().lock().await;
    if update.is_empty() {
        return machine.record().clone();
    }
    machine.apply_config(update);
    let record = machine.record().clone();
    publish(state, &record);
    record
}

/// Apply `command` on an already locked machine, arming the tick loop when needed.
pub(crate) fn apply_command(
    state: &SharedState,
    machine: &mut CampaignMachine,
    command: CampaignCommand,
) -> CampaignState {
    let transition = machine.transition(command);
    if transition.winner_refused {
        warn!("show-winner requested without a campaign message; falling back to idle");
    }
    info!(
        requested = ?transition.requested,
        phase = transition.phase.as_str(),
        timer = transition.timer_remaining,
        "campaign transition"
    );

    let record = machine.record().clone();
    publish(state, &record);

    if let Some(timer) = transition.timer {
        spawn_timer(state.clone(), timer);
    }
    record
}

/// Persist and broadcast a full snapshot of `record`.
pub(crate) fn publish(state: &SharedState, record: &CampaignState) {
    state.persist(record);
    broadcast_state(state, record);
}

/// Tick loop for one armed timer. Ends when its token is cancelled, when the
/// machine reports the tick as stale, or after the expiry transition.
fn spawn_timer(state: SharedState, timer: TimerHandle) {
    let period = state.tick_interval();
    tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = timer.token.cancelled() => break,
                _ = ticks.tick() => {
                    let mut machine = state.machine().lock().await;
                    match machine.tick(timer.generation) {
                        TickOutcome::Stale => break,
                        TickOutcome::Ticked { remaining } => {
                            debug!(generation = timer.generation, remaining, "timer tick");
                            state.persist(machine.record());
                            broadcast_tick(&state, remaining);
                        }
                        TickOutcome::Expired { next } => {
                            debug!(generation = timer.generation, "timer expired");
                            broadcast_tick(&state, 0);
                            apply_command(&state, &mut machine, next);
                            break;
                        }
                    }
                }
            }
        }
        debug!(generation = timer.generation, "timer loop finished");
    });
}
