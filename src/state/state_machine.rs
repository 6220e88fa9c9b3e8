use std::time::SystemTime;

use tokio_util::sync::CancellationToken;

use crate::{
    config::CampaignDefaults,
    state::campaign::{CampaignState, Phase, SLOT_COUNT, SlotEntry, SlotTemplate, SlotType},
};

/// Operator commands that move the campaign between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignCommand {
    /// Arm the teaser countdown.
    StartCountdown,
    /// Skip (or finish) the countdown and spin the reels.
    StartNow,
    /// Stop the reels and show the campaign message.
    ShowWinner,
    /// Return to idle, cancelling any timer.
    Stop,
}

impl CampaignCommand {
    /// Command issued automatically when the timer of `phase` runs out.
    pub fn on_expiry(phase: Phase) -> Option<Self> {
        match phase {
            Phase::Idle => None,
            Phase::Countdown => Some(Self::StartNow),
            Phase::Active => Some(Self::ShowWinner),
            Phase::Winner => Some(Self::Stop),
        }
    }
}

/// Handle to the timer armed by a transition, consumed by the tick loop.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    /// Generation the tick loop must present on every tick.
    pub generation: u64,
    /// Cancelled as soon as another transition supersedes this timer.
    pub token: CancellationToken,
}

/// Outcome of a phase transition.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Command that was requested.
    pub requested: CampaignCommand,
    /// Phase actually entered.
    pub phase: Phase,
    /// Initial `timer_remaining` of the new phase.
    pub timer_remaining: u32,
    /// Set when `ShowWinner` was downgraded to idle for lack of a campaign message.
    pub winner_refused: bool,
    /// Timer to drive, `None` when the new phase is idle.
    pub timer: Option<TimerHandle>,
}

/// Outcome of a single timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belongs to a cancelled or superseded timer and was ignored.
    Stale,
    /// `timer_remaining` was decremented and is still positive.
    Ticked {
        /// Seconds left after this tick.
        remaining: u32,
    },
    /// `timer_remaining` reached zero; `next` must be applied right away.
    Expired {
        /// Automatic follow-up command.
        next: CampaignCommand,
    },
}

/// Partial update of the non-phase fields of the campaign record.
///
/// `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigUpdate {
    /// New display mode.
    pub slot_type: Option<SlotType>,
    /// New slot list; entries beyond the third are dropped.
    pub slot_config: Option<Vec<SlotEntry>>,
    /// New highlighted window, clamped to the last slot.
    pub active_slot: Option<u8>,
    /// New countdown length in seconds.
    pub countdown_seconds: Option<u32>,
    /// New spin length in seconds.
    pub active_duration: Option<u32>,
    /// New winner screen length in seconds.
    pub winner_duration: Option<u32>,
    /// New banner.
    pub banner_text: Option<String>,
    /// New winner message; blank disables the winner phase.
    pub campaign_message: Option<String>,
    /// New marquee text.
    pub marquee_text: Option<String>,
    /// New marquee speed keyword.
    pub marquee_speed: Option<String>,
}

impl ConfigUpdate {
    /// True when the update carries no field at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl From<&SlotTemplate> for ConfigUpdate {
    fn from(template: &SlotTemplate) -> Self {
        Self {
            slot_type: Some(template.slot_type),
            slot_config: Some(template.slots.clone()),
            active_slot: Some(template.active_slot),
            banner_text: Some(template.banner_text.clone()),
            campaign_message: Some(template.campaign_message.clone()),
            ..Self::default()
        }
    }
}

/// Owner of the campaign record and of the single armed timer.
///
/// All methods are synchronous; callers serialise access behind one lock so
/// each operation is observed as a single atomic unit.
#[derive(Debug)]
pub struct CampaignMachine {
    record: CampaignState,
    defaults: CampaignDefaults,
    armed: Option<TimerHandle>,
    generation: u64,
    config_changed: bool,
}

impl CampaignMachine {
    /// Create a machine holding a fresh idle record.
    pub fn new(defaults: CampaignDefaults) -> Self {
        Self {
            record: CampaignState::initial(&defaults),
            defaults,
            armed: None,
            generation: 0,
            config_changed: false,
        }
    }

    /// Current campaign record.
    pub fn record(&self) -> &CampaignState {
        &self.record
    }

    /// Whether a timer is currently armed.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Whether a configuration update was merged since creation or the last restore.
    pub fn config_changed(&self) -> bool {
        self.config_changed
    }

    /// Apply a phase command: cancel the running timer, write the new phase
    /// and its initial timer, and arm a fresh timer unless the result is idle.
    pub fn transition(&mut self, requested: CampaignCommand) -> Transition {
        self.cancel_timer();

        let mut winner_refused = false;
        let (phase, timer_remaining) = match requested {
            CampaignCommand::StartCountdown => (
                Phase::Countdown,
                self.defaults
                    .or_default_countdown(self.record.countdown_seconds),
            ),
            CampaignCommand::StartNow => (
                Phase::Active,
                self.defaults.or_default_active(self.record.active_duration),
            ),
            CampaignCommand::ShowWinner if self.record.has_campaign_message() => (
                Phase::Winner,
                self.defaults.or_default_winner(self.record.winner_duration),
            ),
            CampaignCommand::ShowWinner => {
                winner_refused = true;
                (Phase::Idle, 0)
            }
            CampaignCommand::Stop => (Phase::Idle, 0),
        };

        let now = SystemTime::now();
        self.record.phase = phase;
        self.record.timer_remaining = timer_remaining;
        self.record.phase_started_at = now;
        self.record.updated_at = now;

        let timer = (phase != Phase::Idle).then(|| {
            self.generation += 1;
            let handle = TimerHandle {
                generation: self.generation,
                token: CancellationToken::new(),
            };
            self.armed = Some(handle.clone());
            handle
        });

        Transition {
            requested,
            phase,
            timer_remaining,
            winner_refused,
            timer,
        }
    }

    /// Advance the armed timer by one second if `generation` is still current.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        let is_current = matches!(
            &self.armed,
            Some(armed) if armed.generation == generation && !armed.token.is_cancelled()
        );
        if !is_current {
            return TickOutcome::Stale;
        }

        self.record.timer_remaining = self.record.timer_remaining.saturating_sub(1);
        self.record.updated_at = SystemTime::now();

        if self.record.timer_remaining > 0 {
            return TickOutcome::Ticked {
                remaining: self.record.timer_remaining,
            };
        }

        match CampaignCommand::on_expiry(self.record.phase) {
            Some(next) => TickOutcome::Expired { next },
            None => {
                self.cancel_timer();
                TickOutcome::Stale
            }
        }
    }

    /// Merge the given fields into the record; phase and timer are untouched.
    pub fn apply_config(&mut self, update: ConfigUpdate) {
        let record = &mut self.record;
        if let Some(slot_type) = update.slot_type {
            record.slot_type = slot_type;
        }
        if let Some(mut slots) = update.slot_config {
            slots.truncate(SLOT_COUNT);
            record.slot_config = slots;
        }
        if let Some(active_slot) = update.active_slot {
            record.active_slot = active_slot.min(SLOT_COUNT as u8 - 1);
        }
        if let Some(seconds) = update.countdown_seconds {
            record.countdown_seconds = seconds;
        }
        if let Some(seconds) = update.active_duration {
            record.active_duration = seconds;
        }
        if let Some(seconds) = update.winner_duration {
            record.winner_duration = seconds;
        }
        if let Some(text) = update.banner_text {
            record.banner_text = text;
        }
        if let Some(text) = update.campaign_message {
            record.campaign_message = text;
        }
        if let Some(text) = update.marquee_text {
            record.marquee_text = text;
        }
        if let Some(speed) = update.marquee_speed {
            record.marquee_speed = speed;
        }
        record.updated_at = SystemTime::now();
        self.config_changed = true;
    }

    /// Replace the record with one recovered from storage.
    ///
    /// Any armed timer is cancelled first since the recovered phase has no
    /// live timer behind it.
    pub fn restore(&mut self, recovered: CampaignState) {
        self.cancel_timer();
        self.record = recovered;
        self.config_changed = false;
    }

    /// Cancel the armed timer, if any.
    pub fn cancel_timer(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> CampaignMachine {
        let mut sm = CampaignMachine::new(CampaignDefaults::default());
        sm.apply_config(ConfigUpdate {
            countdown_seconds: Some(3),
            active_duration: Some(2),
            winner_duration: Some(2),
            campaign_message: Some("Happy hour!".into()),
            ..ConfigUpdate::default()
        });
        sm
    }

    fn drain(sm: &mut CampaignMachine, generation: u64) -> (Vec<u32>, Option<CampaignCommand>) {
        let mut ticks = Vec::new();
        loop {
            match sm.tick(generation) {
                TickOutcome::Ticked { remaining } => ticks.push(remaining),
                TickOutcome::Expired { next } => {
                    ticks.push(0);
                    return (ticks, Some(next));
                }
                TickOutcome::Stale => return (ticks, None),
            }
        }
    }

    #[test]
    fn initial_state_is_idle_without_timer() {
        let sm = CampaignMachine::new(CampaignDefaults::default());
        assert_eq!(sm.record().phase, Phase::Idle);
        assert_eq!(sm.record().timer_remaining, 0);
        assert!(!sm.is_armed());
    }

    #[test]
    fn countdown_ticks_down_then_requests_active() {
        let mut sm = machine();
        let transition = sm.transition(CampaignCommand::StartCountdown);
        assert_eq!(transition.phase, Phase::Countdown);
        assert_eq!(transition.timer_remaining, 3);

        let timer = transition.timer.expect("countdown arms a timer");
        let (ticks, next) = drain(&mut sm, timer.generation);
        assert_eq!(ticks, vec![2, 1, 0]);
        assert_eq!(next, Some(CampaignCommand::StartNow));

        let active = sm.transition(CampaignCommand::StartNow);
        assert_eq!(active.phase, Phase::Active);
        assert_eq!(sm.record().timer_remaining, 2);
        assert!(timer.token.is_cancelled());
    }

    #[test]
    fn full_cycle_returns_to_idle() {
        let mut sm = machine();
        let mut command = Some(CampaignCommand::StartCountdown);
        let mut phases = Vec::new();
        while let Some(next) = command.take() {
            let transition = sm.transition(next);
            phases.push(transition.phase);
            if let Some(timer) = transition.timer {
                command = drain(&mut sm, timer.generation).1;
            }
        }
        assert_eq!(
            phases,
            vec![Phase::Countdown, Phase::Active, Phase::Winner, Phase::Idle]
        );
        assert!(!sm.is_armed());
    }

    #[test]
    fn show_winner_without_message_falls_back_to_idle() {
        let mut sm = machine();
        sm.apply_config(ConfigUpdate {
            campaign_message: Some("  ".into()),
            ..ConfigUpdate::default()
        });
        sm.transition(CampaignCommand::StartNow);

        let transition = sm.transition(CampaignCommand::ShowWinner);
        assert!(transition.winner_refused);
        assert_eq!(transition.phase, Phase::Idle);
        assert_eq!(sm.record().phase, Phase::Idle);
        assert_eq!(sm.record().timer_remaining, 0);
        assert!(transition.timer.is_none());
        assert!(!sm.is_armed());
    }

    #[test]
    fn stop_cancels_timer_and_rejects_stale_ticks() {
        let mut sm = machine();
        let timer = sm
            .transition(CampaignCommand::StartNow)
            .timer
            .expect("active arms a timer");

        let stop = sm.transition(CampaignCommand::Stop);
        assert_eq!(stop.phase, Phase::Idle);
        assert_eq!(sm.record().timer_remaining, 0);
        assert!(timer.token.is_cancelled());
        assert_eq!(sm.tick(timer.generation), TickOutcome::Stale);
        assert_eq!(sm.record().timer_remaining, 0);
    }

    #[test]
    fn rearming_supersedes_previous_timer() {
        let mut sm = machine();
        let first = sm.transition(CampaignCommand::StartCountdown).timer.unwrap();
        let second = sm.transition(CampaignCommand::StartCountdown).timer.unwrap();

        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
        assert_ne!(first.generation, second.generation);
        assert_eq!(sm.tick(first.generation), TickOutcome::Stale);
        assert_eq!(
            sm.tick(second.generation),
            TickOutcome::Ticked { remaining: 2 }
        );
    }

    #[test]
    fn stop_when_idle_is_a_noop_transition() {
        let mut sm = machine();
        let transition = sm.transition(CampaignCommand::Stop);
        assert_eq!(transition.phase, Phase::Idle);
        assert!(transition.timer.is_none());
    }

    #[test]
    fn apply_config_never_touches_phase_or_timer() {
        let mut sm = machine();
        let timer = sm.transition(CampaignCommand::StartCountdown).timer.unwrap();
        sm.tick(timer.generation);

        sm.apply_config(ConfigUpdate {
            slot_type: Some(SlotType::Single),
            slot_config: Some(vec![SlotEntry::default(); 5]),
            active_slot: Some(7),
            countdown_seconds: Some(60),
            active_duration: Some(60),
            winner_duration: Some(60),
            banner_text: Some("banner".into()),
            campaign_message: Some(String::new()),
            marquee_text: Some("marquee".into()),
            marquee_speed: Some("fast".into()),
        });

        let record = sm.record();
        assert_eq!(record.phase, Phase::Countdown);
        assert_eq!(record.timer_remaining, 2);
        assert_eq!(record.slot_config.len(), SLOT_COUNT);
        assert_eq!(record.active_slot, 2);
        assert!(sm.is_armed());
        assert_eq!(
            sm.tick(timer.generation),
            TickOutcome::Ticked { remaining: 1 }
        );
    }

    #[test]
    fn zero_durations_use_defaults() {
        let mut sm = machine();
        sm.apply_config(ConfigUpdate {
            countdown_seconds: Some(0),
            ..ConfigUpdate::default()
        });
        let transition = sm.transition(CampaignCommand::StartCountdown);
        assert_eq!(transition.timer_remaining, 10);
    }

    #[test]
    fn restore_keeps_recovered_phase_without_timer() {
        let mut sm = machine();
        let mut recovered = sm.record().clone();
        recovered.phase = Phase::Active;
        recovered.timer_remaining = 12;

        sm.restore(recovered);
        assert_eq!(sm.record().phase, Phase::Active);
        assert!(!sm.is_armed());
        assert!(!sm.config_changed());
    }

    #[test]
    fn config_changes_are_tracked_but_transitions_are_not() {
        let mut sm = CampaignMachine::new(CampaignDefaults::default());
        sm.transition(CampaignCommand::StartNow);
        sm.transition(CampaignCommand::Stop);
        assert!(!sm.config_changed());

        sm.apply_config(ConfigUpdate {
            banner_text: Some("Local".into()),
            ..ConfigUpdate::default()
        });
        assert!(sm.config_changed());
    }
}
