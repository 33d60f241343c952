//! Round/rest sequencing on top of the [`CountdownEngine`].
//!
//! The sequencer decides *which* period comes next and is the only caller of
//! [`CountdownEngine::arm`]. It never does time arithmetic itself.

use tracing::info;

use crate::clock::Clock;
use crate::config::TimerConfig;
use crate::cue::Cue;
use crate::engine::{CountdownEngine, PeriodComplete, PeriodKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SequencerStatus {
    /// Round 1, nothing started.
    Idle,
    Running,
    /// A sequence is in progress but its countdown is paused.
    Stopped,
}

/// What happened when a period ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    RestStarted { after_round: u32 },
    RoundStarted { round: u32 },
    Finished,
}

/// Read-only view for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerSnapshot {
    pub current_round: u32,
    pub total_rounds: u32,
    pub period: PeriodKind,
    pub running: bool,
    pub status: SequencerStatus,
    pub seconds_remaining: u64,
    pub period_length: u64,
    pub progress: f64,
}

pub struct RoundSequencer<C: Clock> {
    config: TimerConfig,
    current_round: u32,
    period: PeriodKind,
    running: bool,
    in_progress: bool,
    engine: CountdownEngine<C>,
}

impl<C: Clock> RoundSequencer<C> {
    pub fn new(config: TimerConfig, engine: CountdownEngine<C>) -> Self {
        let mut sequencer = Self {
            config,
            current_round: 1,
            period: PeriodKind::Active,
            running: false,
            in_progress: false,
            engine,
        };
        sequencer.reset();
        sequencer
    }

    /// Begin a fresh sequence at round 1, even if one is in progress.
    pub fn start(&mut self) {
        self.current_round = 1;
        self.period = PeriodKind::Active;
        self.running = true;
        self.in_progress = true;
        self.engine
            .arm(PeriodKind::Active, u64::from(self.config.round_seconds()), true);
        self.engine.play_cue(Cue::Start);
        info!(total_rounds = self.config.total_rounds(), "sequence started");
    }

    /// Pause the countdown, keeping round and period.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.engine.pause();
        info!(
            round = self.current_round,
            period = %self.period,
            remaining = self.engine.seconds_remaining(),
            "stopped"
        );
    }

    /// Continue a stopped sequence where it left off. Never plays a cue.
    pub fn resume(&mut self) {
        if self.running || !self.in_progress {
            return;
        }
        self.running = true;
        self.engine.resume();
        info!(round = self.current_round, period = %self.period, "resumed");
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.in_progress = false;
        self.current_round = 1;
        self.period = PeriodKind::Active;
        self.engine
            .arm(PeriodKind::Active, u64::from(self.config.round_seconds()), false);
    }

    /// Drive the engine; call on every scheduler tick.
    pub fn tick(&mut self) -> Option<Transition> {
        let done = self.engine.tick()?;
        Some(self.on_period_complete(done))
    }

    fn on_period_complete(&mut self, done: PeriodComplete) -> Transition {
        debug_assert_eq!(done.kind, self.period);

        let transition = match self.period {
            PeriodKind::Active if self.current_round >= self.config.total_rounds() => {
                self.reset();
                Transition::Finished
            }
            PeriodKind::Active => {
                self.period = PeriodKind::Rest;
                self.engine
                    .arm(PeriodKind::Rest, u64::from(self.config.rest_seconds()), true);
                Transition::RestStarted {
                    after_round: self.current_round,
                }
            }
            // the total may have been lowered while resting
            PeriodKind::Rest if self.current_round >= self.config.total_rounds() => {
                self.reset();
                Transition::Finished
            }
            PeriodKind::Rest => {
                self.current_round += 1;
                self.period = PeriodKind::Active;
                self.engine
                    .arm(PeriodKind::Active, u64::from(self.config.round_seconds()), true);
                self.engine.play_cue(Cue::Start);
                Transition::RoundStarted {
                    round: self.current_round,
                }
            }
        };
        info!(?transition, "period complete");
        transition
    }

    /// Replace the configuration. Lengths apply the next time a period of
    /// that kind is armed; the period on the clock keeps its length.
    pub fn update_config(&mut self, config: TimerConfig) {
        self.config = config;
        if self.status() == SequencerStatus::Idle {
            self.engine
                .arm(PeriodKind::Active, u64::from(config.round_seconds()), false);
        }
        info!(
            total_rounds = config.total_rounds(),
            round_seconds = config.round_seconds(),
            rest_seconds = config.rest_seconds(),
            "config updated"
        );
    }

    pub fn status(&self) -> SequencerStatus {
        match (self.in_progress, self.running) {
            (false, _) => SequencerStatus::Idle,
            (true, true) => SequencerStatus::Running,
            (true, false) => SequencerStatus::Stopped,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            current_round: self.current_round,
            total_rounds: self.config.total_rounds(),
            period: self.period,
            running: self.running,
            status: self.status(),
            seconds_remaining: self.engine.seconds_remaining(),
            period_length: self.engine.period_length(),
            progress: self.engine.progress(),
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn period(&self) -> PeriodKind {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
