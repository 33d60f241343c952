//! Deadline-based countdown for a single period.
//!
//! Remaining time is always recomputed from an absolute deadline, never
//! decremented per tick, so late or irregular ticks cannot make the display
//! drift. Expiry is reported at most once per armed period.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::cue::{Cue, CuePlayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PeriodKind {
    Active,
    Rest,
}

/// Returned by [`CountdownEngine::tick`] when the armed period runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodComplete {
    pub kind: PeriodKind,
}

pub struct CountdownEngine<C: Clock> {
    clock: C,
    player: Box<dyn CuePlayer>,
    kind: PeriodKind,
    period_length: u64,
    /// Only set while running.
    deadline: Option<Instant>,
    remaining_at_pause: u64,
    has_fired_expiry: bool,
}

impl<C: Clock> CountdownEngine<C> {
    /// A paused, zero-length active period. Callers arm before use.
    pub fn new(clock: C, player: Box<dyn CuePlayer>) -> Self {
        Self {
            clock,
            player,
            kind: PeriodKind::Active,
            period_length: 0,
            deadline: None,
            remaining_at_pause: 0,
            has_fired_expiry: false,
        }
    }

    /// Start a fresh period, discarding whatever was armed before.
    pub fn arm(&mut self, kind: PeriodKind, length_secs: u64, start_now: bool) {
        self.kind = kind;
        self.period_length = length_secs;
        self.remaining_at_pause = length_secs;
        self.has_fired_expiry = false;
        self.deadline = if start_now {
            Some(self.clock.now() + Duration::from_secs(length_secs))
        } else {
            None
        };
        debug!(%kind, length_secs, start_now, "armed");
    }

    pub fn resume(&mut self) {
        if self.deadline.is_some() || self.has_fired_expiry {
            return;
        }
        self.deadline = Some(self.clock.now() + Duration::from_secs(self.remaining_at_pause));
        debug!(remaining = self.remaining_at_pause, "resumed");
    }

    pub fn pause(&mut self) {
        let Some(deadline) = self.deadline.take() else {
            return;
        };
        self.remaining_at_pause = ceil_secs(deadline.saturating_duration_since(self.clock.now()));
        debug!(remaining = self.remaining_at_pause, "paused");
    }

    /// Advance the countdown. Safe to call as often as the caller likes;
    /// completion is returned once per armed period and never while paused.
    pub fn tick(&mut self) -> Option<PeriodComplete> {
        if self.has_fired_expiry || self.seconds_remaining() > 0 {
            return None;
        }
        // Zero remaining on a paused engine means nothing was armed yet.
        self.deadline.take()?;

        self.has_fired_expiry = true;
        self.remaining_at_pause = 0;
        if self.kind == PeriodKind::Active {
            self.play_cue(Cue::Bell);
        }
        Some(PeriodComplete { kind: self.kind })
    }

    pub fn seconds_remaining(&self) -> u64 {
        match self.deadline {
            Some(deadline) => ceil_secs(deadline.saturating_duration_since(self.clock.now())),
            None => self.remaining_at_pause,
        }
    }

    /// Elapsed fraction of the armed period, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.period_length == 0 {
            return 0.0;
        }
        let remaining = match self.deadline {
            Some(deadline) => deadline.saturating_duration_since(self.clock.now()),
            None => Duration::from_secs(self.remaining_at_pause),
        };
        let total = self.period_length as f64;
        ((total - remaining.as_secs_f64()) / total).clamp(0.0, 1.0)
    }

    /// Request a cue. Playback failures never reach the caller.
    pub fn play_cue(&mut self, cue: Cue) {
        if let Err(e) = self.player.play(cue) {
            warn!(%cue, error = %e, "could not play cue");
        }
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn has_expired(&self) -> bool {
        self.has_fired_expiry
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    pub fn period_length(&self) -> u64 {
        self.period_length
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
