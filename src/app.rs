use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::{ConfigStore, Preset, Settings};
use crate::engine::CountdownEngine;
use crate::runtime::TimerEvent;
use crate::sequencer::{RoundSequencer, SequencerStatus, TimerSnapshot, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start when idle, stop when running, resume when stopped.
    Toggle,
    Restart,
    Reset,
    Preset(Preset),
    Quit,
}

pub fn command_for_key(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(Command::Toggle),
        KeyCode::Char('s') => Some(Command::Restart),
        KeyCode::Char('r') => Some(Command::Reset),
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char(c @ '1'..='5') => {
            let idx = c as usize - '1' as usize;
            Preset::ALL.get(idx).copied().map(Command::Preset)
        }
        _ => None,
    }
}

pub struct App<C: Clock> {
    sequencer: RoundSequencer<C>,
    settings: Settings,
    store: Box<dyn ConfigStore>,
    last_preset: Option<Preset>,
    should_quit: bool,
}

impl<C: Clock> App<C> {
    pub fn new(settings: Settings, store: Box<dyn ConfigStore>, engine: CountdownEngine<C>) -> Self {
        let sequencer = RoundSequencer::new(settings.timer_config(), engine);
        Self {
            sequencer,
            settings,
            store,
            last_preset: None,
            should_quit: false,
        }
    }

    /// Feed one runtime event. Returns true when the screen should be redrawn.
    pub fn handle_event(&mut self, event: TimerEvent) -> bool {
        match event {
            TimerEvent::Tick => {
                let transition = self.on_tick();
                transition.is_some() || self.sequencer.is_running()
            }
            TimerEvent::Resize => true,
            TimerEvent::Key(key) => match command_for_key(key) {
                Some(cmd) => {
                    self.apply(cmd);
                    true
                }
                None => false,
            },
        }
    }

    pub fn on_tick(&mut self) -> Option<Transition> {
        self.sequencer.tick()
    }

    pub fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Toggle => match self.sequencer.status() {
                SequencerStatus::Idle => self.sequencer.start(),
                SequencerStatus::Running => self.sequencer.stop(),
                SequencerStatus::Stopped => self.sequencer.resume(),
            },
            Command::Restart => self.sequencer.start(),
            Command::Reset => self.sequencer.reset(),
            Command::Preset(preset) => self.apply_preset(preset),
            Command::Quit => self.should_quit = true,
        }
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        let timer = preset.timer_config();
        info!(%preset, "preset selected");
        self.sequencer.update_config(timer);
        self.settings.set_timer_config(timer);
        self.last_preset = Some(preset);
        if let Err(e) = self.store.save(&self.settings) {
            warn!(error = %e, "could not save settings");
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.sequencer.snapshot()
    }

    pub fn sequencer(&self) -> &RoundSequencer<C> {
        &self.sequencer
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn last_preset(&self) -> Option<Preset> {
        self.last_preset
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::FileConfigStore;
    use crate::cue::{Cue, RecordingCuePlayer};
    use crate::engine::PeriodKind;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(store: FileConfigStore) -> (App<ManualClock>, ManualClock, RecordingCuePlayer) {
        let clock = ManualClock::new();
        let cues = RecordingCuePlayer::new();
        let engine = CountdownEngine::new(clock.clone(), Box::new(cues.clone()));
        let settings = store.load();
        (App::new(settings, Box::new(store), engine), clock, cues)
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(command_for_key(key(KeyCode::Char(' '))), Some(Command::Toggle));
        assert_eq!(command_for_key(key(KeyCode::Enter)), Some(Command::Toggle));
        assert_eq!(command_for_key(key(KeyCode::Char('s'))), Some(Command::Restart));
        assert_eq!(command_for_key(key(KeyCode::Char('r'))), Some(Command::Reset));
        assert_eq!(command_for_key(key(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(
            command_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
        assert_eq!(
            command_for_key(key(KeyCode::Char('1'))),
            Some(Command::Preset(Preset::Amateur))
        );
        assert_eq!(
            command_for_key(key(KeyCode::Char('5'))),
            Some(Command::Preset(Preset::UltraQuick))
        );
        assert_eq!(command_for_key(key(KeyCode::Char('6'))), None);
        assert_eq!(command_for_key(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_toggle_cycles_start_stop_resume() {
        let dir = tempdir().unwrap();
        let (mut app, clock, cues) = app(FileConfigStore::with_path(dir.path().join("c.json")));

        assert!(app.handle_event(TimerEvent::Key(key(KeyCode::Char(' ')))));
        assert_eq!(app.snapshot().status, SequencerStatus::Running);

        clock.advance_secs(10);
        app.handle_event(TimerEvent::Tick);
        app.handle_event(TimerEvent::Key(key(KeyCode::Char(' '))));
        assert_eq!(app.snapshot().status, SequencerStatus::Stopped);
        assert_eq!(app.snapshot().seconds_remaining, 170);

        clock.advance_secs(30);
        app.handle_event(TimerEvent::Key(key(KeyCode::Char(' '))));
        assert_eq!(app.snapshot().status, SequencerStatus::Running);
        assert_eq!(app.snapshot().seconds_remaining, 170);
        assert_eq!(cues.played(), vec![Cue::Start]);
    }

    #[test]
    fn test_idle_ticks_do_not_redraw() {
        let dir = tempdir().unwrap();
        let (mut app, clock, _) = app(FileConfigStore::with_path(dir.path().join("c.json")));
        clock.advance_secs(1);
        assert!(!app.handle_event(TimerEvent::Tick));
        assert!(app.handle_event(TimerEvent::Resize));
    }

    #[test]
    fn test_preset_is_applied_and_saved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.json");
        let (mut app, _, _) = app(FileConfigStore::with_path(&path));

        app.handle_event(TimerEvent::Key(key(KeyCode::Char('5'))));
        assert_eq!(app.last_preset(), Some(Preset::UltraQuick));
        assert_eq!(app.snapshot().seconds_remaining, 10);
        assert_eq!(app.snapshot().total_rounds, 3);

        let saved = FileConfigStore::with_path(&path).load();
        assert_eq!(saved.timer_config(), Preset::UltraQuick.timer_config());
    }

    #[test]
    fn test_preset_during_rest_can_end_the_session() {
        let dir = tempdir().unwrap();
        let (mut app, clock, cues) = app(FileConfigStore::with_path(dir.path().join("c.json")));
        app.apply(Command::Toggle);
        for secs in [180, 60, 180, 60, 180] {
            clock.advance_secs(secs);
            assert!(app.on_tick().is_some());
        }
        assert_eq!(app.sequencer().period(), PeriodKind::Rest);
        assert_eq!(app.sequencer().current_round(), 3);

        // Amateur has only 3 rounds
        app.handle_event(TimerEvent::Key(key(KeyCode::Char('1'))));
        clock.advance_secs(60);
        assert_eq!(app.on_tick(), Some(Transition::Finished));
        assert_eq!(app.snapshot().status, SequencerStatus::Idle);
        assert_eq!(cues.count(Cue::Start), 3);
    }

    #[test]
    fn test_reset_and_quit() {
        let dir = tempdir().unwrap();
        let (mut app, clock, _) = app(FileConfigStore::with_path(dir.path().join("c.json")));
        app.apply(Command::Toggle);
        clock.advance_secs(180);
        assert_matches!(app.on_tick(), Some(Transition::RestStarted { after_round: 1 }));
        assert_eq!(app.sequencer().period(), PeriodKind::Rest);

        app.apply(Command::Reset);
        assert_eq!(app.snapshot().status, SequencerStatus::Idle);
        assert_eq!(app.sequencer().period(), PeriodKind::Active);

        assert!(!app.should_quit());
        app.handle_event(TimerEvent::Key(key(KeyCode::Char('q'))));
        assert!(app.should_quit());
    }
}
