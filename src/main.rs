use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use ringside::{
    app::App,
    clock::{Clock, SystemClock},
    config::{parse_clock, ConfigError, ConfigStore, FileConfigStore, Preset, Settings, TimerConfig},
    cue::{Cue, CueMap, CuePlayer, MutedCuePlayer, RodioCuePlayer},
    engine::CountdownEngine,
    error,
    logging,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    ui,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use tracing::{info, warn};

/// round-based interval timer for combat-sports training
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A round timer for boxing and other combat-sports training. Alternates fight and rest periods, rings a bell when a round ends and a start cue when the next one begins. Settings given on the command line are remembered for next time."
)]
pub struct Cli {
    /// number of rounds
    #[clap(short = 'n', long, value_parser = parse_rounds)]
    rounds: Option<u32>,

    /// length of each round, as M:SS or seconds (0:05 to 30:00)
    #[clap(short = 'r', long = "round", value_parser = parse_round)]
    round_seconds: Option<u32>,

    /// rest between rounds, as M:SS or seconds (0:05 to 10:00)
    #[clap(short = 'b', long = "rest", value_parser = parse_rest)]
    rest_seconds: Option<u32>,

    /// start from a preset; --rounds, --round and --rest still override it
    #[clap(short = 'p', long, value_enum)]
    preset: Option<Preset>,

    /// custom sound for the start of each round (mp3, wav or ogg, max 10 MiB)
    #[clap(long)]
    start_sound: Option<PathBuf>,

    /// custom sound for the end of each round (mp3, wav or ogg, max 10 MiB)
    #[clap(long)]
    bell_sound: Option<PathBuf>,

    /// cue volume in percent
    #[clap(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,

    /// run without sound
    #[clap(long)]
    mute: bool,

    /// play a single cue and exit
    #[clap(long, value_enum)]
    test_sound: Option<Cue>,
}

fn parse_rounds(s: &str) -> Result<u32, Box<dyn Error + Send + Sync>> {
    let rounds: u32 = s.trim().parse()?;
    TimerConfig::default().set_total_rounds(rounds)?;
    Ok(rounds)
}

fn parse_round(s: &str) -> Result<u32, ConfigError> {
    let secs = parse_clock(s)?;
    TimerConfig::default().set_round_seconds(secs)?;
    Ok(secs)
}

fn parse_rest(s: &str) -> Result<u32, ConfigError> {
    let secs = parse_clock(s)?;
    TimerConfig::default().set_rest_seconds(secs)?;
    Ok(secs)
}

impl Cli {
    /// Merge explicit arguments over the stored settings.
    fn apply_to(&self, settings: &mut Settings) -> error::Result<()> {
        let mut timer = self
            .preset
            .map(Preset::timer_config)
            .unwrap_or_else(|| settings.timer_config());
        if let Some(rounds) = self.rounds {
            timer.set_total_rounds(rounds)?;
        }
        if let Some(secs) = self.round_seconds {
            timer.set_round_seconds(secs)?;
        }
        if let Some(secs) = self.rest_seconds {
            timer.set_rest_seconds(secs)?;
        }
        settings.set_timer_config(timer);

        if let Some(volume) = self.volume {
            settings.volume = volume;
        }

        // validate before remembering
        let mut cues = CueMap::new();
        if let Some(path) = &self.start_sound {
            cues.set(Cue::Start, path)?;
            settings.start_sound = Some(path.clone());
        }
        if let Some(path) = &self.bell_sound {
            cues.set(Cue::Bell, path)?;
            settings.bell_sound = Some(path.clone());
        }
        Ok(())
    }

    fn cue_player(&self, settings: &Settings) -> Box<dyn CuePlayer> {
        if self.mute {
            Box::new(MutedCuePlayer)
        } else {
            Box::new(RodioCuePlayer::new(settings.cue_map(), settings.volume))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = logging::init();

    let store = FileConfigStore::new();
    let mut settings = store.load();
    if let Err(e) = cli.apply_to(&mut settings) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e).exit();
    }
    if let Err(e) = store.save(&settings) {
        warn!(path = ?store.path(), error = %e, "could not save settings");
    }

    if let Some(cue) = cli.test_sound {
        let player = RodioCuePlayer::new(settings.cue_map(), settings.volume);
        player.play_blocking(cue)?;
        println!("played the {cue} cue");
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let engine = CountdownEngine::new(SystemClock, cli.cue_player(&settings));
    let mut app = App::new(settings, Box::new(store), engine);
    info!("ringside starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    terminal.draw(|f| ui::draw(app, f))?;
    while !app.should_quit() {
        if app.handle_event(runner.step()) {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }

    info!("ringside exiting");
    Ok(())
}
