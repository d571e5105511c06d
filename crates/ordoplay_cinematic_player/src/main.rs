// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` Cinematic Player - headless cinematic playback
//!
//! Runs a cinematic on a simulated frame loop and reports everything the
//! engine does through `tracing`:
//! - `<sequence.ron>` plays an in-process shot sequence
//! - `--scene NAME:SECONDS` plays a simulated scene timeline through the loader
//!
//! `--save FILE` keeps seen flags in a JSON save file, so a second run of a
//! play-once cinematic short-circuits.

mod console;
mod error;
mod log_tally;
mod simulation;

use clap::Parser;
use console::{
    ConsoleAudio, ConsoleCamera, ConsoleFader, ConsoleGate, ConsoleHooks, ConsolePlayer,
    ConsoleQuests, ConsoleSpawn, ConsoleSubtitles, ScheduledSkip,
};
use error::{PlayerError, Result};
use log_tally::LogTally;
use ordoplay_cinematic::{
    shared, CinematicServices, CinematicSettings, FrameScheduler, JsonSaveFile, LoaderPhase,
    Presentation, SceneCinematicConfig, SceneCinematicLoader, SceneServices, SeenFlagStore,
    SequenceDefinition, SequenceRunner,
};
use simulation::SimulatedScenes;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Simulated seconds allowed beyond a cinematic's expected length
const SAFETY_MARGIN_SECONDS: f64 = 10.0;

/// Exit anchor registered for simulated scene cinematics
const SCENE_EXIT_ANCHOR: &str = "cinematic_exit";

#[derive(Parser, Debug)]
#[command(
    name = "ordoplay_cinematic_player",
    about = "Play OrdoPlay cinematics headlessly with log output",
    version
)]
struct Cli {
    /// Sequence file (RON)
    #[arg(required_unless_present = "scene", conflicts_with = "scene")]
    sequence: Option<PathBuf>,

    /// Play a simulated scene timeline instead
    #[arg(long, value_name = "NAME:SECONDS")]
    scene: Option<String>,

    /// Engine settings file (RON)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// JSON save file holding seen flags
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Simulated frame rate
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,

    /// Hold the skip input from this many seconds in
    #[arg(long, value_name = "SECONDS")]
    skip_at: Option<f64>,
}

fn main() {
    let tally = LogTally::default();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ordoplay_cinematic=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tally.clone())
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting OrdoPlay Cinematic Player v{}", env!("CARGO_PKG_VERSION"));

    let report = match run(&cli) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Playback failed: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        elapsed = report.elapsed,
        scene_loads = report.scene_loads,
        warnings = tally.warnings(),
        errors = tally.errors(),
        "Playback finished"
    );
    if tally.errors() > 0 {
        std::process::exit(2);
    }
}

/// What one player run did
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlaybackReport {
    /// Simulated seconds until the cinematic was done
    elapsed: f64,
    /// Scene loads the run started
    scene_loads: usize,
}

/// Shared state for one player run
struct Session {
    scheduler: FrameScheduler,
    frame_seconds: f32,
    settings: CinematicSettings,
    services: CinematicServices,
    skip_at: Option<f64>,
}

impl Session {
    /// Tick until `done` holds, failing once `limit` seconds have passed
    fn drive(&self, limit: f64, mut done: impl FnMut() -> bool) -> Result<f64> {
        while self.scheduler.now() < limit {
            self.scheduler.tick(self.frame_seconds);
            if done() {
                return Ok(self.scheduler.now());
            }
        }
        Err(PlayerError::Timeout(limit))
    }

    fn skip_due(&self) -> bool {
        self.skip_at.is_some_and(|at| self.scheduler.now() >= at)
    }
}

fn run(cli: &Cli) -> Result<PlaybackReport> {
    let settings = match &cli.settings {
        Some(path) => CinematicSettings::load(path)?,
        None => CinematicSettings::default(),
    };
    tracing::debug!(
        "Engine settings:\n{}",
        ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default())?
    );

    let store = match &cli.save {
        Some(path) => {
            let store = SeenFlagStore::from_save_file(JsonSaveFile::new(path))?;
            tracing::info!(path = %path.display(), seen = ?store.seen_ids(), "Loaded save file");
            store
        }
        None => SeenFlagStore::new(),
    };

    let session = Session {
        scheduler: FrameScheduler::new(),
        frame_seconds: 1.0 / cli.fps as f32,
        settings,
        services: CinematicServices::new(shared(ConsoleGate))
            .with_policy(shared(store))
            .with_spawn(shared(ConsoleSpawn::default())),
        skip_at: cli.skip_at,
    };

    match (&cli.scene, &cli.sequence) {
        (Some(arg), _) => {
            let (scene, seconds) = parse_scene_arg(arg)?;
            play_scene(&session, &scene, seconds)
        }
        (None, Some(path)) => play_sequence(&session, path),
        (None, None) => Err(PlayerError::NothingToPlay),
    }
}

fn play_sequence(session: &Session, path: &Path) -> Result<PlaybackReport> {
    let sequence = SequenceDefinition::load(path)?;
    tracing::info!(
        id = sequence.effective_id(),
        shots = sequence.shot_count(),
        nominal = sequence.nominal_duration(),
        "Loaded sequence"
    );
    let limit = f64::from(sequence.nominal_duration())
        + f64::from(session.settings.handoff_fade_seconds)
        + SAFETY_MARGIN_SECONDS;

    let presentation = Presentation {
        camera: shared(ConsoleCamera::default()),
        fader: shared(ConsoleFader::default()),
        subtitles: shared(ConsoleSubtitles::default()),
        audio: shared(ConsoleAudio),
        skip: shared(ScheduledSkip::new(session.scheduler.clock(), session.skip_at)),
        hooks: Some(shared(ConsoleHooks)),
    };
    let runner = SequenceRunner::new(
        session.scheduler.clone(),
        session.services.clone(),
        presentation,
        session.settings.clone(),
    );

    if !runner.play(Rc::new(sequence)) {
        return Err(PlayerError::NotStarted);
    }
    let elapsed = session.drive(limit, || !runner.is_playing())?;
    tracing::info!(outcome = ?runner.last_outcome(), elapsed, "Sequence done");
    Ok(PlaybackReport {
        elapsed,
        scene_loads: 0,
    })
}

fn play_scene(session: &Session, scene: &str, seconds: f64) -> Result<PlaybackReport> {
    let config = SceneCinematicConfig::new(scene)
        .play_once(scene)
        .with_exit_anchor(SCENE_EXIT_ANCHOR);
    let provider = shared(SimulatedScenes::new(session.scheduler.clock(), scene, seconds));
    let scenes = SceneServices::new(provider.clone())
        .with_player(shared(ConsolePlayer::default()))
        .with_quests(shared(ConsoleQuests));

    let loader = SceneCinematicLoader::new(
        session.scheduler.clone(),
        config,
        session.settings.clone(),
        session.services.clone(),
        scenes,
    );
    let limit = session.settings.soft_timeout(seconds) + SAFETY_MARGIN_SECONDS;

    if !loader.play() {
        return Err(PlayerError::NotStarted);
    }
    let elapsed = session.drive(limit, || {
        if loader.phase() == LoaderPhase::Playing && session.skip_due() {
            loader.stop();
        }
        !loader.is_playing()
    })?;
    let scene_loads = provider.borrow().loads();
    tracing::info!(elapsed, scene_loads, "Scene cinematic done");
    Ok(PlaybackReport {
        elapsed,
        scene_loads,
    })
}

/// Parse `NAME:SECONDS`
fn parse_scene_arg(arg: &str) -> Result<(String, f64)> {
    let invalid = || PlayerError::InvalidSceneArg(arg.to_string());
    let (name, seconds) = arg.rsplit_once(':').ok_or_else(invalid)?;
    let name = name.trim();
    let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;
    if name.is_empty() || !seconds.is_finite() || seconds <= 0.0 {
        return Err(invalid());
    }
    Ok((name.to_string(), seconds))
}
