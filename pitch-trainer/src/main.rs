//! # Pitch Trainer - headless vocal pitch trainer
//!
//! Listens to the default microphone and reports, several times per second,
//! the sung note and how far it is from a chosen target in cents.
//!
//! ## Architecture
//! - **Audio Thread**: CPAL input callback assembling fixed-size frames
//! - **Communication**: Bounded crossbeam channel, frames dropped when full
//! - **Main Thread**: Analysis loop driven by `select!` over frames, a ~60 FPS
//!   display tick and a shutdown signal
//!
//! Two modes are available: live feedback against one target note, and a
//! melody exercise scored per step once it finishes.

mod audio;
mod display;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender, never, select, tick};
use pitch_core::exercise::{ExerciseTake, MelodyExercise};
use pitch_core::{AnalysisResult, TrainingSession, pitch, tuning};
use settings::TrainerSettings;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Display refresh period (about 60 FPS).
const DISPLAY_INTERVAL: Duration = Duration::from_millis(16);

/// Frames held between the capture callback and the analysis loop.
const FRAME_QUEUE_DEPTH: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "pitch-trainer", version, about = "Live vocal pitch feedback")]
struct Args {
    /// Target note, e.g. A3 or C#4; with --melody, the melody's root
    #[arg(short, long)]
    note: Option<String>,

    /// Samples per analysis frame
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Requested capture sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Load settings from a JSON file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings to a JSON file
    #[arg(long)]
    save_settings: Option<PathBuf>,

    /// Sing the melody exercise from the settings instead of a single note
    #[arg(long)]
    melody: bool,

    /// Melody tempo in beats per minute
    #[arg(long)]
    tempo: Option<u32>,

    /// Stop after this many seconds (live mode)
    #[arg(long)]
    seconds: Option<u64>,

    /// Print the selectable notes and exit
    #[arg(long)]
    list_notes: bool,

    /// With --list-notes, print JSON
    #[arg(long, requires = "list_notes")]
    json: bool,
}

impl Args {
    /// Applies command-line overrides on top of loaded settings.
    fn apply(&self, settings: &mut TrainerSettings) {
        if let Some(note) = &self.note {
            settings.target_note = note.clone();
            if self.melody {
                settings.melody.root = note.clone();
            }
        }
        if let Some(buffer_size) = self.buffer_size {
            settings.buffer_size = buffer_size;
        }
        if let Some(sample_rate) = self.sample_rate {
            settings.sample_rate = sample_rate;
        }
        if let Some(tempo) = self.tempo {
            settings.melody.tempo_bpm = tempo;
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_notes {
        return list_notes(args.json);
    }

    let mut settings = match &args.settings {
        Some(path) => settings::load_settings(path)?,
        None => TrainerSettings::default(),
    };
    args.apply(&mut settings);
    settings.validate()?;

    if let Some(path) = &args.save_settings {
        settings::save_settings(&settings, path)?;
        info!(target: "main", "Settings saved to {}", path.display());
    }

    let mut session = TrainingSession::new(settings.detector, settings.sample_rate)?;
    session
        .select_target(&settings.target_note)
        .context("selecting target note")?;

    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Vec<f32>>(FRAME_QUEUE_DEPTH);
    let (stream, sample_rate) =
        audio::start_audio_capture(frame_tx, settings.sample_rate, settings.buffer_size)?;
    session.set_sample_rate(sample_rate);

    // Held until exit so the channel stays open if stdin closes.
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    spawn_enter_listener(BufReader::new(std::io::stdin()), shutdown_tx.clone());

    let outcome = if args.melody {
        run_melody(&session, &settings.melody, &frame_rx, &shutdown_rx)
    } else {
        let deadline = match args.seconds {
            Some(seconds) => crossbeam_channel::after(Duration::from_secs(seconds)),
            None => never(),
        };
        run_live(&mut session, &frame_rx, &shutdown_rx, &deadline)
    };

    info!(target: "main", "Stopping stream and exiting...");
    if let Err(e) = stream.pause() {
        warn!(target: "main", "Error pausing stream: {}", e);
    }
    drop(stream);
    outcome
}

/// Prints the note catalog, as text or JSON.
fn list_notes(json: bool) -> Result<()> {
    let notes = tuning::available_notes();
    if json {
        println!("{}", serde_json::to_string_pretty(notes)?);
    } else {
        for note in notes {
            let marker = if note.name == tuning::DEFAULT_TARGET_NOTE { " *" } else { "" };
            println!("{}{}", display::format_catalog_note(note), marker);
        }
    }
    Ok(())
}

/// Spawns a thread that signals shutdown when Enter is pressed.
///
/// A closed or unreadable stdin (`</dev/null`, cron) sends nothing, so the
/// run continues until `--seconds` or the end of the melody.
fn spawn_enter_listener<R>(mut input: R, shutdown_tx: Sender<()>) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(n) if n > 0 => {
                let _ = shutdown_tx.send(());
            }
            Ok(_) => debug!(target: "main", "stdin closed, Enter will not stop the run"),
            Err(e) => debug!(target: "main", "stdin unreadable: {}", e),
        }
    })
}

/// Live feedback against the session's target until shutdown.
fn run_live(
    session: &mut TrainingSession,
    frames: &Receiver<Vec<f32>>,
    shutdown: &Receiver<()>,
    deadline: &Receiver<Instant>,
) -> Result<()> {
    let ticker = tick(DISPLAY_INTERVAL);
    let mut latest = AnalysisResult::default();
    let mut stdout = std::io::stdout();

    println!("{}", display::format_target(session.target()));
    println!("Sing into your microphone! Press Enter to stop.");
    session.start();

    loop {
        select! {
            recv(frames) -> msg => match msg {
                Ok(frame) => latest = session.analyze(&frame),
                Err(_) => {
                    warn!(target: "main", "Audio channel closed");
                    break;
                }
            },
            recv(ticker) -> _ => {
                write!(stdout, "\r{:<80}", display::format_result(&latest))?;
                stdout.flush()?;
            },
            recv(shutdown) -> _ => break,
            recv(deadline) -> _ => break,
        }
    }

    session.stop();
    println!();
    Ok(())
}

/// Counts the singer in at the melody's tempo, printing "3... 2... 1...".
///
/// Frames captured meanwhile are discarded. Returns `false` when shutdown
/// was requested or the audio stream ended first.
fn count_in(
    melody: &MelodyExercise,
    frames: &Receiver<Vec<f32>>,
    shutdown: &Receiver<()>,
) -> Result<bool> {
    let ticker = tick(DISPLAY_INTERVAL);
    let done = crossbeam_channel::after(melody.count_in());
    let start = Instant::now();
    let mut stdout = std::io::stdout();
    let mut shown = None;

    loop {
        select! {
            recv(frames) -> msg => {
                if msg.is_err() {
                    warn!(target: "main", "Audio channel closed");
                    return Ok(false);
                }
            },
            recv(ticker) -> _ => {
                let beat = melody.count_in_beat(start.elapsed());
                if beat != shown {
                    shown = beat;
                    if let Some(number) = beat {
                        write!(stdout, "{}... ", number)?;
                        stdout.flush()?;
                    }
                }
            },
            recv(done) -> _ => break,
            recv(shutdown) -> _ => {
                println!();
                return Ok(false);
            },
        }
    }

    println!("Sing now!");
    Ok(true)
}

/// Sings through a melody exercise and prints per-step results.
fn run_melody(
    session: &TrainingSession,
    melody: &MelodyExercise,
    frames: &Receiver<Vec<f32>>,
    shutdown: &Receiver<()>,
) -> Result<()> {
    let mut take = ExerciseTake::new(melody).context("preparing melody exercise")?;
    let targets = melody.targets()?;
    let labels: Vec<String> = melody.steps.iter().map(|s| s.label()).collect();
    println!(
        "Melody over {} at {} bpm: {}",
        melody.root,
        melody.tempo(),
        labels.join(" ")
    );

    if !count_in(melody, frames, shutdown)? {
        info!(target: "main", "Melody interrupted");
        return Ok(());
    }

    let end = crossbeam_channel::after(melody.total_duration());
    let start = Instant::now();
    let mut current_step = None;

    loop {
        select! {
            recv(frames) -> msg => {
                let Ok(frame) = msg else {
                    warn!(target: "main", "Audio channel closed");
                    break;
                };
                let Some(step) = melody.step_at(start.elapsed()) else { break };
                if current_step != Some(step) {
                    current_step = Some(step);
                    println!("Step {} ({:.1} Hz)", labels[step], targets[step]);
                }
                if let Some(frequency) =
                    pitch::detect_pitch_with(&frame, session.sample_rate(), session.config())
                {
                    take.record(step, frequency);
                }
            },
            recv(end) -> _ => break,
            recv(shutdown) -> _ => {
                info!(target: "main", "Melody interrupted");
                break;
            },
        }
    }

    for (step, result) in melody.steps.iter().zip(take.results()) {
        println!("{}", display::format_step_result(step, &result));
    }
    if take.all_on_pitch() {
        println!("Great job! All notes were on pitch!");
    } else {
        println!("Recording complete. Check your pitch accuracy above.");
    }
    Ok(())
}
