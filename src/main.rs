//! fretwise CLI: tuner, metronome, chord preview and note practice.
//!
//! Usage:
//!   fretwise tune [--seconds 30] [--block-size 2048]
//!   fretwise metronome [--bpm 90] [--seconds 10]
//!   fretwise chord am [--strum-ms 50]
//!   fretwise chords
//!   fretwise practice 40 45 50 [--seconds 60] [--block-size 2048]

use std::io::Write;
use std::str::FromStr;
use std::time::{Duration, Instant};
use std::{env, process, thread};

use fw_audio::CpalBackend;
use fw_core::{find_chord, Note, TuningStatus, CHORD_LIBRARY};
use fw_engine::{MatchProgress, NoteMatcher};
use fw_session::{Session, SessionConfig, SessionError};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: fretwise <tune|metronome|chord|chords|practice> [options]
  tune [--seconds N] [--block-size N]
                                     show the detected pitch
  metronome [--bpm N] [--seconds N]  click at N beats per minute
  chord <name> [--strum-ms N]        strum a chord from the library
  chords                             list the chord library
  practice <midi...> [--seconds N] [--block-size N]
                                     play each note until it holds";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or_else(|| {
        eprintln!("{USAGE}");
        process::exit(1);
    });

    let result = match command {
        "tune" => tune(&args),
        "metronome" => metronome(&args),
        "chord" => chord(&args),
        "chords" => {
            list_chords();
            Ok(())
        }
        "practice" => practice(&args),
        _ => {
            eprintln!("Unknown command: {command}\n{USAGE}");
            process::exit(1);
        }
    };

    if let Err(err) = result {
        if err.is_permission() {
            eprintln!("Microphone access was denied: {err}");
        } else {
            eprintln!("Error: {err}");
        }
        process::exit(1);
    }
}

/// Value following `flag`, parsed, or `default` when the flag is absent.
fn flag<T: FromStr>(args: &[String], flag: &str, default: T) -> T {
    let Some(raw) = args
        .iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
    else {
        return default;
    };
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Invalid value for {flag}: {raw}");
        process::exit(1);
    })
}

/// Positional arguments after the command, up to the first flag.
fn positionals(args: &[String]) -> &[String] {
    let rest = args.get(1..).unwrap_or_default();
    let end = rest.iter().position(|a| a.starts_with("--")).unwrap_or(rest.len());
    &rest[..end]
}

fn open_session(args: &[String]) -> Session<CpalBackend> {
    let defaults = SessionConfig::default();
    let block_size: usize = flag(args, "--block-size", defaults.block_size);
    Session::new(CpalBackend::new(), defaults.with_block_size(block_size))
}

fn tune(args: &[String]) -> Result<(), SessionError> {
    let seconds: u64 = flag(args, "--seconds", 30);
    let mut session = open_session(args);
    session.start_pitch_detection()?;
    println!("Listening for {seconds} s...");

    let deadline = Instant::now() + Duration::from_secs(seconds);
    while Instant::now() < deadline {
        let reading = session.poll_pitch();
        match (reading.note, reading.cents, reading.status()) {
            (Some(note), Some(cents), Some(status)) => {
                let status = match status {
                    TuningStatus::InTune => "in tune",
                    TuningStatus::Flat => "flat",
                    TuningStatus::Sharp => "sharp",
                };
                print!(
                    "\r{:>4} | {:>4} Hz | {:+3} cents | {:<8}",
                    note.to_string(),
                    reading.frequency_hz,
                    cents,
                    status
                );
            }
            _ => print!("\r   - |    - Hz |     cents |         "),
        }
        let _ = std::io::stdout().flush();
        thread::sleep(Duration::from_millis(100));
    }

    session.dispose();
    println!("\nDone.");
    Ok(())
}

fn metronome(args: &[String]) -> Result<(), SessionError> {
    let bpm: u32 = flag(args, "--bpm", 60);
    let seconds: u64 = flag(args, "--seconds", 10);

    let mut session = open_session(args);
    let applied = session.set_metronome_rate(bpm);
    if applied != bpm {
        println!("Tempo clamped to {applied} BPM");
    }
    session.start_metronome()?;
    println!("Clicking at {applied} BPM for {seconds} s...");

    thread::sleep(Duration::from_secs(seconds));
    session.dispose();
    println!("Done.");
    Ok(())
}

fn chord(args: &[String]) -> Result<(), SessionError> {
    let name = positionals(args).join(" ");
    let Some(shape) = find_chord(&name) else {
        eprintln!("Unknown chord: {name:?}. Try `fretwise chords`.");
        process::exit(1);
    };
    let strum_ms: u32 = flag(args, "--strum-ms", 50);

    let mut session = open_session(args);
    let strings = session.play_chord(&shape.voices(), f64::from(strum_ms) / 1000.0)?;
    println!("{} ({} strings)", shape.name, strings);

    // Let the last string ring out before the device closes.
    let ring = f64::from(session.config().pluck.duration_seconds)
        + 6.0 * f64::from(strum_ms) / 1000.0;
    thread::sleep(Duration::from_secs_f64(ring + 0.1));
    session.dispose();
    Ok(())
}

fn list_chords() {
    for shape in CHORD_LIBRARY.iter() {
        let frets: Vec<String> = shape
            .frets
            .iter()
            .map(|&f| if f < 0 { "x".to_string() } else { f.to_string() })
            .collect();
        println!("{:<7} {:<15} {}", shape.id, shape.name, frets.join(" "));
    }
}

fn practice(args: &[String]) -> Result<(), SessionError> {
    let targets: Vec<i32> = positionals(args)
        .iter()
        .map(|raw| {
            raw.parse().unwrap_or_else(|_| {
                eprintln!("Not a MIDI note number: {raw}");
                process::exit(1);
            })
        })
        .collect();
    if targets.is_empty() {
        eprintln!("practice needs at least one MIDI note, e.g. `fretwise practice 40 45 50`");
        process::exit(1);
    }
    let seconds: u64 = flag(args, "--seconds", 60);

    let mut matcher = NoteMatcher::new(targets);
    let mut session = open_session(args);
    session.start_pitch_detection()?;

    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut announced = None;
    while Instant::now() < deadline {
        if announced != matcher.current_target() {
            announced = matcher.current_target();
            if let Some(midi) = announced {
                println!("\nPlay {}", Note::from_midi(midi));
            }
        }

        let reading = session.poll_pitch();
        match matcher.feed(&reading.estimate) {
            MatchProgress::Listening(feedback) => {
                print!(
                    "\r{:<7} streak {:>2} | {:>3.0}% done ",
                    format!("{feedback:?}"),
                    matcher.streak(),
                    matcher.progress() * 100.0
                );
                let _ = std::io::stdout().flush();
            }
            MatchProgress::Advanced(_) => {}
            MatchProgress::Completed => {
                println!("\nAll notes matched.");
                break;
            }
        }
        thread::sleep(Duration::from_millis(session.config().refresh_interval.as_millis() as u64));
    }

    session.dispose();
    Ok(())
}
