use std::{fs, process};

use anyhow::{Context, Result, bail};
use tracing::info;

use stickwar::{
    command::KeywordMatcher,
    config::Config,
    host::Host,
    logging::{self, Sink},
    player::Player,
    recorder,
    types::Recording,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const RUN_USAGE: &str = "stickwar [run]";
const RECORD_USAGE: &str = "stickwar record <output.json> <seconds> [<time>:<phrase>]...";
const PLAY_USAGE: &str = "stickwar play <recording.json>";

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        None | Some("run") => {
            logging::init(Sink::File)?;
            live()
        }
        Some("record") => {
            let output_path = args.next().context(RECORD_USAGE)?;
            let seconds = args.next().context(RECORD_USAGE)?;
            let seconds: f32 = seconds
                .parse()
                .with_context(|| format!("Bad duration {seconds:?}\n\nUsage: {RECORD_USAGE}"))?;
            let script: Vec<String> = args.collect();
            logging::init(Sink::Stderr)?;
            record(&output_path, seconds, &script)
        }
        Some("play") => {
            let path = args.next().context(PLAY_USAGE)?;
            logging::init(Sink::File)?;
            play(&path)
        }
        _ => bail!(
            "StickWar: stick-figure animation in the terminal\n\nUsage:\n  {RUN_USAGE}\n  {RECORD_USAGE}\n  {PLAY_USAGE}"
        ),
    }
}

fn live() -> Result<()> {
    let config = Config::load();
    let (cols, rows) = crossterm::terminal::size().context("Failed to query terminal size")?;
    let mut host = Host::new(config, Host::contract_for(cols, rows));
    host.run()
}

fn record(output_path: &str, seconds: f32, script: &[String]) -> Result<()> {
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("Duration must be a positive number of seconds, got {seconds}");
    }
    let config = Config::load();
    let matcher = KeywordMatcher::new(&config.keywords);
    let script = recorder::parse_script(script, &matcher)?;

    let recording = recorder::record(&config, seconds, &script)?;

    let output_json = serde_json::to_string_pretty(&recording)?;
    fs::write(output_path, &output_json)
        .with_context(|| format!("Failed to write {output_path}"))?;
    info!(path = output_path, "recording written");

    eprintln!(
        "Recorded {} frames ({} actions) -> {}",
        recording.frames.len(),
        recording.markers.len(),
        output_path,
    );

    Ok(())
}

fn play(path: &str) -> Result<()> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let recording: Recording =
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {path}"))?;

    let mut player = Player::new(recording);
    player.play()
}
