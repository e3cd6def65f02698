//! Recorder: runs the engine headless against a scripted timeline of
//! phrases and turns every frame into a `Recording`.

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::command::KeywordMatcher;
use crate::config::Config;
use crate::engine::{Command, Engine};
use crate::renderer::Renderer;
use crate::types::{Marker, Recording, TerminalContract};

/// Grid size of headless recordings.
pub const RECORD_CONTRACT: TerminalContract = TerminalContract {
    width: 80,
    height: 24,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEntry {
    /// Seconds from the start of the recording.
    pub at: f32,
    pub phrase: String,
    pub commands: Vec<Command>,
}

/// Longest session `record` accepts.
pub const MAX_RECORD_SECONDS: f32 = 600.0;

/// Parse `<time>:<phrase>` entries and resolve their phrases up front. The
/// result is sorted by time.
pub fn parse_script<S: AsRef<str>>(entries: &[S], matcher: &KeywordMatcher) -> Result<Vec<ScriptEntry>> {
    let mut script = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = entry.as_ref();
        let (time, phrase) = entry
            .split_once(':')
            .with_context(|| format!("script entry {entry:?} is not <time>:<phrase>"))?;
        let at: f32 = time
            .trim()
            .parse()
            .with_context(|| format!("bad time in script entry {entry:?}"))?;
        if !at.is_finite() || at < 0.0 {
            bail!("script entry {entry:?} has a negative time");
        }
        let commands = matcher.match_alternatives(phrase.split('|'));
        if commands.is_empty() {
            bail!("script entry {entry:?} matches no keyword");
        }
        script.push(ScriptEntry {
            at,
            phrase: phrase.to_string(),
            commands,
        });
    }
    script.sort_by(|a, b| a.at.total_cmp(&b.at));
    Ok(script)
}

/// Run `seconds` of simulation at the configured tick rate. Frame `i` shows
/// the state at `i × tick`; script entries fire on the first frame at or
/// after their time.
pub fn record(config: &Config, seconds: f32, script: &[ScriptEntry]) -> Result<Recording> {
    if !seconds.is_finite() || seconds > MAX_RECORD_SECONDS {
        bail!("recording length must be at most {MAX_RECORD_SECONDS} seconds, got {seconds}");
    }
    let tick_ms = config.host.tick_ms;
    let dt = tick_ms as f32 / 1000.0;
    let frame_count = ((seconds.max(0.0) / dt).ceil() as usize).max(1);

    let viewport = config.raster.viewport(RECORD_CONTRACT);
    let mut engine = Engine::new(viewport, config.tuning.clone(), config.render.clone())
        .with_title(config.title());

    let mut scenes = Vec::with_capacity(frame_count);
    let mut markers = Vec::new();
    let mut pending = script.iter().peekable();

    for frame in 0..frame_count {
        if frame > 0 {
            engine.tick(dt);
        }
        // Integer milliseconds keep the schedule free of float drift.
        let now_ms = frame as u64 * tick_ms;
        while let Some(entry) = pending.next_if(|e| (e.at * 1000.0).round() as u64 <= now_ms) {
            debug!(frame, phrase = %entry.phrase, "script entry fired");
            engine.set_status(Some(format!("Heard \"{}\"", entry.phrase)));
            for &command in &entry.commands {
                engine.apply(command);
            }
            markers.push(Marker {
                frame_index: frame,
                label: engine.diagnostics().last_action.clone(),
            });
        }
        scenes.push(engine.render());
    }

    let mut recording = Renderer::render(&scenes, RECORD_CONTRACT, config.raster, tick_ms);
    recording.markers = markers;
    info!(
        frames = recording.frames.len(),
        markers = recording.markers.len(),
        "recording complete"
    );
    Ok(recording)
}
