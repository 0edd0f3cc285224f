#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs unattended Trail Arena matches.

mod headless;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trail_arena_core::{ArenaConfig, Event, Intent, MatchOutcome};
use trail_arena_rendering::{Color, Presentation, RenderingBackend, RenderingError, Scene};
use trail_arena_session::{Config, FileStore, HighScoreStore, MemoryStore, Session};
use trail_arena_world::query;

use crate::headless::HeadlessBackend;

/// Runs autopilot matches and reports their outcome.
#[derive(Debug, Parser)]
#[command(name = "trail-arena", version, about)]
struct Cli {
    /// Seed shared by every random decision in the session.
    #[arg(long, default_value_t = 0x7a11)]
    seed: u64,
    /// Number of matches to play back to back.
    #[arg(long, default_value_t = 1)]
    matches: u32,
    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Frames a single match may take before it is abandoned.
    #[arg(long, default_value_t = 60_000)]
    max_frames: u32,
    /// TOML file overriding the arena tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// File holding the all-time top score; kept in memory when omitted.
    #[arg(long)]
    high_score: Option<PathBuf>,
}

/// Result of one finished match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MatchSummary {
    outcome: MatchOutcome,
    score: u32,
    top_score: u32,
    frames: u32,
}

/// Entry point for the Trail Arena command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let arena = load_config(cli.config.as_ref())?;
    let summaries = match cli.high_score.clone() {
        Some(path) => play(&cli, arena, FileStore::new(path))?,
        None => play(&cli, arena, MemoryStore::default())?,
    };

    for (index, summary) in summaries.iter().enumerate() {
        println!(
            "match {}: {:?} (code {}) score {} top {} after {} frames",
            index + 1,
            summary.outcome,
            summary.outcome.code(),
            summary.score,
            summary.top_score,
            summary.frames
        );
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<ArenaConfig> {
    let Some(path) = path else {
        return Ok(ArenaConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("invalid config: {}", path.display()))
}

fn play<S>(cli: &Cli, arena: ArenaConfig, store: S) -> Result<Vec<MatchSummary>>
where
    S: HighScoreStore,
{
    let mut session = Session::new(
        arena,
        Config::new(cli.seed).with_player_autopilot(true),
        store,
    )
    .context("failed to load the top score")?;
    println!("{}", query::welcome_banner(session.world()));

    let frame_step = Duration::from_millis(cli.frame_ms.max(1));
    let mut summaries = Vec::new();
    for _ in 0..cli.matches {
        if !summaries.is_empty() {
            session.submit(Intent::Restart);
        }
        session.submit(Intent::TurnLeft);
        let summary = play_match(&mut session, HeadlessBackend::new(frame_step, cli.max_frames))?;
        info!(?summary.outcome, summary.score, "match finished");
        summaries.push(summary);
    }
    Ok(summaries)
}

fn play_match<S, B>(session: &mut Session<S>, backend: B) -> Result<MatchSummary>
where
    S: HighScoreStore,
    B: RenderingBackend,
{
    let scene = Scene::capture(session.world(), session.look_back(), &[])?;
    let presentation = Presentation::new("Trail Arena", Color::from_rgb_u8(0x05, 0x05, 0x10), scene);

    let mut frames = 0;
    let mut summary = None;
    let mut failure: Option<RenderingError> = None;
    backend.run(presentation, |dt, input, scene| {
        for intent in input.intents() {
            session.submit(intent);
        }
        frames += 1;
        let events = session.advance(dt);
        let ended = events.iter().find_map(|event| match event {
            Event::MatchEnded {
                outcome,
                score,
                top_score,
            } => Some((*outcome, *score, *top_score)),
            _ => None,
        });
        match Scene::capture(session.world(), session.look_back(), session.events()) {
            Ok(next) => *scene = next,
            Err(error) => {
                failure = Some(error);
                return false;
            }
        }
        if let Some((outcome, score, top_score)) = ended {
            summary = Some(MatchSummary {
                outcome,
                score,
                top_score,
                frames,
            });
            return false;
        }
        true
    })?;

    if let Some(error) = failure {
        return Err(error.into());
    }
    summary.context("match stopped without a result")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_one_in_memory_match() {
        let cli = Cli::try_parse_from(["trail-arena"]).expect("defaults parse");
        assert_eq!(cli.matches, 1);
        assert_eq!(cli.frame_ms, 16);
        assert!(cli.config.is_none());
        assert!(cli.high_score.is_none());
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("arena.toml");
        fs::write(&path, "[grid]\nhalf_width = 20.0\n\n[ai]\nlook_ahead = 9\n").expect("write");

        let config = load_config(Some(&path)).expect("valid config");
        assert_eq!(config.grid.half_width, 20.0);
        assert_eq!(config.ai.look_ahead, 9);
        assert_eq!(config.grid.cell_size, ArenaConfig::default().grid.cell_size);
        assert_eq!(config.pickups, ArenaConfig::default().pickups);
    }

    #[test]
    fn unreadable_config_names_the_file() {
        let error = load_config(Some(&PathBuf::from("/definitely/missing.toml")))
            .expect_err("missing file");
        assert!(error.to_string().contains("missing.toml"));
    }

    #[test]
    fn autopilot_matches_persist_their_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("top_score");
        let cli = Cli::try_parse_from([
            "trail-arena",
            "--matches",
            "2",
            "--frame-ms",
            "40",
            "--seed",
            "5",
        ])
        .expect("flags parse");

        let summaries = play(&cli, ArenaConfig::default(), FileStore::new(&path)).expect("play");
        assert_eq!(summaries.len(), 2);
        let best = summaries
            .iter()
            .map(|summary| summary.top_score)
            .max()
            .unwrap_or(0);
        assert_eq!(FileStore::new(&path).load().expect("load"), best);
        assert!(summaries
            .iter()
            .all(|summary| summary.outcome != MatchOutcome::Ongoing));
    }
}
