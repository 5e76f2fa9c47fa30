//! Run output: one JSON object per gameplay event plus a closing summary.

use std::io::Write;

use anyhow::Result;
use corebreak_common::Millis;
use corebreak_gameplay::{GameEvent, LevelState, PresentationRequest, ScoreBoard};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct Line<'a> {
    t: Millis,
    #[serde(flatten)]
    event: &'a GameEvent,
}

/// Writes events as JSON lines.
pub struct JsonLines<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> JsonLines<W> {
    /// Wraps a writer.
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Writes one event stamped with the simulation time.
    pub fn emit(&mut self, now: Millis, event: &GameEvent) -> Result<()> {
        serde_json::to_writer(&mut self.out, &Line { t: now, event })?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Lines written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the writer.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Counts of cosmetic requests over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentationTally {
    /// Animation requests
    pub animations: usize,
    /// Sound requests
    pub sounds: usize,
    /// Effect requests
    pub effects: usize,
}

impl PresentationTally {
    /// Adds a batch of requests.
    pub fn record(&mut self, requests: &[PresentationRequest]) {
        for request in requests {
            match request {
                PresentationRequest::Animation { .. } => self.animations += 1,
                PresentationRequest::Sound { .. } => self.sounds += 1,
                PresentationRequest::Effect { .. } => self.effects += 1,
            }
        }
    }
}

/// Logs the end-of-run summary.
pub fn summarize(now: Millis, level: &LevelState, board: &ScoreBoard, fx: PresentationTally) {
    let stats = board.stats();
    let outcome = if level.is_completed() {
        "completed"
    } else if level.is_failed() {
        "failed"
    } else {
        "unresolved"
    };
    info!(
        level = %level.level_id,
        outcome,
        elapsed_ms = now,
        score = board.score(),
        kills = stats.enemies_killed,
        bosses = stats.bosses_defeated,
        pickups = stats.pickups_collected,
        damage = stats.total_damage_dealt,
        "run finished"
    );
    info!(
        animations = fx.animations,
        sounds = fx.sounds,
        effects = fx.effects,
        "presentation requests"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use corebreak_gameplay::ActorKind;

    #[test]
    fn test_event_line_is_flat_json() {
        let mut lines = JsonLines::new(Vec::new());
        lines
            .emit(
                1500,
                &GameEvent::ActorKilled {
                    kind: ActorKind::GroundMelee,
                },
            )
            .expect("write");
        lines.emit(1600, &GameEvent::EncounterCompleted).expect("write");
        assert_eq!(lines.written(), 2);

        let bytes = lines.finish().expect("flush");
        let text = String::from_utf8(bytes).expect("utf8");
        let rows: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).expect("json"))
            .collect();
        assert_eq!(rows[0]["t"], 1500);
        assert_eq!(rows[0]["event"], "actor_killed");
        assert_eq!(rows[0]["kind"], "ground_melee");
        assert_eq!(rows[1]["event"], "encounter_completed");
    }

    #[test]
    fn test_tally_counts_by_kind() {
        let mut tally = PresentationTally::default();
        tally.record(&[
            PresentationRequest::Sound { key: "shoot".into() },
            PresentationRequest::Sound { key: "hit".into() },
        ]);
        assert_eq!(tally.sounds, 2);
        assert_eq!(tally.animations, 0);
    }
}
