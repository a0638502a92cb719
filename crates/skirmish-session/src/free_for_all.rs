//! Free-for-all: everybody against everybody.

use std::collections::HashMap;

use rand::seq::IndexedRandom;
use serde::Deserialize;
use tracing::info;

use skirmish_combat::Attitude;
use skirmish_types::{
    ConfigurationError, Location, MessageKey, Notice, NoticeArg, PlayerId, Violations,
};

use crate::arena::Arena;
use crate::mode::{GameMode, ModeOutcome, Standing};

/// Mode-specific fields of a `free_for_all` game record.
#[derive(Debug, Clone, Deserialize)]
pub struct FreeForAllRecord {
    /// Arena locations to spawn at, picked at random. Empty: arena center.
    #[serde(default)]
    pub spawns: Vec<String>,
    #[serde(default = "default_kill_score")]
    pub kill_score: i64,
    #[serde(default)]
    pub suicide_score: i64,
    /// The game ends as soon as a player reaches this score.
    #[serde(default)]
    pub points_to_win: Option<i64>,
}

fn default_kill_score() -> i64 {
    1
}

#[derive(Debug)]
pub struct FreeForAll {
    spawns: Vec<Location>,
    kill_score: i64,
    suicide_score: i64,
    points_to_win: Option<i64>,
    scores: HashMap<PlayerId, i64>,
}

impl FreeForAll {
    pub const KIND: &'static str = "free_for_all";

    pub fn from_record(
        path: &str,
        record: &FreeForAllRecord,
        arena: &Arena,
    ) -> Result<Self, ConfigurationError> {
        let mut v = Violations::new(path);
        let spawns_path = v.child("spawns");
        let spawns = record
            .spawns
            .iter()
            .filter_map(|name| v.take(arena.require(&spawns_path, name)))
            .collect();
        if let Some(points) = record.points_to_win {
            v.check(points > 0, "points_to_win must be positive");
        }
        v.finish()?;
        Ok(Self {
            spawns,
            kill_score: record.kill_score,
            suicide_score: record.suicide_score,
            points_to_win: record.points_to_win,
            scores: HashMap::new(),
        })
    }

    pub fn score_of(&self, player: PlayerId) -> i64 {
        self.scores.get(&player).copied().unwrap_or(0)
    }

    fn score(&mut self, player: PlayerId, amount: i64) -> ModeOutcome {
        if amount == 0 {
            return ModeOutcome::Continue;
        }
        let score = self.scores.entry(player).or_insert(0);
        *score += amount;
        match self.points_to_win {
            Some(points) if *score >= points => {
                info!(%player, score = *score, "player reached winning score");
                ModeOutcome::GameOver
            }
            _ => ModeOutcome::Continue,
        }
    }
}

impl GameMode for FreeForAll {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn attitude(&self, observer: Standing, subject: PlayerId) -> Attitude {
        if observer.player == subject {
            Attitude::Neutral
        } else {
            Attitude::Hostile
        }
    }

    fn on_kill(
        &mut self,
        victim: PlayerId,
        killer: Option<PlayerId>,
        attitude: Attitude,
    ) -> ModeOutcome {
        match killer {
            Some(killer) if attitude == Attitude::Hostile => self.score(killer, self.kill_score),
            Some(_) => ModeOutcome::Continue,
            None => self.score(victim, self.suicide_score),
        }
    }

    fn on_respawn(&mut self, _player: PlayerId) -> Option<Location> {
        self.spawns.choose(&mut rand::rng()).copied()
    }

    fn on_leave(&mut self, player: PlayerId) {
        self.scores.remove(&player);
    }

    fn on_stop(&mut self) {
        self.scores.clear();
    }

    fn results(&self, players: &[PlayerId]) -> Vec<(PlayerId, Notice)> {
        let Some(best) = players.iter().map(|p| self.score_of(*p)).max() else {
            return Vec::new();
        };
        let winners: Vec<PlayerId> = players
            .iter()
            .copied()
            .filter(|p| self.score_of(*p) == best)
            .collect();
        let announcement = winners
            .iter()
            .fold(Notice::new(MessageKey::PlayerWin), |n, w| {
                n.arg(NoticeArg::Player(*w))
            });

        let mut out = Vec::with_capacity(players.len() * 2);
        for player in players {
            out.push((*player, announcement.clone()));
            let verdict = if winners.contains(player) {
                MessageKey::Win
            } else {
                MessageKey::Lose
            };
            out.push((*player, Notice::new(verdict)));
        }
        out
    }
}
