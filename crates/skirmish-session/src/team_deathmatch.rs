//! Team deathmatch: teams score for kills until one reaches the target.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info};

use skirmish_combat::Attitude;
use skirmish_types::{
    ConfigurationError, Location, MessageKey, Notice, NoticeArg, PlayerId, TeamId, Violations,
};

use crate::arena::Arena;
use crate::mode::{GameMode, ModeOutcome, Standing};

/// Record for one team of a `team_deathmatch` game.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    /// Arena location the team spawns at.
    pub location: String,
}

/// Mode-specific fields of a `team_deathmatch` game record.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamDeathmatchRecord {
    #[serde(default)]
    pub suicide_score: i64,
    #[serde(default)]
    pub friendly_kill_score: i64,
    #[serde(default = "default_enemy_kill_score")]
    pub enemy_kill_score: i64,
    pub points_to_win: i64,
    /// Teams in definition order. The order breaks ties when balancing.
    #[serde(default)]
    pub teams: Vec<TeamRecord>,
}

fn default_enemy_kill_score() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub color: String,
    pub spawn: Location,
    pub score: i64,
}

#[derive(Debug)]
pub struct TeamDeathmatch {
    teams: Vec<Team>,
    members: HashMap<PlayerId, usize>,
    suicide_score: i64,
    friendly_kill_score: i64,
    enemy_kill_score: i64,
    points_to_win: i64,
}

impl TeamDeathmatch {
    pub const KIND: &'static str = "team_deathmatch";

    pub fn from_record(
        path: &str,
        record: &TeamDeathmatchRecord,
        arena: &Arena,
    ) -> Result<Self, ConfigurationError> {
        let mut v = Violations::new(path);
        v.check(record.points_to_win > 0, "points_to_win must be positive");
        v.check(!record.teams.is_empty(), "teams must be defined");

        let mut teams: Vec<Team> = Vec::with_capacity(record.teams.len());
        for team in &record.teams {
            let id = &team.id;
            let team_path = v.child(&format!("teams.{id}"));
            if teams.iter().any(|t| t.id.as_str() == id) {
                v.push(format!("team '{id}' is defined twice"));
                continue;
            }
            if let Some(spawn) = v.take(arena.require(&team_path, &team.location)) {
                teams.push(Team {
                    id: TeamId::new(id.as_str()),
                    name: team.name.clone(),
                    color: team.color.clone(),
                    spawn,
                    score: 0,
                });
            }
        }

        v.finish()?;
        Ok(Self {
            teams,
            members: HashMap::new(),
            suicide_score: record.suicide_score,
            friendly_kill_score: record.friendly_kill_score,
            enemy_kill_score: record.enemy_kill_score,
            points_to_win: record.points_to_win,
        })
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team_of(&self, player: PlayerId) -> Option<&Team> {
        self.members.get(&player).map(|&i| &self.teams[i])
    }

    /// The team with the fewest members. Ties go to the first-defined team.
    pub fn choose_team(&self) -> Option<&Team> {
        let mut counts = vec![0usize; self.teams.len()];
        for &index in self.members.values() {
            counts[index] += 1;
        }
        counts
            .iter()
            .enumerate()
            .min_by_key(|&(index, count)| (*count, index))
            .map(|(index, _)| &self.teams[index])
    }

    fn choose_index(&self) -> Option<usize> {
        let id = self.choose_team()?.id.clone();
        self.teams.iter().position(|t| t.id == id)
    }

    fn score(&mut self, player: PlayerId, amount: i64) -> ModeOutcome {
        let Some(&index) = self.members.get(&player) else {
            return ModeOutcome::Continue;
        };
        if amount == 0 {
            return ModeOutcome::Continue;
        }
        let team = &mut self.teams[index];
        team.score += amount;
        debug!(team = %team.id, score = team.score, "team scored");
        if team.score >= self.points_to_win {
            info!(team = %team.id, score = team.score, "team reached winning score");
            ModeOutcome::GameOver
        } else {
            ModeOutcome::Continue
        }
    }

    fn winners(&self) -> Vec<usize> {
        let mut fielded: Vec<usize> = self.members.values().copied().collect();
        fielded.sort_unstable();
        fielded.dedup();
        let Some(best) = fielded.iter().map(|&i| self.teams[i].score).max() else {
            return Vec::new();
        };
        fielded
            .into_iter()
            .filter(|&i| self.teams[i].score == best)
            .collect()
    }
}

impl GameMode for TeamDeathmatch {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn attitude(&self, observer: Standing, subject: PlayerId) -> Attitude {
        if !observer.playing {
            return Attitude::Neutral;
        }
        match (self.members.get(&observer.player), self.members.get(&subject)) {
            (Some(a), Some(b)) if a == b => Attitude::Friendly,
            (Some(_), Some(_)) => Attitude::Hostile,
            _ => Attitude::Neutral,
        }
    }

    fn on_kill(
        &mut self,
        victim: PlayerId,
        killer: Option<PlayerId>,
        attitude: Attitude,
    ) -> ModeOutcome {
        match (killer, attitude) {
            (None, _) => self.score(victim, self.suicide_score),
            (Some(_), Attitude::Friendly) => self.score(victim, self.friendly_kill_score),
            (Some(killer), Attitude::Hostile) => self.score(killer, self.enemy_kill_score),
            (Some(_), Attitude::Neutral) => ModeOutcome::Continue,
        }
    }

    fn on_respawn(&mut self, player: PlayerId) -> Option<Location> {
        let index = match self.members.get(&player) {
            Some(&index) => index,
            None => {
                let index = self.choose_index()?;
                self.members.insert(player, index);
                info!(%player, team = %self.teams[index].id, "player assigned to team");
                index
            }
        };
        Some(self.teams[index].spawn)
    }

    fn on_leave(&mut self, player: PlayerId) {
        self.members.remove(&player);
    }

    fn on_stop(&mut self) {
        for team in &mut self.teams {
            team.score = 0;
        }
    }

    fn results(&self, players: &[PlayerId]) -> Vec<(PlayerId, Notice)> {
        let winners = self.winners();
        let names = winners
            .iter()
            .map(|&i| self.teams[i].name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut out = Vec::new();
        for player in players {
            let Some(&index) = self.members.get(player) else {
                continue;
            };
            out.push((
                *player,
                Notice::new(MessageKey::TeamWin).arg(NoticeArg::Text(names.clone())),
            ));
            let verdict = if winners.contains(&index) {
                MessageKey::Win
            } else {
                MessageKey::Lose
            };
            out.push((*player, Notice::new(verdict)));
        }
        out
    }

    fn round_over(&self, alive: &[PlayerId]) -> bool {
        let mut standing: Vec<usize> = alive
            .iter()
            .filter_map(|p| self.members.get(p).copied())
            .collect();
        standing.sort_unstable();
        standing.dedup();
        standing.len() <= 1
    }
}
