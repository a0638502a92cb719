//! Shared fixtures: one armory, two arenas, a free-for-all and a team game.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use skirmish_loadout::{Armory, ArmoryRecords};
use skirmish_session::{
    Arena, ArenaRecord, BonusRecord, GameContext, GameRecord, GameSession, LobbyConfig,
    LobbyRecord, ModeRegistry, RecordingHost, SessionSettings,
};
use skirmish_tick::TickConfig;
use skirmish_types::{Location, SessionId};

pub const LOBBY_SPAWN: Location = Location::new(1000.0, 64.0, 1000.0);
pub const CENTER: Location = Location::new(0.5, 64.0, 0.5);
pub const WAITING: Location = Location::new(0.0, 120.0, 0.0);
pub const RED_BASE: Location = Location::new(-20.0, 70.0, 0.0);
pub const BLUE_BASE: Location = Location::new(20.0, 70.0, 0.0);
pub const SHOP: Location = Location::new(3.0, 64.0, 3.0);
pub const VAULT: Location = Location::new(-3.0, 64.0, 3.0);

pub fn armory() -> Armory {
    let records: ArmoryRecords = serde_json::from_value(serde_json::json!({
        "engines": { "prop": { "max_fuel": 60.0, "acceleration": 0.5, "max_speed": 1.2 } },
        "wings": { "light": { "health": 20.0 } },
        "items": {
            "rockets": { "max_amount": 8, "slot": 1 },
            "flares": { "max_amount": 6 }
        },
        "sets": {
            "fighter": { "name": "Fighter", "engine": "prop", "wings": "light",
                         "items": { "rockets": 2 } },
            "rockets": { "items": { "rockets": 2 } },
            "flares": { "items": { "flares": 3 } },
            "sell": { "mode": "take", "items": { "rockets": 1 } }
        }
    }))
    .unwrap();
    Armory::from_records(&records).unwrap()
}

fn arena_record() -> ArenaRecord {
    serde_json::from_value(serde_json::json!({
        "locations": {
            "center": CENTER,
            "waiting": WAITING,
            "red_base": RED_BASE,
            "blue_base": BLUE_BASE,
            "shop": SHOP,
            "vault": VAULT
        }
    }))
    .unwrap()
}

pub fn arena(name: &str) -> Arena {
    Arena::from_record(name, &arena_record()).unwrap()
}

/// A free-for-all game on `canyon` or `mesa`, with `overrides` merged in.
pub fn ffa(overrides: serde_json::Value) -> GameRecord {
    record(
        serde_json::json!({
            "type": "free_for_all",
            "buttons": {
                "shop": { "blocks": ["shop"], "buy_cost": 5, "on_buy": "rockets",
                          "sell_cost": -2, "on_sell": "sell" },
                "vault": { "blocks": ["vault"], "unlock_cost": 10, "buy_cost": 4,
                           "on_buy": "flares", "permissions": ["skirmish.vault"] }
            }
        }),
        overrides,
    )
}

/// A two-team deathmatch, with `overrides` merged in.
pub fn tdm(overrides: serde_json::Value) -> GameRecord {
    record(
        serde_json::json!({
            "type": "team_deathmatch",
            "points_to_win": 3,
            "teams": [
                { "id": "red", "name": "Red", "color": "red", "location": "red_base" },
                { "id": "blue", "name": "Blue", "color": "blue", "location": "blue_base" }
            ]
        }),
        overrides,
    )
}

fn record(mode: serde_json::Value, overrides: serde_json::Value) -> GameRecord {
    let mut game = serde_json::json!({
        "viable_arenas": ["canyon", "mesa"],
        "center": "center",
        "radius": 40,
        "waiting_room": "waiting",
        "default_kit": ["fighter"]
    });
    for extra in [mode, overrides] {
        if let (Some(base), serde_json::Value::Object(extra)) = (game.as_object_mut(), extra) {
            base.extend(extra);
        }
    }
    serde_json::from_value(game).unwrap()
}

/// Builds a session on `canyon` reporting to `host`.
pub fn session(record: &GameRecord, host: Arc<RecordingHost>) -> GameSession {
    let armory = armory();
    let bonuses: BTreeMap<String, BonusRecord> = BTreeMap::new();
    let registry = ModeRegistry::default();
    let ctx = GameContext {
        armory: &armory,
        bonuses: &bonuses,
        registry: &registry,
        lobby_spawn: LOBBY_SPAWN,
    };
    let (settings, mode) = SessionSettings::build("test", record, arena("canyon"), &ctx).unwrap();
    GameSession::new(SessionId(1), settings, mode, host)
}

pub fn ticks(session: &mut GameSession, n: u64) {
    for _ in 0..n {
        session.tick();
    }
}

/// Two arenas, a free-for-all (`duel`) and a team game (`tdm`).
pub fn lobby_config(duel: GameRecord) -> LobbyConfig {
    LobbyConfig {
        arenas: [("canyon", arena("canyon")), ("mesa", arena("mesa"))]
            .into_iter()
            .map(|(name, arena)| (name.to_string(), arena))
            .collect(),
        games: [("duel", duel), ("tdm", tdm(serde_json::json!({})))]
            .into_iter()
            .map(|(name, record)| (name.to_string(), record))
            .collect(),
        armory: Arc::new(armory()),
        bonuses: BTreeMap::new(),
        registry: ModeRegistry::default(),
        tick_config: TickConfig::default(),
    }
}

pub fn lobby_record() -> LobbyRecord {
    LobbyRecord {
        spawn: LOBBY_SPAWN,
        games: vec!["duel".to_string(), "tdm".to_string()],
    }
}
