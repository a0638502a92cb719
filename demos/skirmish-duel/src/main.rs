use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use skirmish::prelude::*;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

const RECORDS: &str = r#"{
    "lobbies": {
        "main": { "spawn": { "x": 500.0, "y": 64.0, "z": 500.0 }, "games": ["duel"] }
    },
    "games": {
        "duel": {
            "type": "free_for_all",
            "viable_arenas": ["canyon"],
            "center": "center",
            "radius": 60,
            "waiting_room": "tower",
            "min_players": 2,
            "start_delay": 40,
            "points_to_win": 1,
            "default_kit": ["biplane"],
            "buttons": {
                "shop": { "blocks": ["shop"], "buy_cost": 10, "on_buy": "rockets" }
            },
            "money": { "enabled": true, "enemy_kill": 25, "enemy_hit": 1 }
        }
    },
    "arenas": {
        "canyon": {
            "locations": {
                "center": { "x": 0.5, "y": 64.0, "z": 0.5 },
                "tower": { "x": 0.0, "y": 140.0, "z": 0.0 },
                "shop": { "x": 3.0, "y": 64.0, "z": 3.0 }
            }
        }
    },
    "engines": { "rotary": { "max_fuel": 80.0, "acceleration": 0.4, "max_speed": 1.1 } },
    "wings": { "canvas": { "health": 20.0 } },
    "items": { "rockets": { "max_amount": 6, "slot": 1 } },
    "sets": {
        "biplane": {
            "name": "Biplane",
            "engine": "rotary",
            "wings": "canvas",
            "items": { "rockets": 1 }
        },
        "rockets": { "items": { "rockets": 2 } }
    }
}"#;

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// A world that logs everything the engine asks of it.
#[derive(Default)]
struct ConsoleHost {
    positions: Mutex<HashMap<PlayerId, Location>>,
}

impl Host for ConsoleHost {
    fn notify(&self, player: PlayerId, notice: Notice) {
        tracing::info!(%player, key = %notice.key, args = ?notice.args, "notice");
    }

    fn position_of(&self, player: PlayerId) -> Option<Location> {
        self.positions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player)
            .copied()
    }

    fn teleport(&self, player: PlayerId, location: Location) {
        tracing::info!(%player, x = location.x, y = location.y, z = location.z, "teleport");
        self.positions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player, location);
    }

    fn damage(&self, player: PlayerId, amount: f64) {
        tracing::info!(%player, amount, "damage");
    }

    fn kill(&self, player: PlayerId) {
        tracing::info!(%player, "kill");
    }

    fn has_permission(&self, _player: PlayerId, _permission: &str) -> bool {
        true
    }

    fn kill_event(&self, session: SessionId, event: &KillEvent) {
        tracing::info!(
            %session,
            victim = %event.victim,
            killer = ?event.killer,
            kind = %event.kind,
            "kill event"
        );
    }

    fn loadout_changed(&self, player: PlayerId, loadout: &LoadoutBuffer) {
        tracing::info!(
            %player,
            class = loadout.name().unwrap_or("-"),
            rockets = loadout.amount_of("rockets"),
            "loadout changed"
        );
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    skirmish::init_tracing();

    let records: CatalogRecords = serde_json::from_str(RECORDS)?;
    let catalog = Catalog::from_records(records)?;
    let host = Arc::new(ConsoleHost::default());
    let mut lobby = catalog.open_lobby("main", host)?;

    let ace = PlayerId(1);
    let baron = PlayerId(2);
    let session = lobby.join(ace, "duel").await?;
    lobby.join(baron, "duel").await?;

    // Countdown plus the respawn grace.
    tokio::time::sleep(Duration::from_secs(4)).await;

    let handle = lobby.handle(session).ok_or(SessionError::NotFound(session))?;
    handle.pay(ace, 10).await?;
    let shop = Location::new(3.4, 64.2, 3.9);
    let outcome = lobby.click(ace, Some(shop), ClickAction::Left).await?;
    tracing::info!(?outcome, "ace visits the shop");

    let mut health = 20.0;
    for _ in 0..5 {
        lobby
            .hit_player(baron, Attacker::new(ace, "rocket", 8.0))
            .await?;
        health -= 8.0;
        let verdict = lobby
            .damage_player(baron, DamageCause::Custom, health)
            .await?;
        tracing::info!(?verdict, health, "baron takes a rocket");
        if matches!(verdict, DamageVerdict::Killed(_)) {
            break;
        }
    }

    for info in lobby.list_sessions().await {
        tracing::info!(
            session = %info.session_id,
            phase = %info.phase,
            players = info.player_count,
            "session"
        );
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    lobby.shutdown_all().await;
    Ok(())
}
