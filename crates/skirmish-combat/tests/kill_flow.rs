//! A hit followed by a death, from the attacker record to the money.

use skirmish_combat::{
    Attacker, Attitude, DamageCause, Hull, KillEvent, KillKind, MoneyConfig, PayoutTable, Target,
    Wallet,
};
use skirmish_types::PlayerId;

const SHOOTER: PlayerId = PlayerId(7);
const VICTIM: PlayerId = PlayerId(8);

fn table() -> PayoutTable {
    PayoutTable::from_config(&MoneyConfig {
        enabled: true,
        enemy_kill: 10,
        by_enemy_death: -5,
        enemy_hit: 1,
        suicide: -2,
        ..MoneyConfig::default()
    })
}

#[test]
fn test_hit_then_fall_pays_both_sides() {
    let table = table();
    let mut hull = Hull::new(6.0);
    hull.set_active(true);
    let mut shooter = Wallet::new(0);
    let mut victim = Wallet::new(2);

    let rocket = Attacker::new(SHOOTER, "rocket", 4.0);
    assert!(hull.handle_hit(&rocket));
    let hit = table.hit(Attitude::Hostile);
    shooter.pay(hit.attacker);
    victim.pay(hit.victim);

    // The plane survives the rocket but not the ground.
    hull.sync_health(-94.0);
    assert!(hull.is_destroyed());
    let event = KillEvent::resolve(VICTIM, hull.last_attacker(), DamageCause::Fall);
    assert_eq!(event.kind, KillKind::ShotDown);
    assert_eq!(event.killer, Some(SHOOTER));

    let kill = table.kill(Attitude::Hostile);
    shooter.pay(kill.attacker);
    victim.pay(kill.victim);
    assert_eq!(shooter.balance(), 11);
    assert_eq!(victim.balance(), 0);
}

#[test]
fn test_unattributed_death_charges_suicide_only() {
    let table = table();
    let hull = Hull::new(6.0);
    let mut victim = Wallet::new(5);

    let event = KillEvent::resolve(VICTIM, hull.last_attacker(), DamageCause::Fall);
    assert_eq!(event.kind, KillKind::Suicide);
    victim.pay(table.suicide());
    assert_eq!(victim.balance(), 3);
}

#[test]
fn test_damage_cause_round_trips_as_snake_case() {
    let cause: DamageCause = serde_json::from_str("\"fly_into_wall\"").unwrap();
    assert_eq!(cause, DamageCause::FlyIntoWall);
    assert!(cause.is_allowed());
}
