//! Localized notices the engine asks the host to deliver.
//!
//! The engine never renders text. It names a [`MessageKey`] and attaches
//! typed arguments; the host looks the key up in its language files.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// Keys of every message the engine can emit.
///
/// Serialized in `snake_case`, which is also the key used in language files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    // -- Purchases --
    NoPermission,
    UnlockOther,
    Unlocked,
    CantUse,
    NoMoneyUnlock,
    ItemsAdded,
    ItemsRefilled,
    ItemsRemoved,
    ItemsReplaced,
    CantSell,
    ItemLimit,
    ItemConflict,
    NoMoneyBuy,
    CantDo,

    // -- Waiting room --
    MorePlayers,
    StartDelay,
    RespawnDelay,
    RoundDelay,
    Countdown,
    NoWaiting,

    // -- Combat --
    Killed,
    ShotDown,
    Suicide,
    BonusCollected,

    // -- Game end --
    GameEnds,
    TeamWin,
    PlayerWin,
    Win,
    Lose,
}

impl MessageKey {
    /// The language-file key for this message.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPermission => "no_permission",
            Self::UnlockOther => "unlock_other",
            Self::Unlocked => "unlocked",
            Self::CantUse => "cant_use",
            Self::NoMoneyUnlock => "no_money_unlock",
            Self::ItemsAdded => "items_added",
            Self::ItemsRefilled => "items_refilled",
            Self::ItemsRemoved => "items_removed",
            Self::ItemsReplaced => "items_replaced",
            Self::CantSell => "cant_sell",
            Self::ItemLimit => "item_limit",
            Self::ItemConflict => "item_conflict",
            Self::NoMoneyBuy => "no_money_buy",
            Self::CantDo => "cant_do",
            Self::MorePlayers => "more_players",
            Self::StartDelay => "start_delay",
            Self::RespawnDelay => "respawn_delay",
            Self::RoundDelay => "round_delay",
            Self::Countdown => "countdown",
            Self::NoWaiting => "no_waiting",
            Self::Killed => "killed",
            Self::ShotDown => "shot_down",
            Self::Suicide => "suicide",
            Self::BonusCollected => "bonus_collected",
            Self::GameEnds => "game_ends",
            Self::TeamWin => "team_win",
            Self::PlayerWin => "player_win",
            Self::Win => "win",
            Self::Lose => "lose",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed argument substituted into a localized message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NoticeArg {
    /// Rendered by the host as the player's (colored) name.
    Player(PlayerId),
    Count(i64),
    /// Seconds, already converted from ticks.
    Seconds(f64),
    Text(String),
}

/// A message key plus its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub key: MessageKey,
    #[serde(default)]
    pub args: Vec<NoticeArg>,
}

impl Notice {
    /// A notice without arguments.
    pub fn new(key: MessageKey) -> Self {
        Self {
            key,
            args: Vec::new(),
        }
    }

    /// Appends an argument (builder style).
    pub fn arg(mut self, arg: NoticeArg) -> Self {
        self.args.push(arg);
        self
    }
}

impl From<MessageKey> for Notice {
    fn from(key: MessageKey) -> Self {
        Self::new(key)
    }
}
