//! Per-player unlock state and the button purchase algorithm.
//!
//! Buttons are shared configuration; which of them a player has unlocked
//! lives here, owned by the session. Cost and loadout mutation happen
//! together or not at all.

use std::collections::{BTreeSet, HashMap};

use skirmish_combat::Wallet;
use skirmish_loadout::{AddResult, Button, Intent, Loadout};
use skirmish_types::{ButtonId, MessageKey, PlayerId};

/// What one button application did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Purchase {
    /// `true` if money was spent (or refunded) and the loadout changed.
    pub applied: bool,
    pub message: MessageKey,
}

impl Purchase {
    fn applied(message: MessageKey) -> Self {
        Self {
            applied: true,
            message,
        }
    }

    fn rejected(message: MessageKey) -> Self {
        Self {
            applied: false,
            message,
        }
    }

    /// Rejections the player is told about even when the click was silent.
    pub fn always_notified(&self) -> bool {
        self.message == MessageKey::NoPermission
    }
}

#[derive(Debug, Default)]
pub struct PurchaseLedger {
    unlocked: HashMap<PlayerId, BTreeSet<ButtonId>>,
}

impl PurchaseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, player: PlayerId, button: &ButtonId) -> bool {
        self.unlocked
            .get(&player)
            .is_some_and(|set| set.contains(button))
    }

    /// Buttons `player` has unlocked, in name order.
    pub fn unlocked(&self, player: PlayerId) -> Vec<ButtonId> {
        self.unlocked
            .get(&player)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drops every unlock of a player who left.
    pub fn forget(&mut self, player: PlayerId) {
        self.unlocked.remove(&player);
    }

    pub fn clear(&mut self) {
        self.unlocked.clear();
    }

    /// Applies `button` for `player`.
    ///
    /// A locked button is unlocked (its unlock set goes to the stored
    /// buffer). An unlocked button applies its buy or sell set to the
    /// current buffer. Money moves only when the loadout changed.
    pub fn apply(
        &mut self,
        player: PlayerId,
        loadout: &mut Loadout,
        wallet: &mut Wallet,
        button: &Button,
        intent: Intent,
        has_permission: impl Fn(&str) -> bool,
    ) -> Purchase {
        if !button.permissions().iter().all(|p| has_permission(p)) {
            return Purchase::rejected(MessageKey::NoPermission);
        }

        if button.is_free() || self.is_unlocked(player, button.id()) {
            return buy_or_sell(loadout, wallet, button, intent);
        }

        let requirements_met = button
            .requirements()
            .iter()
            .all(|required| self.is_unlocked(player, required));
        if !requirements_met {
            return Purchase::rejected(MessageKey::UnlockOther);
        }

        let cost = i64::try_from(button.unlock_cost()).unwrap_or(i64::MAX);
        if !wallet.can_afford(cost) {
            return Purchase::rejected(MessageKey::NoMoneyUnlock);
        }
        if let Some(set) = button.on_unlock() {
            if !loadout.apply_stored(set).is_applied() {
                return Purchase::rejected(MessageKey::CantUse);
            }
        }
        wallet.charge(cost);
        self.unlocked
            .entry(player)
            .or_default()
            .insert(button.id().clone());
        tracing::debug!(%player, button = %button.id(), cost, "button unlocked");
        Purchase::applied(MessageKey::Unlocked)
    }
}

fn buy_or_sell(
    loadout: &mut Loadout,
    wallet: &mut Wallet,
    button: &Button,
    intent: Intent,
) -> Purchase {
    let (cost, set) = button.action(intent);
    let Some(set) = set else {
        return Purchase::rejected(MessageKey::CantDo);
    };
    if !wallet.can_afford(cost) {
        return Purchase::rejected(MessageKey::NoMoneyBuy);
    }

    let result = loadout.apply_current(set);
    let message = match result {
        AddResult::Added => MessageKey::ItemsAdded,
        AddResult::Filled => MessageKey::ItemsRefilled,
        AddResult::Removed => MessageKey::ItemsRemoved,
        AddResult::Replaced => MessageKey::ItemsReplaced,
        AddResult::AlreadyEmptied => return Purchase::rejected(MessageKey::CantSell),
        AddResult::AlreadyMaxed => return Purchase::rejected(MessageKey::ItemLimit),
        AddResult::Skipped => return Purchase::rejected(MessageKey::ItemConflict),
    };
    wallet.charge(cost);
    Purchase::applied(message)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use skirmish_loadout::{ItemSet, ItemSpec, LoadoutBuffer, RespawnAction, SetMode};
    use skirmish_types::Location;

    use super::*;

    const P: PlayerId = PlayerId(1);

    fn rockets() -> ItemSpec {
        ItemSpec {
            id: "rockets".into(),
            max_amount: 4,
            slot: Some(1),
        }
    }

    fn rockets_set(mode: SetMode, amount: u32) -> Arc<ItemSet> {
        Arc::new(ItemSet::new("rockets", mode).with_item(rockets(), amount))
    }

    fn loadout() -> Loadout {
        Loadout::from_buffer(LoadoutBuffer::new(), RespawnAction::Load)
    }

    fn shop() -> Button {
        Button::new("shop", Location::default())
            .with_buy(10, rockets_set(SetMode::Add, 2))
            .with_sell(-5, rockets_set(SetMode::Take, 2))
    }

    fn apply(
        ledger: &mut PurchaseLedger,
        loadout: &mut Loadout,
        wallet: &mut Wallet,
        button: &Button,
        intent: Intent,
    ) -> Purchase {
        ledger.apply(P, loadout, wallet, button, intent, |_| true)
    }

    #[test]
    fn test_buy_charges_only_when_applied() {
        let (mut ledger, mut loadout, mut wallet) = (PurchaseLedger::new(), loadout(), Wallet::new(25));
        let button = shop();

        let first = apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Buy);
        assert_eq!(first, Purchase::applied(MessageKey::ItemsAdded));
        assert_eq!(wallet.balance(), 15);

        apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Buy);
        assert_eq!(loadout.current().amount_of("rockets"), 4);
        assert_eq!(wallet.balance(), 5);

        // Full: nothing changes, nothing is charged.
        let mut wallet = Wallet::new(100);
        let maxed = apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Buy);
        assert_eq!(maxed, Purchase::rejected(MessageKey::ItemLimit));
        assert_eq!(wallet.balance(), 100);
    }

    #[test]
    fn test_not_enough_money_is_atomic() {
        let (mut ledger, mut loadout, mut wallet) = (PurchaseLedger::new(), loadout(), Wallet::new(9));
        let purchase = apply(&mut ledger, &mut loadout, &mut wallet, &shop(), Intent::Buy);
        assert_eq!(purchase, Purchase::rejected(MessageKey::NoMoneyBuy));
        assert_eq!(wallet.balance(), 9);
        assert_eq!(loadout.current().amount_of("rockets"), 0);
    }

    #[test]
    fn test_sell_refunds() {
        let (mut ledger, mut loadout, mut wallet) = (PurchaseLedger::new(), loadout(), Wallet::new(10));
        let button = shop();
        apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Buy);
        assert_eq!(wallet.balance(), 0);

        let sold = apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Sell);
        assert_eq!(sold, Purchase::applied(MessageKey::ItemsRemoved));
        assert_eq!(wallet.balance(), 5);

        let empty = apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Sell);
        assert_eq!(empty, Purchase::rejected(MessageKey::CantSell));
        assert_eq!(wallet.balance(), 5);
    }

    #[test]
    fn test_missing_action_is_cant_do() {
        let (mut ledger, mut loadout, mut wallet) = (PurchaseLedger::new(), loadout(), Wallet::new(10));
        let button = Button::new("sign", Location::default());
        let purchase = apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Sell);
        assert_eq!(purchase, Purchase::rejected(MessageKey::CantDo));
    }

    #[test]
    fn test_permission_checked_first() {
        let (mut ledger, mut loadout, mut wallet) = (PurchaseLedger::new(), loadout(), Wallet::new(10));
        let button = shop().with_permission("skirmish.vip");
        let purchase = ledger.apply(P, &mut loadout, &mut wallet, &button, Intent::Buy, |p| {
            p != "skirmish.vip"
        });
        assert_eq!(purchase, Purchase::rejected(MessageKey::NoPermission));
        assert!(purchase.always_notified());
    }

    #[test]
    fn test_unlock_requires_other_buttons_then_money() {
        let (mut ledger, mut loadout, mut wallet) = (PurchaseLedger::new(), loadout(), Wallet::new(30));
        let basic = Button::new("basic", Location::default()).with_unlock(10, None);
        let advanced = shop()
            .with_unlock(15, Some(rockets_set(SetMode::Add, 1)))
            .with_requirement("basic");

        let blocked = apply(&mut ledger, &mut loadout, &mut wallet, &advanced, Intent::Buy);
        assert_eq!(blocked, Purchase::rejected(MessageKey::UnlockOther));

        let unlocked = apply(&mut ledger, &mut loadout, &mut wallet, &basic, Intent::Buy);
        assert_eq!(unlocked, Purchase::applied(MessageKey::Unlocked));
        assert_eq!(wallet.balance(), 20);

        let unlocked = apply(&mut ledger, &mut loadout, &mut wallet, &advanced, Intent::Buy);
        assert_eq!(unlocked, Purchase::applied(MessageKey::Unlocked));
        assert_eq!(wallet.balance(), 5);
        // The unlock set went to the stored buffer, not the current one.
        assert_eq!(loadout.stored().amount_of("rockets"), 1);
        assert_eq!(loadout.current().amount_of("rockets"), 0);

        // Once unlocked, the button sells.
        let buy = apply(&mut ledger, &mut loadout, &mut wallet, &advanced, Intent::Buy);
        assert_eq!(buy, Purchase::rejected(MessageKey::NoMoneyBuy));
        assert_eq!(
            ledger.unlocked(P),
            vec![ButtonId::new("basic"), ButtonId::new("shop")]
        );
    }

    #[test]
    fn test_unlock_without_money() {
        let (mut ledger, mut loadout, mut wallet) = (PurchaseLedger::new(), loadout(), Wallet::new(3));
        let button = shop().with_unlock(10, None);
        let purchase = apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Buy);
        assert_eq!(purchase, Purchase::rejected(MessageKey::NoMoneyUnlock));
        assert!(!ledger.is_unlocked(P, button.id()));
    }

    #[test]
    fn test_unusable_unlock_charges_nothing() {
        let (mut ledger, mut loadout, mut wallet) = (PurchaseLedger::new(), loadout(), Wallet::new(30));
        let button = shop().with_unlock(10, Some(rockets_set(SetMode::Take, 1)));
        let purchase = apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Buy);
        assert_eq!(purchase, Purchase::rejected(MessageKey::CantUse));
        assert_eq!(wallet.balance(), 30);
        assert!(!ledger.is_unlocked(P, button.id()));
    }

    #[test]
    fn test_free_button_ignores_requirements() {
        let (mut ledger, mut loadout, mut wallet) = (PurchaseLedger::new(), loadout(), Wallet::new(10));
        let button = shop().with_requirement("never_unlocked");
        let purchase = apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Buy);
        assert!(purchase.applied);
        assert!(ledger.unlocked(P).is_empty());
    }

    #[test]
    fn test_forget_drops_unlocks() {
        let (mut ledger, mut loadout, mut wallet) = (PurchaseLedger::new(), loadout(), Wallet::new(10));
        let button = Button::new("basic", Location::default()).with_unlock(1, None);
        apply(&mut ledger, &mut loadout, &mut wallet, &button, Intent::Buy);
        assert!(ledger.is_unlocked(P, button.id()));
        ledger.forget(P);
        assert!(!ledger.is_unlocked(P, button.id()));
    }
}
