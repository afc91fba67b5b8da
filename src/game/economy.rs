//! Coins, upgrade tracks and the item shop

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Highest level any upgrade track can reach
pub const MAX_UPGRADE_LEVEL: u8 = 5;

/// Coin cost to go from level `i` to `i + 1`
pub const UPGRADE_COSTS: [u32; MAX_UPGRADE_LEVEL as usize] = [10, 20, 40, 80, 160];

/// Independently leveled upgrade tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeTrack {
    Damage,
    ReloadTime,
    BulletSpeed,
    SuperChargeDuration,
}

impl UpgradeTrack {
    /// Multiplier while super-charge is active. Replaces the leveled
    /// value outright rather than scaling it.
    pub fn super_multiplier(&self) -> f32 {
        match self {
            UpgradeTrack::Damage | UpgradeTrack::BulletSpeed => 2.2,
            UpgradeTrack::ReloadTime => 0.4,
            UpgradeTrack::SuperChargeDuration => 1.5,
        }
    }
}

/// Current level of every upgrade track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeLevels {
    pub damage: u8,
    pub reload_time: u8,
    pub bullet_speed: u8,
    pub super_charge_duration: u8,
}

impl UpgradeLevels {
    pub fn level(&self, track: UpgradeTrack) -> u8 {
        match track {
            UpgradeTrack::Damage => self.damage,
            UpgradeTrack::ReloadTime => self.reload_time,
            UpgradeTrack::BulletSpeed => self.bullet_speed,
            UpgradeTrack::SuperChargeDuration => self.super_charge_duration,
        }
    }

    fn level_mut(&mut self, track: UpgradeTrack) -> &mut u8 {
        match track {
            UpgradeTrack::Damage => &mut self.damage,
            UpgradeTrack::ReloadTime => &mut self.reload_time,
            UpgradeTrack::BulletSpeed => &mut self.bullet_speed,
            UpgradeTrack::SuperChargeDuration => &mut self.super_charge_duration,
        }
    }

    /// Multiplier derived from the track's level alone
    pub fn leveled_multiplier(&self, track: UpgradeTrack) -> f32 {
        let level = self.level(track) as f32;
        match track {
            UpgradeTrack::ReloadTime => 1.0 - level * 0.1,
            _ => 1.0 + level * 0.2,
        }
    }

    /// Cost of the next level, or None at max level
    pub fn next_cost(&self, track: UpgradeTrack) -> Option<u32> {
        UPGRADE_COSTS.get(self.level(track) as usize).copied()
    }
}

/// Consumable items sold in the between-wave shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopItem {
    /// Slows every non-boss enemy
    AbsoluteZero,
    /// Pushes every non-boss enemy back out to the spawn ring
    TimeWarp,
    /// Suppresses the loss condition while active
    Shield,
    /// Stops every non-boss enemy while active
    EmpBlast,
}

impl ShopItem {
    pub const ALL: [ShopItem; 4] = [
        ShopItem::AbsoluteZero,
        ShopItem::TimeWarp,
        ShopItem::Shield,
        ShopItem::EmpBlast,
    ];

    pub fn cost(&self) -> u32 {
        match self {
            ShopItem::AbsoluteZero => 30,
            ShopItem::TimeWarp => 50,
            ShopItem::Shield => 60,
            ShopItem::EmpBlast => 45,
        }
    }

    /// Seconds the item stays active (and blocks reactivation)
    pub fn cooldown_secs(&self) -> f32 {
        match self {
            ShopItem::AbsoluteZero => 15.0,
            ShopItem::TimeWarp => 5.0,
            ShopItem::Shield => 10.0,
            ShopItem::EmpBlast => 8.0,
        }
    }
}

/// One value per shop item
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerItem<T> {
    pub absolute_zero: T,
    pub time_warp: T,
    pub shield: T,
    pub emp_blast: T,
}

impl<T> PerItem<T> {
    pub fn get(&self, item: ShopItem) -> &T {
        match item {
            ShopItem::AbsoluteZero => &self.absolute_zero,
            ShopItem::TimeWarp => &self.time_warp,
            ShopItem::Shield => &self.shield,
            ShopItem::EmpBlast => &self.emp_blast,
        }
    }

    pub fn get_mut(&mut self, item: ShopItem) -> &mut T {
        match item {
            ShopItem::AbsoluteZero => &mut self.absolute_zero,
            ShopItem::TimeWarp => &mut self.time_warp,
            ShopItem::Shield => &mut self.shield,
            ShopItem::EmpBlast => &mut self.emp_blast,
        }
    }
}

/// Coin balance, upgrade levels and item state for one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Economy {
    pub coins: u32,
    pub upgrades: UpgradeLevels,
    /// Owned count per item
    pub inventory: PerItem<u32>,
    pub active: PerItem<bool>,
    /// Remaining cooldown per item (seconds)
    pub cooldowns: PerItem<f32>,
}

impl Economy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// Buy the next level of a track. All-or-nothing.
    pub fn purchase_upgrade(&mut self, track: UpgradeTrack) -> bool {
        let Some(cost) = self.upgrades.next_cost(track) else {
            return false;
        };
        if self.coins < cost {
            return false;
        }

        self.coins -= cost;
        *self.upgrades.level_mut(track) += 1;
        debug!(?track, level = self.upgrades.level(track), cost, "Upgrade purchased");
        true
    }

    /// Multiplier for a track, overridden outright while super-charge is active
    pub fn upgrade_multiplier(&self, track: UpgradeTrack, super_active: bool) -> f32 {
        if super_active {
            track.super_multiplier()
        } else {
            self.upgrades.leveled_multiplier(track)
        }
    }

    pub fn purchase_shop_item(&mut self, item: ShopItem) -> bool {
        let cost = item.cost();
        if self.coins < cost {
            return false;
        }

        self.coins -= cost;
        *self.inventory.get_mut(item) += 1;
        debug!(?item, owned = *self.inventory.get(item), cost, "Shop item purchased");
        true
    }

    /// Consume one owned item and start its effect window
    pub fn activate_item(&mut self, item: ShopItem) -> bool {
        if *self.inventory.get(item) == 0 || *self.cooldowns.get(item) > 0.0 {
            return false;
        }

        *self.inventory.get_mut(item) -= 1;
        *self.active.get_mut(item) = true;
        *self.cooldowns.get_mut(item) = item.cooldown_secs();
        true
    }

    /// Count every running cooldown down by `delta` seconds. A cooldown
    /// that lands on zero ends the item's effect.
    pub fn update_item_cooldowns(&mut self, delta: f32) {
        let delta = delta.max(0.0);
        for item in ShopItem::ALL {
            let cooldown = self.cooldowns.get_mut(item);
            if *cooldown > 0.0 {
                *cooldown = (*cooldown - delta).max(0.0);
                if *cooldown == 0.0 {
                    *self.active.get_mut(item) = false;
                }
            }
        }
    }

    pub fn is_active(&self, item: ShopItem) -> bool {
        *self.active.get(item)
    }
}
