//! Game simulation modules

pub mod combat;
pub mod economy;
pub mod host;
pub mod physics;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod super_charge;
pub mod turret;
pub mod wave;

pub use host::{SessionHost, SessionRegistry};
pub use session::{SessionPhase, SessionState};

use serde::{Deserialize, Serialize};

use self::economy::ShopItem;

/// Semantic keys the client forwards (the client owns the physical mapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKey {
    RotateLeft,
    RotateRight,
    Fire,
    SuperCharge,
    ItemAbsoluteZero,
    ItemTimeWarp,
    ItemShield,
    ItemEmpBlast,
}

impl InputKey {
    /// Shop item bound to this hotkey, if any
    pub fn item(&self) -> Option<ShopItem> {
        match self {
            InputKey::ItemAbsoluteZero => Some(ShopItem::AbsoluteZero),
            InputKey::ItemTimeWarp => Some(ShopItem::TimeWarp),
            InputKey::ItemShield => Some(ShopItem::Shield),
            InputKey::ItemEmpBlast => Some(ShopItem::EmpBlast),
            _ => None,
        }
    }
}

/// Keyboard state read at the start of each tick. Level state for held
/// keys plus latched edges for one-shot actions.
#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub fire_held: bool,
    /// Press edge; cleared when a shot consumes it
    pub fire_pressed: bool,
    /// Release edge; cleared when the sniper consumes it
    pub fire_released: bool,
    /// False between a press and its release
    fire_armed: bool,
    /// Super-charge press edge; cleared by the tick that reads it
    pub super_requested: bool,
    /// Item hotkeys pressed since the last tick
    pub item_requests: Vec<ShopItem>,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            rotate_left: false,
            rotate_right: false,
            fire_held: false,
            fire_pressed: false,
            fire_released: false,
            fire_armed: true,
            super_requested: false,
            item_requests: Vec::new(),
        }
    }
}

impl InputState {
    pub fn key_down(&mut self, key: InputKey) {
        match key {
            InputKey::RotateLeft => self.rotate_left = true,
            InputKey::RotateRight => self.rotate_right = true,
            InputKey::Fire => {
                // Auto-repeat key-downs are ignored
                if !self.fire_held {
                    self.fire_held = true;
                    if self.fire_armed {
                        self.fire_pressed = true;
                        self.fire_armed = false;
                    }
                }
            }
            InputKey::SuperCharge => self.super_requested = true,
            _ => {
                if let Some(item) = key.item() {
                    if !self.item_requests.contains(&item) {
                        self.item_requests.push(item);
                    }
                }
            }
        }
    }

    pub fn key_up(&mut self, key: InputKey) {
        match key {
            InputKey::RotateLeft => self.rotate_left = false,
            InputKey::RotateRight => self.rotate_right = false,
            InputKey::Fire => {
                self.fire_held = false;
                self.fire_released = true;
                self.fire_armed = true;
            }
            _ => {}
        }
    }

    pub fn take_fire_release(&mut self) -> bool {
        std::mem::take(&mut self.fire_released)
    }

    pub fn take_super_request(&mut self) -> bool {
        std::mem::take(&mut self.super_requested)
    }

    pub fn take_item_requests(&mut self) -> Vec<ShopItem> {
        std::mem::take(&mut self.item_requests)
    }

    /// Drop every held key and pending edge
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_press_latches_once_per_cycle() {
        let mut input = InputState::default();
        input.key_down(InputKey::Fire);
        assert!(input.fire_pressed);
        input.fire_pressed = false;

        input.key_down(InputKey::Fire);
        assert!(!input.fire_pressed);

        input.key_up(InputKey::Fire);
        assert!(input.take_fire_release());
        assert!(!input.take_fire_release());

        input.key_down(InputKey::Fire);
        assert!(input.fire_pressed);
    }

    #[test]
    fn item_hotkeys_queue_without_duplicates() {
        let mut input = InputState::default();
        input.key_down(InputKey::ItemShield);
        input.key_down(InputKey::ItemShield);
        input.key_down(InputKey::ItemEmpBlast);
        assert_eq!(
            input.take_item_requests(),
            vec![ShopItem::Shield, ShopItem::EmpBlast]
        );
        assert!(input.take_item_requests().is_empty());
    }

    #[test]
    fn key_names_are_snake_case() {
        let key: InputKey = serde_json::from_str("\"item_time_warp\"").unwrap();
        assert_eq!(key.item(), Some(ShopItem::TimeWarp));
        assert_eq!(InputKey::RotateLeft.item(), None);
    }
}
