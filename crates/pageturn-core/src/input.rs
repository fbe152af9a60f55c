// ── Controller input ──
//
// Raw key codes and the allow-list of controller buttons. `GamepadButton`
// is the only input type the dispatcher accepts, so a code outside the
// allow-list cannot reach it.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// A raw input-device key code (Android `KeyEvent` numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub i32);

impl KeyCode {
    pub const DPAD_UP: Self = Self(19);
    pub const DPAD_DOWN: Self = Self(20);
    pub const DPAD_LEFT: Self = Self(21);
    pub const DPAD_RIGHT: Self = Self(22);
    pub const BUTTON_A: Self = Self(96);
    pub const BUTTON_B: Self = Self(97);
    pub const BUTTON_X: Self = Self(99);
    pub const BUTTON_Y: Self = Self(100);
    pub const BUTTON_L1: Self = Self(102);
    pub const BUTTON_R1: Self = Self(103);
    pub const BUTTON_L2: Self = Self(104);
    pub const BUTTON_R2: Self = Self(105);
    pub const BUTTON_START: Self = Self(108);
    pub const BUTTON_SELECT: Self = Self(109);
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A controller button on the allow-list.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GamepadButton {
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    A,
    B,
    X,
    Y,
    L1,
    L2,
    R1,
    R2,
    Select,
    Start,
}

impl GamepadButton {
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Admit a raw code only if it belongs to a known controller button.
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        Self::all().find(|b| b.key_code() == code)
    }

    /// Config-file name (`dpad_left`, `r1`, ...).
    pub fn id(self) -> &'static str {
        self.into()
    }

    pub fn from_id(id: &str) -> Option<Self> {
        id.parse().ok()
    }

    pub fn key_code(self) -> KeyCode {
        match self {
            Self::DpadUp => KeyCode::DPAD_UP,
            Self::DpadDown => KeyCode::DPAD_DOWN,
            Self::DpadLeft => KeyCode::DPAD_LEFT,
            Self::DpadRight => KeyCode::DPAD_RIGHT,
            Self::A => KeyCode::BUTTON_A,
            Self::B => KeyCode::BUTTON_B,
            Self::X => KeyCode::BUTTON_X,
            Self::Y => KeyCode::BUTTON_Y,
            Self::L1 => KeyCode::BUTTON_L1,
            Self::L2 => KeyCode::BUTTON_L2,
            Self::R1 => KeyCode::BUTTON_R1,
            Self::R2 => KeyCode::BUTTON_R2,
            Self::Select => KeyCode::BUTTON_SELECT,
            Self::Start => KeyCode::BUTTON_START,
        }
    }

    /// Short label as printed on the pad.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::DpadUp => "D-Up",
            Self::DpadDown => "D-Down",
            Self::DpadLeft => "D-Left",
            Self::DpadRight => "D-Right",
            Self::A => "A",
            Self::B => "B",
            Self::X => "X",
            Self::Y => "Y",
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::Select => "-",
            Self::Start => "+",
        }
    }
}

impl fmt::Display for GamepadButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Whether a button went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Pressed,
    Released,
}

/// A filtered input event ready for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub button: GamepadButton,
    pub action: ButtonAction,
}

impl InputEvent {
    /// Build an event from a raw code, dropping codes outside the allow-list.
    pub fn from_raw(code: KeyCode, action: ButtonAction) -> Option<Self> {
        GamepadButton::from_key_code(code).map(|button| Self { button, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_covers_fourteen_buttons() {
        assert_eq!(GamepadButton::all().count(), 14);
        for button in GamepadButton::all() {
            assert_eq!(GamepadButton::from_key_code(button.key_code()), Some(button));
        }
    }

    #[test]
    fn non_gamepad_codes_are_dropped() {
        // KEYCODE_ENTER, KEYCODE_VOLUME_UP, KEYCODE_SPACE
        for raw in [66, 24, 62, -1, 0] {
            assert_eq!(InputEvent::from_raw(KeyCode(raw), ButtonAction::Pressed), None);
        }
    }

    #[test]
    fn raw_dpad_code_becomes_event() {
        let event = InputEvent::from_raw(KeyCode(22), ButtonAction::Released);
        assert_eq!(
            event,
            Some(InputEvent {
                button: GamepadButton::DpadRight,
                action: ButtonAction::Released,
            })
        );
    }

    #[test]
    fn button_ids_parse() {
        assert_eq!(GamepadButton::from_id("dpad_left"), Some(GamepadButton::DpadLeft));
        assert_eq!(GamepadButton::from_id("r2"), Some(GamepadButton::R2));
        assert_eq!(GamepadButton::R2.id(), "r2");
        assert_eq!(GamepadButton::from_id("turbo"), None);
    }
}
