use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ShortcutAction {
    FocusSearch,
    Reset,
}

/// A key press as reported by the browser.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChord {
    pub key: String,

    #[serde(default)]
    pub ctrl: bool,

    #[serde(default)]
    pub meta: bool,

    #[serde(default)]
    pub shift: bool,
}

/// Accelerator triggered with Ctrl (or Cmd) plus `key`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub key: &'static str,
    pub shift: bool,
    pub action: ShortcutAction,
}

pub const SHORTCUTS: [Shortcut; 2] = [
    Shortcut {
        key: "k",
        shift: false,
        action: ShortcutAction::FocusSearch,
    },
    Shortcut {
        key: "r",
        shift: true,
        action: ShortcutAction::Reset,
    },
];

pub fn resolve(chord: &KeyChord) -> Option<ShortcutAction> {
    if !(chord.ctrl || chord.meta) {
        return None;
    }
    SHORTCUTS
        .iter()
        .find(|shortcut| {
            chord.key.eq_ignore_ascii_case(shortcut.key) && chord.shift == shortcut.shift
        })
        .map(|shortcut| shortcut.action)
}
