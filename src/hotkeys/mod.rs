//! Hotkey system
//!
//! Centralized hotkey management for the timeline.
//!
//! # Architecture
//!
//! - **HotkeyAction**: Enum of all possible actions that can be triggered by hotkeys
//! - **HotkeyContext**: Determines which hotkeys are active based on editor state
//! - **handle_hotkey()**: Main dispatch function that maps key events to actions
//! - **HotkeyAction::to_commands()**: Turns an action into editor commands
//!
//! # Adding New Hotkeys
//!
//! 1. Add a variant to `HotkeyAction`
//! 2. Add the key binding in `handle_hotkey()`
//! 3. Map it to commands in `HotkeyAction::to_commands()`

use uuid::Uuid;

use crate::commands::EditCommand;

/// A key as reported by the host toolkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A printable character, as typed (so Shift+= arrives as "+")
    Character(String),
    Delete,
    Backspace,
    Escape,
    Enter,
}

impl Key {
    pub fn char(c: &str) -> Self {
        Key::Character(c.to_string())
    }
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS
    fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// All possible actions that can be triggered by hotkeys.
///
/// Each variant represents a semantic action, not a key binding.
/// This decouples "what key was pressed" from "what should happen".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    // ═══════════════════════════════════════════════════════════════
    // Timeline Zoom
    // ═══════════════════════════════════════════════════════════════
    /// Zoom in on the timeline (increase pixels per second)
    TimelineZoomIn,
    /// Zoom out on the timeline (decrease pixels per second)
    TimelineZoomOut,
    /// Back to the default zoom
    TimelineZoomReset,

    // ═══════════════════════════════════════════════════════════════
    // History
    // ═══════════════════════════════════════════════════════════════
    Undo,
    Redo,

    // ═══════════════════════════════════════════════════════════════
    // Selection
    // ═══════════════════════════════════════════════════════════════
    /// Split the selected clip at the playhead
    SplitAtPlayhead,
    DeleteSelection,
    GroupSelection,
    UngroupSelection,
}

impl HotkeyAction {
    /// Whether the action needs selected clips to do anything
    pub fn needs_selection(self) -> bool {
        matches!(
            self,
            HotkeyAction::SplitAtPlayhead
                | HotkeyAction::DeleteSelection
                | HotkeyAction::GroupSelection
                | HotkeyAction::UngroupSelection
        )
    }

    /// Commands that carry out this action for the given selection and
    /// ruler position. Ungrouping yields one command per selected clip.
    pub fn to_commands(self, selection: &[Uuid], ruler_px: f64) -> Vec<EditCommand> {
        match self {
            HotkeyAction::TimelineZoomIn => vec![EditCommand::ZoomIn],
            HotkeyAction::TimelineZoomOut => vec![EditCommand::ZoomOut],
            HotkeyAction::TimelineZoomReset => vec![EditCommand::ZoomReset],
            HotkeyAction::Undo => vec![EditCommand::Undo],
            HotkeyAction::Redo => vec![EditCommand::Redo],
            HotkeyAction::SplitAtPlayhead => vec![EditCommand::Split {
                selection: selection.to_vec(),
                ruler_px,
            }],
            HotkeyAction::DeleteSelection if selection.is_empty() => Vec::new(),
            HotkeyAction::DeleteSelection => vec![EditCommand::DeleteClips {
                clip_ids: selection.to_vec(),
            }],
            HotkeyAction::GroupSelection => vec![EditCommand::Group {
                clip_ids: selection.to_vec(),
            }],
            HotkeyAction::UngroupSelection => selection
                .iter()
                .map(|&clip_id| EditCommand::Ungroup { clip_id })
                .collect(),
        }
    }
}

/// Context information that affects which hotkeys are active.
///
/// Some hotkeys only make sense in certain contexts:
/// - Delete, split and group require a selection
/// - Nothing fires while an input field has focus
#[derive(Debug, Clone, Default)]
pub struct HotkeyContext {
    /// Whether any clips are selected
    pub has_selection: bool,
    /// Whether an input field has focus (should suppress most hotkeys)
    pub input_focused: bool,
}

/// Result of processing a key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyResult {
    /// A hotkey action was matched and should be executed
    Action(HotkeyAction),
    /// No matching hotkey for this key/context combination
    NoMatch,
    /// Hotkey would match but is suppressed (e.g., input field focused)
    Suppressed,
}

/// Maps a key event to an action, considering the current context.
///
/// # Returns
/// * `HotkeyResult::Action(action)` if a hotkey matched
/// * `HotkeyResult::NoMatch` if no binding exists
/// * `HotkeyResult::Suppressed` if input is focused, or the action needs a
///   selection and there is none
pub fn handle_hotkey(key: &Key, modifiers: Modifiers, context: &HotkeyContext) -> HotkeyResult {
    // Suppress hotkeys when typing in an input field
    if context.input_focused {
        return HotkeyResult::Suppressed;
    }

    let action = match key {
        Key::Character(c) if modifiers.command() => match c.to_lowercase().as_str() {
            "z" if modifiers.shift => HotkeyAction::Redo,
            "z" => HotkeyAction::Undo,
            "y" => HotkeyAction::Redo,
            "g" if modifiers.shift => HotkeyAction::UngroupSelection,
            "g" => HotkeyAction::GroupSelection,
            _ => return HotkeyResult::NoMatch,
        },
        // Numpad +/- produce "+" and "-"; "=" is the unshifted plus key
        Key::Character(c) if c == "+" || c == "=" => HotkeyAction::TimelineZoomIn,
        Key::Character(c) if c == "-" => HotkeyAction::TimelineZoomOut,
        Key::Character(c) if c == "0" => HotkeyAction::TimelineZoomReset,
        Key::Character(c) if c.eq_ignore_ascii_case("s") && !modifiers.alt => {
            HotkeyAction::SplitAtPlayhead
        }
        Key::Delete | Key::Backspace => HotkeyAction::DeleteSelection,
        _ => return HotkeyResult::NoMatch,
    };

    if action.needs_selection() && !context.has_selection {
        return HotkeyResult::Suppressed;
    }
    HotkeyResult::Action(action)
}
