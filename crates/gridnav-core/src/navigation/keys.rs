//! Keyboard events and the key sets navigation reacts to

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A keyboard event as delivered by the host
///
/// The engine reports back through `prevent_default` / `stop_propagation`
/// flags which the host applies to the native event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    /// Auto-repeat from a held-down key
    #[serde(default)]
    pub repeat: bool,
    #[serde(skip)]
    default_prevented: bool,
    #[serde(skip)]
    propagation_stopped: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            shift: false,
            ctrl: false,
            alt: false,
            repeat: false,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Lower-cased key name used for every lookup
    pub fn normalized(&self) -> String {
        self.key.to_lowercase()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Error returned when a key chord cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError(pub String);

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid key chord '{}'", self.0)
    }
}

impl std::error::Error for ParseKeyError {}

impl FromStr for KeyEvent {
    type Err = ParseKeyError;

    /// Parse chords such as `ctrl+shift+l`, `alt++`, `space` or `down*`
    /// (a trailing `*` marks an auto-repeat event).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (chord, repeat) = match trimmed.strip_suffix('*') {
            Some(rest) if !rest.is_empty() && !rest.ends_with('+') => (rest, true),
            _ => (trimmed, false),
        };
        if chord.is_empty() {
            return Err(ParseKeyError(s.to_string()));
        }

        // A trailing "++" is a modifier followed by the plus key itself
        let (modifiers, key) = if chord == "+" {
            ("", "+")
        } else if let Some(rest) = chord.strip_suffix("++") {
            (rest, "+")
        } else {
            match chord.rsplit_once('+') {
                Some((mods, key)) => (mods, key),
                None => ("", chord),
            }
        };
        if key.is_empty() {
            return Err(ParseKeyError(s.to_string()));
        }

        let mut event = KeyEvent::new(match key.to_lowercase().as_str() {
            "space" => " ".to_string(),
            _ => key.to_string(),
        });
        event.repeat = repeat;
        for modifier in modifiers.split('+').filter(|m| !m.is_empty()) {
            match modifier.to_lowercase().as_str() {
                "ctrl" | "control" | "cmd" => event.ctrl = true,
                "shift" => event.shift = true,
                "alt" | "option" => event.alt = true,
                _ => return Err(ParseKeyError(s.to_string())),
            }
        }
        Ok(event)
    }
}

/// Keys that move the cursor in the body
pub fn is_navigation_key(key: &str) -> bool {
    matches!(
        key,
        "down" | "up" | "left" | "right" | "arrowdown" | "arrowup" | "arrowleft" | "arrowright"
            | "home" | "end" | "space" | "spacebar" | " "
    )
}

pub fn is_row_expand_key(key: &str) -> bool {
    matches!(key, "right" | "down" | "arrowright" | "arrowdown")
}

pub fn is_row_collapse_key(key: &str) -> bool {
    matches!(key, "left" | "up" | "arrowleft" | "arrowup")
}

pub fn is_toggle_key(key: &str) -> bool {
    is_row_expand_key(key) || is_row_collapse_key(key)
}

/// Row-add keys, including what Alt+"+" produces on some layouts
pub fn is_row_add_key(key: &str) -> bool {
    matches!(key, "+" | "add" | "≠" | "±" | "=")
}

/// Every key the body dispatcher handles
pub fn is_supported_key(key: &str) -> bool {
    is_navigation_key(key)
        || is_row_add_key(key)
        || matches!(key, "enter" | "f2" | "escape" | "esc" | "pagedown" | "pageup")
}

/// Keys handled on the header row; `¬` is Alt+L on macOS
pub fn is_header_key(key: &str) -> bool {
    is_navigation_key(key) || matches!(key, "escape" | "esc" | "l" | "¬")
}

/// Keys that move along a header or summary row
pub fn is_horizontal_nav_key(key: &str) -> bool {
    matches!(key, "arrowleft" | "left" | "arrowright" | "right" | "home" | "end")
}

pub fn is_space_key(key: &str) -> bool {
    matches!(key, " " | "space" | "spacebar")
}

/// Whether a key moves vertically
pub fn is_vertical_key(key: &str) -> bool {
    key.contains("up") || key.contains("down")
}
