use std::ops::Deref;

use crossterm::event::{KeyCode, KeyEvent as CrosstermKeyEvent, KeyModifiers};

/// Human readable key name, e.g. `ctrl-z`, `shift-backtab`, `enter`.
pub fn key_event_to_string(key_event: &CrosstermKeyEvent) -> String {
    let char;
    let key_code = match key_event.code {
        KeyCode::Backspace => "backspace",
        KeyCode::Enter => "enter",
        KeyCode::Left => "left",
        KeyCode::Right => "right",
        KeyCode::Up => "up",
        KeyCode::Down => "down",
        KeyCode::Home => "home",
        KeyCode::End => "end",
        KeyCode::PageUp => "pageup",
        KeyCode::PageDown => "pagedown",
        KeyCode::Tab => "tab",
        KeyCode::BackTab => "backtab",
        KeyCode::Delete => "delete",
        KeyCode::Insert => "insert",
        KeyCode::Esc => "esc",
        KeyCode::F(c) => {
            char = format!("f({c})");
            &char
        }
        KeyCode::Char(' ') => "space",
        KeyCode::Char(c) => {
            char = c.to_string();
            &char
        }
        _ => "",
    };

    let mut modifiers = Vec::with_capacity(3);
    if key_event.modifiers.intersects(KeyModifiers::CONTROL) {
        modifiers.push("ctrl");
    }
    if key_event.modifiers.intersects(KeyModifiers::SHIFT) {
        modifiers.push("shift");
    }
    if key_event.modifiers.intersects(KeyModifiers::ALT) {
        modifiers.push("alt");
    }

    let mut key = modifiers.join("-");
    if !key.is_empty() {
        key.push('-');
    }
    key.push_str(key_code);
    key
}

/// Owned, comparable key event that can travel inside an [`crate::actions::Action`].
#[derive(Clone, Debug, PartialEq)]
pub struct KeyEvent(pub CrosstermKeyEvent);

impl KeyEvent {
    pub fn with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self(CrosstermKeyEvent::new(code, modifiers))
    }

    /// Ctrl plus the given character.
    pub fn ctrl(c: char) -> Self {
        Self::with_modifiers(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

impl From<CrosstermKeyEvent> for KeyEvent {
    fn from(key_event: CrosstermKeyEvent) -> Self {
        Self(key_event)
    }
}
impl From<KeyCode> for KeyEvent {
    fn from(key_code: KeyCode) -> Self {
        Self(CrosstermKeyEvent::new(key_code, KeyModifiers::NONE))
    }
}
impl From<char> for KeyEvent {
    fn from(c: char) -> Self {
        Self(CrosstermKeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }
}
impl From<KeyEvent> for CrosstermKeyEvent {
    fn from(val: KeyEvent) -> Self {
        val.0
    }
}
impl Deref for KeyEvent {
    type Target = CrosstermKeyEvent;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl std::fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", key_event_to_string(self))
    }
}

#[cfg(test)]
pub mod test_utils {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::tui::Event;

    pub fn get_key_evt(key: KeyCode) -> Event {
        Event::Key(CrosstermKeyEvent::new(key, KeyModifiers::NONE))
    }
    pub fn get_char_evt(key: char) -> Event {
        Event::Key(CrosstermKeyEvent::new(
            KeyCode::Char(key),
            KeyModifiers::NONE,
        ))
    }
    /// One key event per character of `text`.
    pub fn get_typing_evts(text: &str) -> Vec<Event> {
        text.chars().map(get_char_evt).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_names() {
        assert_eq!(KeyEvent::from(KeyCode::Up).to_string(), "up");
        assert_eq!(KeyEvent::from(' ').to_string(), "space");
        assert_eq!(KeyEvent::ctrl('z').to_string(), "ctrl-z");
        assert_eq!(
            KeyEvent::with_modifiers(KeyCode::BackTab, KeyModifiers::SHIFT).to_string(),
            "shift-backtab"
        );
        assert_eq!(KeyEvent::from(KeyCode::F(5)).to_string(), "f(5)");
    }
}
