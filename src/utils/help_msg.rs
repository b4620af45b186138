use std::ops::{Deref, DerefMut};

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
};

use super::key_events::KeyEvent;
use crate::libs::theme::Palette;

#[derive(Debug, Clone)]
enum HelpKeyEvent {
    Key(KeyEvent),
    Plain(String),
}

#[derive(Debug, Clone)]
pub(crate) struct HelpEntry {
    key: HelpKeyEvent,
    desc: String,
}

impl HelpEntry {
    pub(crate) fn new<T: Into<String>, K: Into<KeyEvent>>(event: K, desc: T) -> Self {
        Self {
            key: HelpKeyEvent::Key(event.into()),
            desc: desc.into(),
        }
    }
    /// An entry whose key is free text, e.g. `0-9` or `hjkl`.
    pub(crate) fn new_plain<T: Into<String>>(event: T, desc: T) -> Self {
        Self {
            key: HelpKeyEvent::Plain(event.into()),
            desc: desc.into(),
        }
    }

    pub(crate) fn key(&self) -> String {
        match &self.key {
            HelpKeyEvent::Key(key) => key.to_string(),
            HelpKeyEvent::Plain(key) => key.clone(),
        }
    }

    pub(crate) fn desc(&self) -> &str {
        &self.desc
    }
}

impl std::fmt::Display for HelpEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.desc(), self.key())
    }
}

impl From<HelpEntry> for String {
    fn from(val: HelpEntry) -> Self {
        val.to_string()
    }
}

#[derive(Default, Clone, Debug)]
pub(crate) struct HelpMsg {
    slices: Vec<HelpEntry>,
}

impl From<Vec<HelpEntry>> for HelpMsg {
    fn from(slices: Vec<HelpEntry>) -> Self {
        Self { slices }
    }
}

impl HelpMsg {
    pub(crate) fn extend(&mut self, other: &HelpMsg) {
        self.slices.extend(other.slices.iter().cloned());
    }

    pub(crate) fn extend_ret(mut self, other: &HelpMsg) -> Self {
        self.extend(other);
        self
    }

    /// One-line bar listing every entry.
    pub(crate) fn render(&self, frame: &mut ratatui::Frame, area: Rect, palette: &Palette) {
        let paragraph = Paragraph::new(self.to_string())
            .style(Style::default().fg(palette.muted))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(palette.border))
                    .padding(Padding::horizontal(1)),
            );
        frame.render_widget(paragraph, area);
    }
}

impl Deref for HelpMsg {
    type Target = Vec<HelpEntry>;

    fn deref(&self) -> &Self::Target {
        &self.slices
    }
}

impl DerefMut for HelpMsg {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.slices
    }
}

impl std::fmt::Display for HelpMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .slices
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<String>>()
            .join(" | ");
        write!(f, "{joined}")
    }
}
