use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::{
    actions::{Action, ActionSender},
    app::layer_manager::EventHandlingStatus,
    libs::theme::{Palette, Theme},
    tui::Event,
    utils::help_msg::{HelpEntry, HelpMsg},
};

use super::{Component, InputMode};

/// Button that flips the app theme. Shows the icon of the theme it switches to.
#[derive(Clone, Debug)]
pub(crate) struct ThemeToggle {
    id: u64,
    theme: Theme,
    mode: InputMode,

    tx: ActionSender,
}

impl ThemeToggle {
    pub fn new(id: u64, tx: ActionSender, theme: Theme) -> Self {
        Self {
            id,
            theme,
            mode: InputMode::default(),
            tx,
        }
    }

    pub fn label(&self) -> String {
        format!(
            "{} {} mode",
            self.theme.toggle_icon(),
            match self.theme.toggled() {
                Theme::Light => "Light",
                Theme::Dark => "Dark",
            }
        )
    }
}

impl Component for ThemeToggle {
    fn get_id(&self) -> u64 {
        self.id
    }

    fn handle_events(&self, event: &Event) -> EventHandlingStatus {
        if self.mode == InputMode::Idle {
            return EventHandlingStatus::ShouldPropagate;
        }
        match event {
            Event::Key(key) if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) => {
                self.tx.send(Action::ToggleTheme);
                EventHandlingStatus::Consumed
            }
            _ => EventHandlingStatus::ShouldPropagate,
        }
    }

    fn update(&mut self, action: &Action) {
        if let Action::ThemeChanged(theme) = action {
            self.theme = *theme;
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let border_color = if self.mode == InputMode::Idle {
            palette.border
        } else {
            palette.accent
        };
        let button = Paragraph::new(self.label())
            .centered()
            .style(Style::default().fg(palette.fg))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(border_color)),
            );
        frame.render_widget(button, area);
    }

    fn mode(&self) -> InputMode {
        self.mode
    }

    fn set_focused(&mut self, focused: bool) {
        self.mode = if focused {
            InputMode::Focused
        } else {
            InputMode::Idle
        };
    }

    fn get_help_msg(&self) -> HelpMsg {
        if self.mode == InputMode::Idle {
            return HelpMsg::default();
        }
        vec![HelpEntry::new(KeyCode::Enter, "Switch theme")].into()
    }
}
