use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::{
    actions::{Action, ActionSender, CompAction},
    app::layer_manager::EventHandlingStatus,
    libs::{stars::StarRating, theme::Palette},
    tui::Event,
    utils::help_msg::{HelpEntry, HelpMsg},
};

use super::{Component, InputMode};

/// Ten-star rating slider. The value belongs to the host.
#[derive(Clone, Debug)]
pub(crate) struct StarSlider {
    id: u64,
    rating: StarRating,
    value: f64,
    mode: InputMode,

    tx: ActionSender,
}

#[derive(Clone, Debug)]
pub(crate) enum StarSliderAction {
    StepUp,
    StepDown,
    SetValue(f64),

    Changed(f64),
}

impl StarSlider {
    pub fn new(id: u64, tx: ActionSender, rating: StarRating, value: f64) -> Self {
        Self {
            id,
            value: rating.snap(value),
            rating,
            mode: InputMode::default(),
            tx,
        }
    }

    pub fn parse_change_action(&self, action: &Action) -> Option<f64> {
        match self.unwrap_action(action)? {
            StarSliderAction::Changed(value) => Some(*value),
            _ => None,
        }
    }

    pub fn sync(&mut self, value: f64) {
        self.value = self.rating.snap(value);
    }

    fn send(&self, action: StarSliderAction) {
        self.tx
            .send(Action::Comp((CompAction::StarSlider(action), self.id)));
    }

    fn unwrap_action<'a>(&self, action: &'a Action) -> Option<&'a StarSliderAction> {
        match action {
            Action::Comp((CompAction::StarSlider(action), id)) if *id == self.id => Some(action),
            _ => None,
        }
    }

    fn change_to(&self, next: f64) {
        if next != self.value {
            self.send(StarSliderAction::Changed(next));
        }
    }
}

impl Component for StarSlider {
    fn get_id(&self) -> u64 {
        self.id
    }

    fn handle_events(&self, event: &Event) -> EventHandlingStatus {
        if self.mode == InputMode::Idle {
            return EventHandlingStatus::ShouldPropagate;
        }
        let Event::Key(key) = event else {
            return EventHandlingStatus::ShouldPropagate;
        };
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.send(StarSliderAction::StepDown),
            KeyCode::Right | KeyCode::Char('l') => self.send(StarSliderAction::StepUp),
            KeyCode::Home => self.send(StarSliderAction::SetValue(self.rating.min())),
            KeyCode::End => self.send(StarSliderAction::SetValue(self.rating.max())),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let digit = c.to_digit(10).map(f64::from).unwrap_or_default();
                self.send(StarSliderAction::SetValue(digit))
            }
            _ => return EventHandlingStatus::ShouldPropagate,
        }
        EventHandlingStatus::Consumed
    }

    fn update(&mut self, action: &Action) {
        let Some(action) = self.unwrap_action(action) else {
            return;
        };
        match action {
            StarSliderAction::StepUp => self.change_to(self.rating.step_up(self.value)),
            StarSliderAction::StepDown => self.change_to(self.rating.step_down(self.value)),
            StarSliderAction::SetValue(value) => self.change_to(self.rating.snap(*value)),
            StarSliderAction::Changed(_) => {}
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let border_color = if self.mode == InputMode::Idle {
            palette.border
        } else {
            palette.accent
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .title(Line::raw("Rating").style(Style::default().fg(palette.muted)));

        let mut spans: Vec<Span> = StarRating::fills(self.value)
            .into_iter()
            .flat_map(|fill| {
                let star = match fill {
                    100 => Span::styled("★", Style::default().fg(palette.star_on)),
                    0 => Span::styled("☆", Style::default().fg(palette.star_off)),
                    _ => Span::styled(
                        "★",
                        Style::default()
                            .fg(palette.star_on)
                            .add_modifier(Modifier::DIM),
                    ),
                };
                [star, Span::raw(" ")]
            })
            .collect();
        spans.push(Span::styled(
            format!(" {} / {}", self.value, self.rating.max()),
            Style::default().fg(palette.fg),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
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
        vec![
            HelpEntry::new_plain("left/right", "Adjust rating"),
            HelpEntry::new_plain("home/end", "Min/max"),
            HelpEntry::new_plain("0-9", "Set rating"),
        ]
        .into()
    }
}

#[cfg(test)]
impl StarSlider {
    pub fn value(&self) -> f64 {
        self.value
    }
}
