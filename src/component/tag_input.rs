use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph},
};
use tui_input::{Input, InputRequest, backend::crossterm::EventHandler};
use unicode_width::UnicodeWidthStr;

use crate::{
    actions::{Action, ActionSender, CompAction},
    app::layer_manager::EventHandlingStatus,
    libs::{tags::TagPicker, theme::Palette},
    tui::Event,
    utils::{
        help_msg::{HelpEntry, HelpMsg},
        key_events::KeyEvent,
    },
};

use super::{Component, InputMode};

const MAX_SUGGESTIONS: u16 = 5;

/// Multi-select tag field with autocomplete. The selected tags belong to the host.
#[derive(Clone, Debug)]
pub(crate) struct TagInput {
    id: u64,
    picker: TagPicker,
    selected: Vec<String>,
    input: Input,
    mode: InputMode,

    tx: ActionSender,
}

#[derive(Clone, Debug)]
pub(crate) enum TagInputAction {
    StartEditing,
    StopEditing,
    HandleKey(KeyEvent),
    HandlePaste(String),
    MoveUp,
    MoveDown,
    Submit,
    RemoveLast,

    /// New selection, for the host
    Changed(Vec<String>),
}

impl TagInput {
    pub fn new(id: u64, tx: ActionSender, picker: TagPicker, selected: Vec<String>) -> Self {
        Self {
            id,
            picker,
            selected,
            input: Input::default(),
            mode: InputMode::default(),
            tx,
        }
    }

    pub fn parse_change_action(&self, action: &Action) -> Option<Vec<String>> {
        match self.unwrap_action(action)? {
            TagInputAction::Changed(tags) => Some(tags.clone()),
            _ => None,
        }
    }

    pub fn sync(&mut self, selected: Vec<String>) {
        self.selected = selected;
    }

    /// Rows needed to draw the widget, borders included.
    pub fn height(&self) -> u16 {
        let suggestions = if self.mode == InputMode::Editing {
            (self.picker.filtered(&self.selected).len() as u16).min(MAX_SUGGESTIONS)
        } else {
            0
        };
        3 + suggestions
    }

    fn send(&self, action: TagInputAction) {
        self.tx
            .send(Action::Comp((CompAction::TagInput(action), self.id)));
    }

    fn unwrap_action<'a>(&self, action: &'a Action) -> Option<&'a TagInputAction> {
        match action {
            Action::Comp((CompAction::TagInput(action), id)) if *id == self.id => Some(action),
            _ => None,
        }
    }

    fn reset_input(&mut self) {
        self.input = Input::default();
        self.picker.set_input(String::new());
    }

    fn chips(&self, palette: &Palette) -> Vec<Span<'_>> {
        let chip = Style::default()
            .fg(palette.bg)
            .bg(palette.accent)
            .add_modifier(Modifier::BOLD);
        self.selected
            .iter()
            .flat_map(|tag| [Span::styled(format!(" {tag} "), chip), Span::raw(" ")])
            .collect()
    }
}

impl Component for TagInput {
    fn get_id(&self) -> u64 {
        self.id
    }

    fn handle_events(&self, event: &Event) -> EventHandlingStatus {
        match self.mode {
            InputMode::Idle => EventHandlingStatus::ShouldPropagate,
            InputMode::Focused => {
                let Event::Key(key) = event else {
                    return EventHandlingStatus::ShouldPropagate;
                };
                match key.code {
                    KeyCode::Enter => self.send(TagInputAction::StartEditing),
                    KeyCode::Backspace => self.send(TagInputAction::RemoveLast),
                    _ => return EventHandlingStatus::ShouldPropagate,
                }
                EventHandlingStatus::Consumed
            }
            InputMode::Editing => match event {
                Event::Key(key) => {
                    match key.code {
                        KeyCode::Esc => self.send(TagInputAction::StopEditing),
                        KeyCode::Enter => self.send(TagInputAction::Submit),
                        KeyCode::Up => self.send(TagInputAction::MoveUp),
                        KeyCode::Down => self.send(TagInputAction::MoveDown),
                        KeyCode::Backspace if self.input.value().is_empty() => {
                            self.send(TagInputAction::RemoveLast)
                        }
                        _ => self.send(TagInputAction::HandleKey((*key).into())),
                    }
                    EventHandlingStatus::Consumed
                }
                Event::Paste(text) => {
                    self.send(TagInputAction::HandlePaste(text.clone()));
                    EventHandlingStatus::Consumed
                }
                _ => EventHandlingStatus::ShouldPropagate,
            },
        }
    }

    fn update(&mut self, action: &Action) {
        let Some(action) = self.unwrap_action(action).cloned() else {
            return;
        };

        match action {
            TagInputAction::StartEditing => {
                self.mode = InputMode::Editing;
                self.tx.send(Action::SwitchInputMode(true));
            }
            TagInputAction::StopEditing => {
                self.picker.cancel_selection();
                self.mode = InputMode::Focused;
                self.tx.send(Action::SwitchInputMode(false));
            }
            TagInputAction::HandleKey(key) => {
                let before = self.input.value().to_string();
                self.input
                    .handle_event(&crossterm::event::Event::Key(key.into()));
                if self.input.value() != before {
                    self.picker.set_input(self.input.value());
                }
            }
            TagInputAction::HandlePaste(text) => {
                text.chars()
                    .filter(|c| !c.is_control())
                    .for_each(|c| {
                        self.input.handle(InputRequest::InsertChar(c));
                    });
                self.picker.set_input(self.input.value());
            }
            TagInputAction::MoveUp => self.picker.move_up(&self.selected),
            TagInputAction::MoveDown => self.picker.move_down(&self.selected),
            TagInputAction::Submit => {
                if let Some(next) = self.picker.submit(&self.selected) {
                    self.reset_input();
                    self.send(TagInputAction::Changed(next));
                }
            }
            TagInputAction::RemoveLast => {
                if let Some(next) = TagPicker::remove_last(&self.selected) {
                    self.send(TagInputAction::Changed(next));
                }
            }
            TagInputAction::Changed(_) => {}
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let border_color = match self.mode {
            InputMode::Idle => palette.border,
            InputMode::Focused => palette.accent,
            InputMode::Editing => palette.editing,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .title(Line::raw("Tags").style(Style::default().fg(palette.muted)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [line_area, list_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);

        let mut spans = self.chips(palette);
        let chips_width: usize = spans.iter().map(|s| s.content.width()).sum();
        if self.input.value().is_empty() && self.mode != InputMode::Editing {
            spans.push(Span::styled(
                "Add a tag...",
                Style::default().fg(palette.muted),
            ));
        } else {
            spans.push(Span::styled(
                self.input.value(),
                Style::default().fg(palette.fg),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), line_area);

        if self.mode != InputMode::Editing {
            return;
        }

        let cursor = chips_width + self.input.visual_cursor();
        let x = (cursor as u16).min(line_area.width.saturating_sub(1));
        frame.set_cursor_position((line_area.x + x, line_area.y));

        let items: Vec<ListItem> = self
            .picker
            .filtered(&self.selected)
            .into_iter()
            .map(|opt| ListItem::new(format!("  {opt}")))
            .collect();
        let list = List::new(items)
            .style(Style::default().fg(palette.fg))
            .highlight_style(
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::REVERSED),
            );
        let mut state = ListState::default().with_selected(
            self.picker
                .is_arrow_selecting()
                .then_some(self.picker.arrow_index()),
        );
        frame.render_stateful_widget(list, list_area, &mut state);
    }

    fn mode(&self) -> InputMode {
        self.mode
    }

    fn set_focused(&mut self, focused: bool) {
        if !focused && self.mode == InputMode::Editing {
            self.picker.cancel_selection();
            self.tx.send(Action::SwitchInputMode(false));
        }
        self.mode = if focused {
            InputMode::Focused
        } else {
            InputMode::Idle
        };
    }

    fn get_help_msg(&self) -> HelpMsg {
        match self.mode {
            InputMode::Idle => HelpMsg::default(),
            InputMode::Focused => vec![
                HelpEntry::new(KeyCode::Enter, "Add tags"),
                HelpEntry::new(KeyCode::Backspace, "Remove last tag"),
            ]
            .into(),
            InputMode::Editing => vec![
                HelpEntry::new(KeyCode::Enter, "Add tag"),
                HelpEntry::new_plain("up/down", "Pick suggestion"),
                HelpEntry::new(KeyCode::Esc, "Stop editing"),
            ]
            .into(),
        }
    }
}

#[cfg(test)]
impl TagInput {
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn picker(&self) -> &TagPicker {
        &self.picker
    }
}
