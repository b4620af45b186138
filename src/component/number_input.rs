use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tracing::warn;
use tui_input::{Input, InputRequest, backend::crossterm::EventHandler};

use crate::{
    actions::{Action, ActionSender, CompAction},
    app::layer_manager::EventHandlingStatus,
    libs::{
        numeric::{FieldState, FormatMode, NumberConfig, NumberConfigError, NumberField, Variant},
        theme::Palette,
    },
    tui::Event,
    utils::{
        help_msg::{HelpEntry, HelpMsg},
        key_events::KeyEvent,
    },
};

use super::{Component, InputMode};

/// Numeric field with `-`/`+` controls, shown in a configurable base or in
/// scientific notation.
///
/// The value belongs to the host: read it with
/// [`NumberInput::parse_change_action`] and push it back with
/// [`NumberInput::sync`].
#[derive(Clone, Debug)]
pub(crate) struct NumberInput {
    id: u64,
    field: NumberField,
    input: Input,
    mode: InputMode,

    tx: ActionSender,
}

#[derive(Clone, Debug)]
pub(crate) enum NumberInputAction {
    Increment,
    Decrement,
    StartEditing,
    StopEditing,
    /// Switch between the configured base and scientific notation
    ToggleFormatMode,
    HandleKey(KeyEvent),
    /// Replaces the whole text of the field
    HandlePaste(String),

    /// New committed value, for the host
    Changed(f64),
}

impl NumberInput {
    pub fn new(
        id: u64,
        tx: ActionSender,
        config: NumberConfig,
        value: f64,
    ) -> Result<Self, NumberConfigError> {
        let field = NumberField::new(config, value)?;
        let input = Input::new(field.display_text().into_owned());
        Ok(Self {
            id,
            field,
            input,
            mode: InputMode::default(),
            tx,
        })
    }

    pub fn parse_change_action(&self, action: &Action) -> Option<f64> {
        match self.unwrap_action(action)? {
            NumberInputAction::Changed(value) => Some(*value),
            _ => None,
        }
    }

    /// Push the host's value. Discards any uncommitted text.
    pub fn sync(&mut self, value: f64) {
        self.field.sync(value);
        self.refresh_input();
    }

    fn send(&self, action: NumberInputAction) {
        self.tx
            .send(Action::Comp((CompAction::NumberInput(action), self.id)));
    }

    fn unwrap_action<'a>(&self, action: &'a Action) -> Option<&'a NumberInputAction> {
        match action {
            Action::Comp((CompAction::NumberInput(action), id)) if *id == self.id => Some(action),
            _ => None,
        }
    }

    /// Run the field's text through the validator and show the result.
    fn apply_text(&mut self) {
        let raw = self.input.value().to_string();
        if let Some(value) = self.field.input(&raw) {
            self.send(NumberInputAction::Changed(value));
        }
        self.refresh_input();
    }

    fn commit_step(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.refresh_input();
            self.send(NumberInputAction::Changed(value));
        }
    }

    /// Replace the input text with the field's display text, keeping the
    /// cursor at the same distance from the end.
    fn refresh_input(&mut self) {
        let text = self.field.display_text();
        if text == self.input.value() {
            return;
        }
        let from_end = self
            .input
            .value()
            .chars()
            .count()
            .saturating_sub(self.input.cursor());
        let from_end = from_end.min(text.chars().count());
        self.input = Input::new(text.into_owned());
        for _ in 0..from_end {
            self.input.handle(InputRequest::GoToPrevChar);
        }
    }

    fn title(&self) -> Option<String> {
        let config = self.field.config();
        (config.show_base && config.format_mode == FormatMode::Normal)
            .then(|| format!("base {}", config.base))
    }
}

impl Component for NumberInput {
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
                    KeyCode::Up | KeyCode::Char('+') => self.send(NumberInputAction::Increment),
                    KeyCode::Down | KeyCode::Char('-') => self.send(NumberInputAction::Decrement),
                    KeyCode::Enter => self.send(NumberInputAction::StartEditing),
                    KeyCode::Char('m') => self.send(NumberInputAction::ToggleFormatMode),
                    _ => return EventHandlingStatus::ShouldPropagate,
                }
                EventHandlingStatus::Consumed
            }
            InputMode::Editing => match event {
                Event::Key(key) => {
                    match key.code {
                        KeyCode::Up => self.send(NumberInputAction::Increment),
                        KeyCode::Down => self.send(NumberInputAction::Decrement),
                        KeyCode::Esc | KeyCode::Enter => {
                            self.send(NumberInputAction::StopEditing)
                        }
                        _ => self.send(NumberInputAction::HandleKey((*key).into())),
                    }
                    EventHandlingStatus::Consumed
                }
                Event::Paste(text) => {
                    self.send(NumberInputAction::HandlePaste(text.clone()));
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
            NumberInputAction::Increment => {
                let value = self.field.increment();
                self.commit_step(value);
            }
            NumberInputAction::Decrement => {
                let value = self.field.decrement();
                self.commit_step(value);
            }
            NumberInputAction::StartEditing => {
                self.mode = InputMode::Editing;
                self.tx.send(Action::SwitchInputMode(true));
            }
            NumberInputAction::StopEditing => {
                self.mode = InputMode::Focused;
                self.tx.send(Action::SwitchInputMode(false));
            }
            NumberInputAction::ToggleFormatMode => {
                let mut config = self.field.config().clone();
                config.format_mode = match config.format_mode {
                    FormatMode::Normal => FormatMode::Scientific,
                    FormatMode::Scientific => FormatMode::Normal,
                };
                match self.field.reconfigure(config) {
                    Ok(()) => self.refresh_input(),
                    Err(err) => warn!("Unable to switch notation: {}", err),
                }
            }
            NumberInputAction::HandleKey(key) => {
                let before = self.input.value().to_string();
                self.input
                    .handle_event(&crossterm::event::Event::Key(key.into()));
                if self.input.value() != before {
                    self.apply_text();
                }
            }
            NumberInputAction::HandlePaste(text) => {
                self.input = Input::new(text);
                self.apply_text();
            }
            NumberInputAction::Changed(_) => {}
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let [minus_area, field_area, plus_area] = Layout::horizontal([
            Constraint::Length(5),
            Constraint::Fill(1),
            Constraint::Length(5),
        ])
        .areas(area);

        let variant = self.field.config().variant;
        let button = |label: &'static str, enabled: bool| {
            let borders = if variant == Variant::Ghost {
                Borders::NONE
            } else {
                Borders::ALL
            };
            Paragraph::new(label)
                .centered()
                .style(button_style(variant, palette, enabled))
                .block(
                    Block::default()
                        .borders(borders)
                        .border_type(BorderType::Rounded),
                )
        };
        frame.render_widget(button("-", self.field.can_decrement()), minus_area);
        frame.render_widget(button("+", self.field.can_increment()), plus_area);

        let border_color = match self.mode {
            InputMode::Idle => palette.border,
            InputMode::Focused => palette.accent,
            InputMode::Editing => palette.editing,
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));
        if let Some(title) = self.title() {
            block = block.title(
                Line::raw(title)
                    .right_aligned()
                    .style(Style::default().fg(palette.muted)),
            );
        }

        let mut text_style = Style::default().fg(palette.fg);
        if self.field.state() == FieldState::Editing {
            text_style = text_style.add_modifier(Modifier::ITALIC);
        }
        let width = field_area.width.max(3) - 3;
        let scroll = self.input.visual_scroll(width as usize);
        let paragraph = Paragraph::new(self.input.value())
            .style(text_style)
            .scroll((0, scroll as u16))
            .block(block);
        frame.render_widget(paragraph, field_area);

        if self.mode == InputMode::Editing {
            let x = self.input.visual_cursor().max(scroll) - scroll + 1;
            frame.set_cursor_position((field_area.x + x as u16, field_area.y + 1));
        }
    }

    fn mode(&self) -> InputMode {
        self.mode
    }

    fn set_focused(&mut self, focused: bool) {
        if !focused && self.mode == InputMode::Editing {
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
                HelpEntry::new(KeyCode::Up, "Increment"),
                HelpEntry::new(KeyCode::Down, "Decrement"),
                HelpEntry::new(KeyCode::Enter, "Edit number"),
                HelpEntry::new('m', "Switch notation"),
            ]
            .into(),
            InputMode::Editing => vec![
                HelpEntry::new(KeyCode::Esc, "Stop editing"),
                HelpEntry::new_plain("up/down", "Step"),
            ]
            .into(),
        }
    }
}

#[cfg(test)]
impl NumberInput {
    pub fn field(&self) -> &NumberField {
        &self.field
    }

    /// Text currently in the field.
    pub fn text(&self) -> &str {
        self.input.value()
    }
}

fn button_style(variant: Variant, palette: &Palette, enabled: bool) -> Style {
    if !enabled {
        return Style::default().fg(palette.muted);
    }
    match variant {
        Variant::Primary => Style::default().fg(palette.bg).bg(palette.accent),
        Variant::Secondary => Style::default().fg(palette.fg).bg(palette.border),
        Variant::Outline => Style::default().fg(palette.accent),
        Variant::Ghost => Style::default().fg(palette.fg),
        Variant::Danger => Style::default().fg(palette.bg).bg(palette.danger),
    }
}

#[cfg(test)]
mod test {
    use ratatui::{Terminal, backend::TestBackend};
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::utils::key_events::test_utils::{get_char_evt, get_key_evt, get_typing_evts};

    /// Owns the value the way a page does and feeds changes back.
    struct Host {
        count: f64,
        changes: Vec<f64>,
        input_mode: bool,
        input: NumberInput,
        rx: UnboundedReceiver<Action>,
    }

    impl Host {
        fn new(config: NumberConfig, count: f64) -> Self {
            let (tx, rx) = ActionSender::test_pair();
            let mut input = NumberInput::new(1, tx, config, count).unwrap();
            input.set_focused(true);
            Self {
                count,
                changes: Vec::new(),
                input_mode: false,
                input,
                rx,
            }
        }

        fn event(&mut self, event: Event) {
            let _ = self.input.handle_events(&event);
            while let Ok(action) = self.rx.try_recv() {
                if let Action::SwitchInputMode(mode) = action {
                    self.input_mode = mode;
                }
                if let Some(value) = self.input.parse_change_action(&action) {
                    self.count = value;
                    self.changes.push(value);
                    self.input.sync(value);
                }
                self.input.update(&action);
            }
        }

        fn events(&mut self, events: Vec<Event>) {
            events.into_iter().for_each(|e| self.event(e));
        }
    }

    #[test]
    fn shows_value_in_base() {
        let host = Host::new(NumberConfig::default().with_base(16), 255.0);
        assert_eq!(host.input.text(), "FF");
        let host = Host::new(NumberConfig::default().with_base(2), 5.0);
        assert_eq!(host.input.text(), "101");
    }

    #[test]
    fn arrows_step_and_stop_at_max() {
        let config = NumberConfig::default().with_min(0.0).with_max(10.0);
        let mut host = Host::new(config, 9.0);

        host.event(get_key_evt(KeyCode::Up));
        assert_eq!(host.count, 10.0);
        assert!(!host.input.field().can_increment());

        host.event(get_key_evt(KeyCode::Up));
        host.event(get_char_evt('+'));
        assert_eq!(host.changes, vec![10.0]);

        host.event(get_char_evt('-'));
        assert_eq!(host.count, 9.0);
        assert_eq!(host.input.text(), "9");
    }

    #[test]
    fn clearing_commits_min() {
        let mut host = Host::new(NumberConfig::default().with_min(3.0), 5.0);
        host.event(get_key_evt(KeyCode::Enter));
        assert!(host.input_mode);

        host.event(get_key_evt(KeyCode::Backspace));
        assert_eq!(host.changes, vec![3.0]);
        assert_eq!(host.input.text(), "3");
    }

    #[test]
    fn scientific_paste_commits() {
        let config = NumberConfig::default().with_format_mode(FormatMode::Scientific);
        let mut host = Host::new(config, 1500.0);
        assert_eq!(host.input.text(), "1.5e+3");

        host.event(get_key_evt(KeyCode::Enter));
        host.event(Event::Paste("2E2".into()));
        assert_eq!(host.count, 200.0);
        assert_eq!(host.input.text(), "2e+2");

        // "2e+2E" does not parse and stays as typed
        host.event(get_char_evt('e'));
        assert_eq!(host.input.text(), "2E+2E");
        assert_eq!(host.input.field().state(), FieldState::Editing);
        assert_eq!(host.count, 200.0);

        host.event(get_char_evt('1'));
        assert_eq!(host.count, 200.0);
        assert_eq!(host.changes, vec![200.0]);
    }

    #[test]
    fn typing_is_sanitized() {
        let mut host = Host::new(NumberConfig::default().with_base(36), 0.0);
        host.event(get_key_evt(KeyCode::Enter));

        host.event(get_char_evt('g'));
        assert_eq!(host.input.text(), "G");
        assert_eq!(host.count, 16.0);

        host.event(get_char_evt('!'));
        assert_eq!(host.input.text(), "G");
        assert_eq!(host.count, 16.0);
    }

    #[test]
    fn typing_keeps_cursor_position() {
        let mut host = Host::new(NumberConfig::default(), 12.0);
        host.event(get_key_evt(KeyCode::Enter));
        host.event(get_key_evt(KeyCode::Left));
        host.events(get_typing_evts("34"));
        assert_eq!(host.input.text(), "1342");
        assert_eq!(host.count, 1342.0);
    }

    #[test]
    fn leaving_edit_mode_keeps_global_keys_free() {
        let mut host = Host::new(NumberConfig::default(), 1.0);
        assert!(matches!(
            host.input.handle_events(&get_char_evt('q')),
            EventHandlingStatus::ShouldPropagate
        ));

        host.event(get_key_evt(KeyCode::Enter));
        assert_eq!(host.input.mode(), InputMode::Editing);
        assert!(matches!(
            host.input.handle_events(&get_char_evt('q')),
            EventHandlingStatus::Consumed
        ));

        host.event(get_key_evt(KeyCode::Esc));
        assert_eq!(host.input.mode(), InputMode::Focused);
        assert!(!host.input_mode);
    }

    #[test]
    fn sync_discards_pending_text() {
        let config = NumberConfig::default().with_format_mode(FormatMode::Scientific);
        let mut host = Host::new(config, 1.0);
        host.event(get_key_evt(KeyCode::Enter));
        host.event(Event::Paste("1E".into()));
        assert_eq!(host.input.text(), "1E");

        host.input.sync(42.0);
        assert_eq!(host.input.text(), "4.2e+1");
        assert_eq!(host.input.field().state(), FieldState::Clean);
    }

    #[test]
    fn switching_notation_keeps_value() {
        let config = NumberConfig::default()
            .with_base(16)
            .with_format_mode(FormatMode::Scientific);
        let mut host = Host::new(config, 1500.0);
        assert_eq!(host.input.title(), None);

        // an unfinished edit is dropped by the switch
        host.event(get_key_evt(KeyCode::Enter));
        host.event(Event::Paste("1E".into()));
        host.event(get_key_evt(KeyCode::Esc));
        assert_eq!(host.input.text(), "1E");

        host.event(get_char_evt('m'));
        assert_eq!(host.input.text(), "5DC");
        assert_eq!(host.input.title().as_deref(), Some("base 16"));
        assert_eq!(host.input.field().state(), FieldState::Clean);
        assert!(host.changes.is_empty());

        host.event(get_char_evt('m'));
        assert_eq!(host.input.text(), "1.5e+3");
    }

    #[test]
    fn help_follows_mode() {
        let mut host = Host::new(NumberConfig::default(), 1.0);
        assert_eq!(
            host.input.get_help_msg().to_string(),
            "Increment: up | Decrement: down | Edit number: enter | Switch notation: m"
        );
        host.event(get_key_evt(KeyCode::Enter));
        assert_eq!(
            host.input.get_help_msg().to_string(),
            "Stop editing: esc | Step: up/down"
        );
        host.input.set_focused(false);
        assert!(host.input.get_help_msg().is_empty());
    }

    #[test]
    fn render_shows_base_and_disabled_buttons() {
        let config = NumberConfig::default().with_base(16).with_max(255.0);
        let host = Host::new(config, 255.0);
        let palette = Palette::default();
        let mut terminal = Terminal::new(TestBackend::new(30, 3)).unwrap();
        terminal
            .draw(|f| host.input.draw(f, f.area(), &palette))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let top: String = (0..30).map(|x| buffer[(x, 0)].symbol()).collect();
        let middle: String = (0..30).map(|x| buffer[(x, 1)].symbol()).collect();
        assert!(top.contains("base 16"));
        assert!(middle.contains("FF"));
        assert_eq!(buffer[(27, 1)].symbol(), "+");
        assert_eq!(buffer[(27, 1)].fg, palette.muted);
        assert_eq!(buffer[(2, 1)].symbol(), "-");
        assert_ne!(buffer[(2, 1)].fg, palette.muted);
    }
}
