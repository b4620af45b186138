use std::cmp::min;

use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, BorderType, Borders, Clear, HighlightSpacing, List, ListItem, Padding},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    actions::{Action, ActionSender, LayerManageAction},
    app::layer_manager::EventHandlingStatus,
    libs::theme::Palette,
    tui::Event,
    utils::help_msg::{HelpEntry, HelpMsg},
};

use super::{EventLoopParticipant, Layer, WidgetExt};

/// Modal list of key bindings. Swallows every key while open.
pub(crate) struct HelpPopup {
    help_msg: HelpMsg,

    longest_entry_size: u16,
    list_state: ratatui::widgets::ListState,
    palette: Palette,

    tx: ActionSender,
}

impl HelpPopup {
    pub fn new(tx: ActionSender, msg: HelpMsg, palette: Palette) -> Option<Self> {
        let longest = msg
            .iter()
            .map(|entry| UnicodeWidthStr::width(entry.to_string().as_str()))
            .max()?;

        Some(Self {
            help_msg: msg,
            longest_entry_size: longest as u16,
            list_state: ratatui::widgets::ListState::default(),
            palette,
            tx,
        })
    }
}

#[derive(Clone, Debug)]
pub enum HelpPopupAction {
    Up,
    Down,
    Start,
    End,
}
impl From<HelpPopupAction> for Action {
    fn from(value: HelpPopupAction) -> Self {
        Action::HelpPopup(value)
    }
}

impl EventLoopParticipant for HelpPopup {
    fn handle_events(&self, event: &Event) -> EventHandlingStatus {
        let Event::Key(key) = event else {
            return EventHandlingStatus::ShouldPropagate;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                self.tx.send(LayerManageAction::Pop);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.tx.send(HelpPopupAction::Down);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.tx.send(HelpPopupAction::Up);
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.tx.send(HelpPopupAction::Start);
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.tx.send(HelpPopupAction::End);
            }
            _ => {}
        }
        EventHandlingStatus::Consumed
    }

    fn update(&mut self, action: Action) {
        match action {
            Action::HelpPopup(action) => match action {
                HelpPopupAction::Up => self.list_state.select_previous(),
                HelpPopupAction::Down => self.list_state.select_next(),
                HelpPopupAction::Start => self.list_state.select_first(),
                HelpPopupAction::End => self.list_state.select_last(),
            },
            Action::ThemeChanged(theme) => self.palette = theme.palette(),
            _ => {}
        }
    }
}

impl Layer for HelpPopup {
    fn get_help_msg(&self) -> HelpMsg {
        HelpPopup::get_self_help_msg()
    }
}

impl WidgetExt for HelpPopup {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = (self.longest_entry_size + 8)
            .max(min(50, area.width.saturating_sub(4)))
            .min(area.width);
        let show_area = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + area.height / 6,
            width,
            height: area.height * 2 / 3,
        };
        let bottom_help_area = Rect {
            x: area.x,
            y: area.y + area.height.saturating_sub(3),
            width: area.width,
            height: min(3, area.height),
        };

        frame.render_widget(Clear, bottom_help_area);
        HelpPopup::get_self_help_msg().render(frame, bottom_help_area, &self.palette);

        frame.render_widget(Clear, show_area);
        self.render_list(frame, show_area);
    }
}

impl HelpPopup {
    pub fn get_self_help_msg() -> HelpMsg {
        let help_msg = vec![
            HelpEntry::new('j', "Go Down"),
            HelpEntry::new('k', "Go Up"),
            HelpEntry::new('g', "Go to Top"),
            HelpEntry::new('G', "Go to Bottom"),
            HelpEntry::new(KeyCode::Esc, "Close help"),
        ];
        help_msg.into()
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect) {
        let selected_row_style = Style::default()
            .add_modifier(Modifier::REVERSED)
            .fg(self.palette.accent);

        let block = Block::new()
            .title(Line::raw("Help").centered())
            .border_type(BorderType::Rounded)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.palette.border))
            .padding(Padding::new(1, 1, 1, 1));

        let items: Vec<ListItem> = self
            .help_msg
            .iter()
            .map(|entry| ListItem::from(Text::raw(format!("  {}  ", entry))))
            .collect();

        let list = List::new(items)
            .block(block)
            .style(Style::default().fg(self.palette.fg))
            .highlight_style(selected_row_style)
            .highlight_spacing(HighlightSpacing::Always);

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;

    use super::*;
    use crate::utils::key_events::test_utils::get_key_evt;

    fn entries() -> HelpMsg {
        vec![
            HelpEntry::new('a', "test"),
            HelpEntry::new('b', "test2"),
            HelpEntry::new('c', "test3"),
        ]
        .into()
    }

    #[test]
    fn test_help_popup_new() {
        let (tx, _) = ActionSender::test_pair();
        let help_popup = HelpPopup::new(
            tx,
            vec![HelpEntry::new('a', "test")].into(),
            Palette::default(),
        )
        .unwrap();
        assert_eq!(help_popup.help_msg.len(), 1);
        assert_eq!(help_popup.longest_entry_size, 7);
        assert_eq!(help_popup.list_state.selected(), None);

        let (tx, _) = ActionSender::test_pair();
        assert!(HelpPopup::new(tx, HelpMsg::default(), Palette::default()).is_none());
    }

    #[test]
    fn test_navigation() {
        let (tx, mut rx) = ActionSender::test_pair();
        let mut help_popup = HelpPopup::new(tx, entries(), Palette::default()).unwrap();
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(80, 25)).unwrap();

        let mut test_loop = |key: char, expected: Option<usize>| {
            help_popup.event_loop_once_consumed(&mut rx, key.into());
            terminal
                .draw(|f| {
                    help_popup.render(f, f.area());
                })
                .unwrap();
            assert_eq!(help_popup.list_state.selected(), expected);
        };

        test_loop('j', Some(0));
        test_loop('k', Some(0));
        test_loop('G', Some(2));
        test_loop('k', Some(1));
        test_loop('j', Some(2));
        test_loop('g', Some(0));
    }

    #[test]
    fn test_keys_are_swallowed() {
        let (tx, mut rx) = ActionSender::test_pair();
        let help_popup = HelpPopup::new(tx, entries(), Palette::default()).unwrap();

        assert!(matches!(
            help_popup.handle_events(&'t'.into()),
            EventHandlingStatus::Consumed
        ));
        assert!(rx.try_recv().is_err());

        let _ = help_popup.handle_events(&get_key_evt(KeyCode::Esc));
        assert!(matches!(
            rx.try_recv(),
            Ok(Action::Layer(LayerManageAction::Pop))
        ));
    }

    #[test]
    fn test_help_popup_render() {
        let (tx, _) = ActionSender::test_pair();
        let mut help_popup = HelpPopup::new(tx, entries(), Palette::default()).unwrap();
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(80, 25)).unwrap();
        terminal
            .draw(|f| {
                help_popup.render(f, f.area());
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let rows: Vec<String> = (0..25)
            .map(|y| (0..80).map(|x| buffer[(x, y)].symbol()).collect())
            .collect();
        assert!(rows.iter().any(|r| r.contains("Help")));
        assert!(rows.iter().any(|r| r.contains("test2: b")));
        assert!(rows[23].contains("Close help: esc"));
    }
}
