//! Widgets that live inside a layer.
//!
//! A component never changes its own state from `handle_events`; it sends an
//! [`Action::Comp`] addressed with its id and applies it in `update`. Values the
//! host owns (numbers, tags, ratings) travel back to the host as `Changed`
//! actions, which the host reads with the component's `parse_change_action`.

pub(crate) mod grid;
pub(crate) mod number_input;
pub(crate) mod star_slider;
pub(crate) mod tag_input;
pub(crate) mod theme_toggle;

use ratatui::{Frame, layout::Rect};

use crate::{
    actions::Action, app::layer_manager::EventHandlingStatus, libs::theme::Palette,
    tui::Event, utils::help_msg::HelpMsg,
};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InputMode {
    #[default]
    Idle,
    Focused,
    /// Focused and taking text input
    Editing,
}

pub(crate) trait Component {
    fn get_id(&self) -> u64;

    /// Only called for the focused component.
    fn handle_events(&self, event: &Event) -> EventHandlingStatus;

    fn update(&mut self, action: &Action);

    fn draw(&self, frame: &mut Frame, area: Rect, palette: &Palette);

    fn mode(&self) -> InputMode;

    /// Focus moved onto or away from this component. Leaving focus also ends editing.
    fn set_focused(&mut self, focused: bool);

    fn get_help_msg(&self) -> HelpMsg;
}

/// `n` distinct random component ids.
pub(crate) fn new_component_ids(n: usize) -> Vec<u64> {
    let mut ids = Vec::with_capacity(n);
    while ids.len() < n {
        let id = rand::random::<u64>();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}
