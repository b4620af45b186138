//! The demo page: a theme toggle, several numeric inputs bound to one value,
//! a tag input and a star slider.

use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Paragraph},
};
use tracing::{debug, info};

use crate::{
    actions::{Action, ActionSender},
    app::{global_help_msg, layer_manager::EventHandlingStatus},
    component::{
        Component, InputMode, grid::GridBordered, new_component_ids, number_input::NumberInput,
        star_slider::StarSlider, tag_input::TagInput, theme_toggle::ThemeToggle,
    },
    config::GalleryConfig,
    libs::{
        numeric::NumberConfigError,
        stars::{STAR_COUNT, StarRating},
        tags::TagPicker,
        theme::{Palette, Theme},
    },
    trace_dbg,
    tui::Event,
    utils::help_msg::{HelpEntry, HelpMsg},
};

use super::{EventLoopParticipant, Layer, WidgetExt};

/// Numeric inputs go side by side when a row is at least this wide.
const TWO_COLUMN_WIDTH: u16 = 60;
const NUMBER_HEIGHT: u16 = 3;

pub(crate) struct Gallery {
    count: f64,
    tags: Vec<String>,
    stars: f64,

    /// Index into the focus order: toggle, numeric inputs, tags, stars
    focus: usize,
    toggle: ThemeToggle,
    numbers: Vec<NumberInput>,
    tag_input: TagInput,
    star_slider: StarSlider,

    palette: Palette,
    tx: ActionSender,
}

#[derive(Clone, Debug)]
pub enum GalleryAction {
    MoveFocus(usize),
}
impl From<GalleryAction> for Action {
    fn from(value: GalleryAction) -> Self {
        Action::Gallery(value)
    }
}

impl Gallery {
    pub fn new(
        tx: ActionSender,
        config: &GalleryConfig,
        theme: Theme,
    ) -> Result<Self, NumberConfigError> {
        let number_configs = trace_dbg!(config.number_configs()?);
        let rating = StarRating::new(0.0, STAR_COUNT as f64, config.rating_step)?;
        let mut ids = new_component_ids(number_configs.len() + 3).into_iter();
        let mut next_id = || ids.next().unwrap_or_else(rand::random);

        let count = 0.0;
        let numbers = number_configs
            .into_iter()
            .map(|config| NumberInput::new(next_id(), tx.clone(), config, count))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            count,
            tags: Vec::new(),
            stars: 0.0,
            focus: 0,
            toggle: ThemeToggle::new(next_id(), tx.clone(), theme),
            numbers,
            tag_input: TagInput::new(
                next_id(),
                tx.clone(),
                TagPicker::new(config.suggested_tags.iter().cloned())
                    .set_add_new_to_list(config.remember_custom_tags),
                Vec::new(),
            ),
            star_slider: StarSlider::new(next_id(), tx.clone(), rating, 0.0),
            palette: theme.palette(),
            tx,
        })
    }

    fn focus_len(&self) -> usize {
        self.numbers.len() + 3
    }

    fn components(&self) -> Vec<&dyn Component> {
        let mut comps: Vec<&dyn Component> = vec![&self.toggle];
        comps.extend(self.numbers.iter().map(|n| n as &dyn Component));
        comps.push(&self.tag_input);
        comps.push(&self.star_slider);
        comps
    }

    fn components_mut(&mut self) -> Vec<&mut dyn Component> {
        let mut comps: Vec<&mut dyn Component> = vec![&mut self.toggle];
        comps.extend(self.numbers.iter_mut().map(|n| n as &mut dyn Component));
        comps.push(&mut self.tag_input);
        comps.push(&mut self.star_slider);
        comps
    }

    fn focused(&self) -> Option<&dyn Component> {
        self.components().get(self.focus).copied()
    }

    fn move_focus(&mut self, target: usize) {
        let target = target % self.focus_len();
        let current = self.focus;
        let mut comps = self.components_mut();
        if let Some(comp) = comps.get_mut(current) {
            comp.set_focused(false);
        }
        if let Some(comp) = comps.get_mut(target) {
            comp.set_focused(true);
            debug!("Gallery focus moved to {} (component {})", target, comp.get_id());
        }
        self.focus = target;
    }

    /// Take changes reported by the components into the page state and push
    /// them back to every component that shows them.
    fn apply_changes(&mut self, action: &Action) {
        if let Some(value) = self.numbers.iter().find_map(|n| n.parse_change_action(action)) {
            info!("Count changed to {}", value);
            self.count = value;
            self.numbers.iter_mut().for_each(|n| n.sync(value));
        }
        if let Some(tags) = self.tag_input.parse_change_action(action) {
            info!("Tags changed to {:?}", tags);
            self.tags = tags.clone();
            self.tag_input.sync(tags);
        }
        if let Some(value) = self.star_slider.parse_change_action(action) {
            info!("Rating changed to {}", value);
            self.stars = value;
            self.star_slider.sync(value);
        }
    }

    fn render_numbers(&self, frame: &mut Frame, area: Rect) {
        let columns = if area.width >= TWO_COLUMN_WIDTH { 2 } else { 1 };
        let rows = self.numbers.chunks(columns);
        let row_areas = Layout::vertical(vec![Constraint::Length(NUMBER_HEIGHT); rows.len()])
            .split(area);
        for (row, row_area) in rows.zip(row_areas.iter()) {
            let cells = Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns])
                .spacing(1)
                .split(*row_area);
            for (input, cell) in row.iter().zip(cells.iter()) {
                input.draw(frame, *cell, &self.palette);
            }
        }
    }

    /// One-line view of the page state.
    fn summary(&self) -> String {
        let tags = if self.tags.is_empty() {
            "none".to_string()
        } else {
            self.tags.join(", ")
        };
        format!("value {} | tags: {} | rating {}", self.count, tags, self.stars)
    }

    fn number_rows(&self, width: u16) -> u16 {
        let columns = if width >= TWO_COLUMN_WIDTH { 2 } else { 1 };
        self.numbers.len().div_ceil(columns) as u16
    }
}

impl EventLoopParticipant for Gallery {
    fn handle_events(&self, event: &Event) -> EventHandlingStatus {
        if let Some(comp) = self.focused() {
            if let EventHandlingStatus::Consumed = comp.handle_events(event) {
                return EventHandlingStatus::Consumed;
            }
        }

        let Event::Key(key) = event else {
            return EventHandlingStatus::ShouldPropagate;
        };
        let len = self.focus_len();
        match key.code {
            KeyCode::Tab | KeyCode::Char('j') | KeyCode::Down => {
                self.tx.send(GalleryAction::MoveFocus((self.focus + 1) % len));
            }
            KeyCode::BackTab | KeyCode::Char('k') | KeyCode::Up => {
                self.tx
                    .send(GalleryAction::MoveFocus((self.focus + len - 1) % len));
            }
            _ => return EventHandlingStatus::ShouldPropagate,
        }
        EventHandlingStatus::Consumed
    }

    fn update(&mut self, action: Action) {
        match &action {
            Action::Gallery(GalleryAction::MoveFocus(target)) => self.move_focus(*target),
            Action::ThemeChanged(theme) => self.palette = theme.palette(),
            _ => {}
        }
        self.apply_changes(&action);
        self.components_mut()
            .into_iter()
            .for_each(|comp| comp.update(&action));
    }
}

impl Layer for Gallery {
    fn init(&mut self) {
        let focus = self.focus;
        if let Some(comp) = self.components_mut().get_mut(focus) {
            comp.set_focused(true);
        }
    }

    fn get_help_msg(&self) -> HelpMsg {
        let mut msg = self
            .focused()
            .map(|comp| comp.get_help_msg())
            .unwrap_or_default();
        if self
            .focused()
            .is_none_or(|comp| comp.mode() != InputMode::Editing)
        {
            let navigation: HelpMsg = vec![
                HelpEntry::new_plain("tab/j", "Next widget"),
                HelpEntry::new_plain("shift-tab/k", "Previous widget"),
            ]
            .into();
            msg.extend(&navigation);
        }
        msg
    }
}

impl WidgetExt for Gallery {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(
            Block::default().style(Style::default().fg(self.palette.fg).bg(self.palette.bg)),
            area,
        );

        let [header_area, body_area, help_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(area);

        let [title_area, toggle_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(18)]).areas(header_area);
        let title = Paragraph::new(vec![
            Line::raw(" radix widgets").style(
                Style::default()
                    .fg(self.palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::raw(format!(" {}", self.summary()))
                .style(Style::default().fg(self.palette.muted)),
        ]);
        frame.render_widget(title, title_area);
        self.toggle.draw(frame, toggle_area, &self.palette);

        let grid = GridBordered::new(0, 1);
        // borders (2) and horizontal padding (2) of the grid cells
        let cell_width = body_area.width.saturating_sub(4);
        let heights = [
            self.number_rows(cell_width) * NUMBER_HEIGHT,
            self.tag_input.height(),
            3,
        ];
        let cells = grid.render(frame, body_area, &heights, &self.palette);
        if let [numbers_area, tags_area, stars_area] = cells[..] {
            self.render_numbers(frame, numbers_area);
            self.tag_input.draw(frame, tags_area, &self.palette);
            self.star_slider.draw(frame, stars_area, &self.palette);
        }

        self.get_help_msg()
            .extend_ret(&global_help_msg())
            .render(frame, help_area, &self.palette);
    }
}

#[cfg(test)]
impl Gallery {
    pub fn count(&self) -> f64 {
        self.count
    }
}
