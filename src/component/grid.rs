//! Vertical stack of cells, each wrapped in a dashed rounded border.

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::Style,
    symbols::border,
    widgets::{Block, Borders, Padding},
};

use crate::libs::theme::Palette;

pub(crate) const DASHED: border::Set = border::Set {
    top_left: "╭",
    top_right: "╮",
    bottom_left: "╰",
    bottom_right: "╯",
    vertical_left: "┆",
    vertical_right: "┆",
    horizontal_top: "┄",
    horizontal_bottom: "┄",
};

#[derive(Clone, Copy, Debug)]
pub(crate) struct GridBordered {
    /// Blank rows between cells
    gap: u16,
    /// Columns between the border and the content
    padding: u16,
}

impl GridBordered {
    pub fn new(gap: u16, padding: u16) -> Self {
        Self { gap, padding }
    }

    fn block(&self, palette: &Palette) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_set(DASHED)
            .border_style(Style::default().fg(palette.border))
            .padding(Padding::horizontal(self.padding))
    }

    /// Outer rects of cells whose content is `heights` rows tall. Cells that
    /// do not fit are squeezed by the layout solver.
    pub fn split(&self, area: Rect, heights: &[u16]) -> Vec<Rect> {
        Layout::vertical(heights.iter().map(|h| Constraint::Length(h + 2)))
            .spacing(self.gap)
            .flex(Flex::Start)
            .split(area)
            .to_vec()
    }

    /// Draw the cell borders and return the content rect of each cell.
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        heights: &[u16],
        palette: &Palette,
    ) -> Vec<Rect> {
        self.split(area, heights)
            .into_iter()
            .map(|cell| {
                let block = self.block(palette);
                let inner = block.inner(cell);
                frame.render_widget(block, cell);
                inner
            })
            .collect()
    }
}
