//! Layers are full-screen pages (or popups drawn over them) managed by the
//! [`crate::app::layer_manager::LayerManager`] stack.

use downcast_rs::{DowncastSync, impl_downcast};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::actions::Action;
use crate::app::layer_manager::EventHandlingStatus;
use crate::tui::Event;
use crate::utils::help_msg::HelpMsg;

pub(crate) mod gallery;
pub(crate) mod help_popup;

/// A page or popup in the layer stack.
pub(crate) trait Layer: WidgetExt + EventLoopParticipant + DowncastSync {
    /// Called once, right after the layer is created
    fn init(&mut self) {}

    /// Key bindings this layer currently responds to
    fn get_help_msg(&self) -> HelpMsg {
        HelpMsg::default()
    }
}
impl_downcast!(sync Layer);

pub(crate) trait WidgetExt {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// Something that turns events into actions and applies actions to itself.
///
/// `handle_events` must not change state: it only sends actions, which come
/// back through `update` once the app drains its channel.
pub(crate) trait EventLoopParticipant {
    #[must_use]
    fn handle_events(&self, event: &Event) -> EventHandlingStatus;

    fn update(&mut self, action: Action);

    /// Handle `event`, then apply every action it produced, like one turn of the app loop.
    #[cfg(test)]
    fn event_loop_once(
        &mut self,
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<Action>,
        event: Event,
    ) -> EventHandlingStatus {
        let status = self.handle_events(&event);
        while let Ok(action) = rx.try_recv() {
            self.update(action);
        }
        status
    }

    /// Handle the event and check that it was [`EventHandlingStatus::Consumed`].
    #[cfg(test)]
    fn event_loop_once_consumed(
        &mut self,
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<Action>,
        event: Event,
    ) {
        let status = self.event_loop_once(rx, event);
        assert!(matches!(status, EventHandlingStatus::Consumed));
    }
}
