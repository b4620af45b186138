use strum::Display;
use tracing::error;

use crate::{
    component::{
        number_input::NumberInputAction, star_slider::StarSliderAction, tag_input::TagInputAction,
    },
    libs::theme::Theme,
    page::{gallery::GalleryAction, help_popup::HelpPopupAction},
    utils::help_msg::HelpMsg,
};

/// Everything that changes application state goes through an `Action`.
#[derive(Clone, Debug)]
pub enum Action {
    Render,
    Quit,
    Suspend,
    Resume,
    /// A text widget took (or released) the keyboard; global keys are off meanwhile
    SwitchInputMode(bool),

    ToggleTheme,
    /// Sent to every layer after the theme flipped
    ThemeChanged(Theme),

    Layer(LayerManageAction),
    Gallery(GalleryAction),
    HelpPopup(HelpPopupAction),

    /// Component action, addressed by component id
    Comp((CompAction, u64)),
}

#[derive(Clone, Debug)]
pub enum LayerManageAction {
    Push(PushTarget),
    Pop,
}

#[derive(Clone, Debug)]
pub struct PushTarget {
    pub layer: Layers,
    /// Keep drawing the layer underneath
    pub render_self: bool,
}

#[derive(Clone, Debug, Display)]
pub enum Layers {
    Gallery,
    Help(HelpMsg),
}

impl From<LayerManageAction> for Action {
    fn from(value: LayerManageAction) -> Self {
        Action::Layer(value)
    }
}

#[derive(Clone, Debug)]
pub enum CompAction {
    NumberInput(NumberInputAction),
    TagInput(TagInputAction),
    StarSlider(StarSliderAction),
}

#[derive(Clone, Debug)]
pub struct ActionSender(pub tokio::sync::mpsc::UnboundedSender<Action>);

impl ActionSender {
    pub fn send<T: Into<Action>>(&self, action: T) {
        if let Err(err) = self.0.send(action.into()) {
            error!(
                "Action receiver is closed, dropping {:?}. This should not happen while the app is running.",
                err.0
            );
        }
    }
}

impl From<tokio::sync::mpsc::UnboundedSender<Action>> for ActionSender {
    fn from(value: tokio::sync::mpsc::UnboundedSender<Action>) -> Self {
        ActionSender(value)
    }
}

#[cfg(test)]
impl ActionSender {
    /// A sender plus the receiving end, for driving components in tests.
    pub fn test_pair() -> (Self, tokio::sync::mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (tx.into(), rx)
    }
}
