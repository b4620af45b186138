use std::ops::{Deref, DerefMut};

use color_eyre::{Result, eyre::Context};
use ratatui::Frame;
use tracing::{error, info, warn};

use crate::{
    actions::{Action, LayerManageAction, Layers},
    page::{
        EventLoopParticipant, Layer, WidgetExt, gallery::Gallery, help_popup::HelpPopup,
    },
    tui::Event,
    utils::help_msg::HelpMsg,
};

use super::RootState;

/// Whether a layer (or component) used an event or left it for its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandlingStatus {
    Consumed,
    ShouldPropagate,
}

pub(super) struct BoxedLayer(Box<dyn Layer>);
impl Deref for BoxedLayer {
    type Target = dyn Layer;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
impl DerefMut for BoxedLayer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.0
    }
}
impl From<Box<dyn Layer>> for BoxedLayer {
    fn from(layer: Box<dyn Layer>) -> Self {
        Self(layer)
    }
}
impl BoxedLayer {
    fn into_layer_config(self, render: bool) -> LayerConfig {
        LayerConfig {
            layer: self,
            render,
        }
    }
}

pub(super) struct LayerConfig {
    layer: BoxedLayer,
    /// Draw this layer even when it is not on top
    render: bool,
}

impl Deref for LayerConfig {
    type Target = BoxedLayer;

    fn deref(&self) -> &Self::Target {
        &self.layer
    }
}
impl DerefMut for LayerConfig {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.layer
    }
}

pub(super) struct LayerManager {
    layers: Vec<LayerConfig>,
}

impl Deref for LayerManager {
    type Target = Vec<LayerConfig>;

    fn deref(&self) -> &Self::Target {
        &self.layers
    }
}
impl DerefMut for LayerManager {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.layers
    }
}

impl LayerManager {
    /// A stack holding the gallery page.
    pub(super) fn new(state: &RootState) -> Result<Self> {
        let gallery = LayerManager::get_layer(&Layers::Gallery, state)?
            .ok_or_else(|| color_eyre::eyre::eyre!("Unable to create the gallery page"))?;
        Ok(Self {
            layers: vec![gallery.into_layer_config(true)],
        })
    }

    pub(super) fn render(&mut self, f: &mut Frame) {
        let area = f.area();
        let top = self.layers.len().saturating_sub(1);
        self.layers
            .iter_mut()
            .enumerate()
            .filter(|(i, layer)| layer.render || *i == top)
            .for_each(|(_, layer)| layer.render(f, area));
    }

    /// Events go to the top layer only.
    pub(super) fn handle_event(&self, event: &Event) -> EventHandlingStatus {
        match self.layers.last() {
            Some(layer) => layer.handle_events(event),
            None => EventHandlingStatus::ShouldPropagate,
        }
    }

    /// Handle LayerManageAction for root app, updating the layer stack
    pub(super) fn handle_layer_action(
        &mut self,
        action: &LayerManageAction,
        state: &RootState,
    ) -> Result<()> {
        match action {
            LayerManageAction::Push(target) => {
                let Some(layer) = LayerManager::get_layer(&target.layer, state)? else {
                    return Ok(());
                };
                if let Some(current) = self.layers.last_mut() {
                    current.render = target.render_self;
                }
                self.layers.push(layer.into_layer_config(true));
                info!(
                    "Pushing a {} page, current page will {} render, new layer stack length {}",
                    target.layer,
                    if target.render_self { "still" } else { "not" },
                    self.layers.len()
                );
            }
            LayerManageAction::Pop => {
                self.layers.pop();
                if self.layers.is_empty() {
                    warn!("Popped the last layer, recreating the gallery");
                    if let Some(layer) = LayerManager::get_layer(&Layers::Gallery, state)? {
                        self.layers.push(layer.into_layer_config(true));
                    }
                }
                if let Some(current) = self.layers.last_mut() {
                    current.render = true;
                }
                info!(
                    "Popping page, current layer stack length {}",
                    self.layers.len()
                );
            }
        }
        Ok(())
    }

    /// Pass the action to the top layer.
    pub(super) fn handle_action(&mut self, action: Action) {
        match self.layers.last_mut() {
            Some(layer) => layer.update(action),
            None => error!("No layer to handle {:?}", action),
        }
    }

    /// Pass the action to every layer, bottom first.
    pub(super) fn broadcast(&mut self, action: Action) {
        self.layers
            .iter_mut()
            .for_each(|layer| layer.update(action.clone()));
    }

    /// Help of the top layer.
    pub(super) fn help_msg(&self) -> HelpMsg {
        self.layers
            .last()
            .map(|layer| layer.get_help_msg())
            .unwrap_or_default()
    }

    /// Build a layer. `Ok(None)` when there is nothing to show (an empty help popup).
    fn get_layer(layer: &Layers, state: &RootState) -> Result<Option<BoxedLayer>> {
        let mut page = match layer {
            Layers::Gallery => Box::new(
                Gallery::new(
                    state.action_tx.clone().into(),
                    &state.config.gallery,
                    state.theme.theme(),
                )
                .context("Invalid gallery configuration")?,
            ) as Box<dyn Layer>,
            Layers::Help(help_msg) => {
                match HelpPopup::new(
                    state.action_tx.clone().into(),
                    help_msg.clone(),
                    state.theme.palette(),
                ) {
                    Some(help) => Box::new(help) as Box<dyn Layer>,
                    None => {
                        warn!("Help message is empty");
                        return Ok(None);
                    }
                }
            }
        };
        page.init();
        Ok(Some(page.into()))
    }
}

#[cfg(test)]
impl LayerManager {
    pub(super) fn top<T: Layer>(&self) -> Option<&T> {
        self.layers.last()?.layer.0.downcast_ref::<T>()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        actions::PushTarget,
        config::Config,
        libs::theme::{Theme, test_utils::MemoryThemeStore},
        utils::help_msg::HelpEntry,
    };

    fn state() -> RootState {
        let config = Config {
            config: Default::default(),
            gallery: Default::default(),
        };
        RootState::with_theme_store(config, Box::new(MemoryThemeStore::with(Theme::Dark)))
    }

    fn push_help(msg: HelpMsg) -> LayerManageAction {
        LayerManageAction::Push(PushTarget {
            layer: Layers::Help(msg),
            render_self: false,
        })
    }

    #[test]
    fn push_and_pop() {
        let state = state();
        let mut manager = LayerManager::new(&state).unwrap();
        assert!(manager.top::<Gallery>().is_some());

        let help: HelpMsg = vec![HelpEntry::new('x', "Something")].into();
        manager.handle_layer_action(&push_help(help), &state).unwrap();
        assert_eq!(manager.len(), 2);
        assert!(manager.top::<HelpPopup>().is_some());
        assert!(!manager[0].render);

        manager
            .handle_layer_action(&LayerManageAction::Pop, &state)
            .unwrap();
        assert_eq!(manager.len(), 1);
        assert!(manager[0].render);
    }

    #[test]
    fn empty_help_is_not_pushed() {
        let state = state();
        let mut manager = LayerManager::new(&state).unwrap();
        manager
            .handle_layer_action(&push_help(HelpMsg::default()), &state)
            .unwrap();
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn popping_the_last_layer_recreates_gallery() {
        let state = state();
        let mut manager = LayerManager::new(&state).unwrap();
        manager
            .handle_layer_action(&LayerManageAction::Pop, &state)
            .unwrap();
        assert_eq!(manager.len(), 1);
        assert!(manager.top::<Gallery>().is_some());
    }
}
