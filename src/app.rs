pub(crate) mod layer_manager;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use layer_manager::{EventHandlingStatus, LayerManager};
use tracing::{debug, info};

use crate::{
    actions::{Action, LayerManageAction, Layers, PushTarget},
    config::Config,
    libs::theme::{FileThemeStore, ThemeContext, ThemeStore},
    tui::{Event, TuiEnum},
    utils::{
        help_msg::{HelpEntry, HelpMsg},
        key_events::KeyEvent,
    },
};

pub struct RootState {
    pub should_quit: bool,
    pub should_suspend: bool,
    pub action_tx: tokio::sync::mpsc::UnboundedSender<Action>,
    pub action_rx: tokio::sync::mpsc::UnboundedReceiver<Action>,
    /// A widget is taking text input; global keys are off
    pub input_mode: bool,

    pub config: Config,
    pub theme: ThemeContext,
}

impl RootState {
    /// State with the theme preference stored in the data directory.
    pub fn new(config: Config) -> Self {
        let store = FileThemeStore::new(config.config.theme_path());
        Self::with_theme_store(config, Box::new(store))
    }

    pub fn with_theme_store(config: Config, store: Box<dyn ThemeStore>) -> Self {
        let (action_tx, action_rx) = tokio::sync::mpsc::unbounded_channel();
        let theme = ThemeContext::resolve(store, config.config.theme);
        Self {
            should_quit: false,
            should_suspend: false,
            action_tx,
            action_rx,
            input_mode: false,
            config,
            theme,
        }
    }

    pub fn send_action<T: Into<Action>>(&self, action: T) {
        crate::actions::ActionSender(self.action_tx.clone()).send(action);
    }
}

/// Keys handled by the app itself, whatever layer is on top.
pub(crate) fn global_help_msg() -> HelpMsg {
    vec![
        HelpEntry::new('t', "Toggle theme"),
        HelpEntry::new('?', "Help"),
        HelpEntry::new('q', "Quit"),
        HelpEntry::new(KeyEvent::ctrl('z'), "Suspend"),
    ]
    .into()
}

pub struct App {
    layer_manager: LayerManager,
    state: RootState,
    tui: TuiEnum,
}

impl App {
    pub fn new(state: RootState, tui: TuiEnum) -> Result<Self> {
        let layer_manager = LayerManager::new(&state)?;
        Ok(Self {
            layer_manager,
            state,
            tui,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.tui.enter()?;

        loop {
            let event = self.tui.next().await?;
            self.handle_event(event);
            self.drain_actions()?;

            if self.state.should_suspend {
                self.tui.suspend()?;
                self.state.send_action(Action::Resume);
                self.tui.resume()?;
            }
            if self.state.should_quit {
                break;
            }
        }

        self.tui.exit()?;
        Ok(())
    }

    fn drain_actions(&mut self) -> Result<()> {
        while let Ok(action) = self.state.action_rx.try_recv() {
            self.perform_action(action)?;
        }
        Ok(())
    }

    /// Turn a terminal event into actions.
    ///
    /// Key events go to the top layer first. Keys it leaves alone are checked
    /// against the global bindings, unless a widget is taking text input.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Render | Event::Resize(_, _) => self.state.send_action(Action::Render),
            Event::Error => self.state.send_action(Action::Quit),
            Event::Init | Event::Tick | Event::FocusGained | Event::FocusLost => {}
            Event::Key(_) | Event::Paste(_) => {
                let status = self.layer_manager.handle_event(&event);
                if status == EventHandlingStatus::Consumed || self.state.input_mode {
                    return;
                }
                if let Event::Key(key) = event {
                    match (key.modifiers, key.code) {
                        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q')) => {
                            self.state.send_action(Action::Quit)
                        }
                        (KeyModifiers::CONTROL, KeyCode::Char('z')) => {
                            self.state.send_action(Action::Suspend)
                        }
                        (_, KeyCode::Char('t')) => self.state.send_action(Action::ToggleTheme),
                        (_, KeyCode::Char('?')) => {
                            let help = self.layer_manager.help_msg().extend_ret(&global_help_msg());
                            self.state
                                .send_action(LayerManageAction::Push(PushTarget {
                                    layer: Layers::Help(help),
                                    render_self: true,
                                }))
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Apply an action. The only place where application state changes.
    fn perform_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => {
                info!("Quitting");
                self.state.should_quit = true;
            }
            Action::Suspend => self.state.should_suspend = true,
            Action::Resume => {
                self.state.should_suspend = false;
                self.state.send_action(Action::Render);
            }
            Action::Render => {
                self.tui.draw(|f| self.layer_manager.render(f))?;
            }
            Action::SwitchInputMode(mode) => {
                debug!("Input mode {}", if mode { "on" } else { "off" });
                self.state.input_mode = mode;
            }
            Action::ToggleTheme => {
                let theme = self.state.theme.toggle();
                self.state.send_action(Action::ThemeChanged(theme));
            }
            Action::ThemeChanged(_) => self.layer_manager.broadcast(action),
            Action::Layer(layer_action) => {
                self.layer_manager
                    .handle_layer_action(&layer_action, &self.state)?;
                self.state.send_action(Action::Render);
            }
            _ => self.layer_manager.handle_action(action),
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::{AppConfig, GalleryConfig},
        libs::theme::{Theme, test_utils::MemoryThemeStore},
        page::{gallery::Gallery, help_popup::HelpPopup},
        tui::TestTui,
        utils::key_events::test_utils::{get_char_evt, get_key_evt, get_typing_evts},
    };

    fn test_app(store: MemoryThemeStore) -> App {
        scripted_app(store, [])
    }

    fn scripted_app(store: MemoryThemeStore, script: impl IntoIterator<Item = Event>) -> App {
        let config = Config {
            config: AppConfig::default(),
            gallery: GalleryConfig::default(),
        };
        let state = RootState::with_theme_store(config, Box::new(store));
        App::new(state, TestTui::new(80, 30).script(script).into()).unwrap()
    }

    impl App {
        fn event_loop_once(&mut self, event: Event) {
            self.handle_event(event);
            self.drain_actions().unwrap();
        }

        fn screen(&self) -> String {
            let buffer = self.tui.backend().buffer();
            (0..buffer.area.height)
                .map(|y| {
                    (0..buffer.area.width)
                        .map(|x| buffer[(x, y)].symbol())
                        .collect::<String>()
                        + "\n"
                })
                .collect()
        }
    }

    #[test]
    fn quit_key() {
        let mut app = test_app(MemoryThemeStore::with(Theme::Light));
        app.event_loop_once(get_char_evt('q'));
        assert!(app.state.should_quit);

        let mut app = test_app(MemoryThemeStore::with(Theme::Light));
        app.event_loop_once(Event::Key(KeyEvent::ctrl('c').into()));
        assert!(app.state.should_quit);
    }

    #[test]
    fn theme_toggle_persists_and_broadcasts() {
        let store = MemoryThemeStore::with(Theme::Light);
        let mut app = test_app(store.clone());
        app.event_loop_once(get_char_evt('t'));
        assert_eq!(app.state.theme.theme(), Theme::Dark);
        assert_eq!(store.saved(), Some(Theme::Dark));

        app.event_loop_once(Event::Render);
        assert!(app.screen().contains("☀ Light mode"));

        // the focused toggle button does the same
        app.event_loop_once(get_key_evt(KeyCode::Enter));
        assert_eq!(store.saved(), Some(Theme::Light));
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut app = test_app(MemoryThemeStore::with(Theme::Light));
        app.event_loop_once(get_char_evt('?'));
        assert_eq!(app.layer_manager.len(), 2);
        assert!(app.layer_manager.top::<HelpPopup>().is_some());
        assert!(app.screen().contains("Switch theme: enter"));
        assert!(app.screen().contains("Quit: q"));

        // the popup swallows global keys
        app.event_loop_once(get_char_evt('t'));
        assert_eq!(app.state.theme.theme(), Theme::Light);

        app.event_loop_once(get_key_evt(KeyCode::Esc));
        assert_eq!(app.layer_manager.len(), 1);
        assert!(app.layer_manager.top::<Gallery>().is_some());
    }

    #[test]
    fn editing_disables_global_keys() {
        let mut app = test_app(MemoryThemeStore::with(Theme::Light));
        app.event_loop_once(get_key_evt(KeyCode::Tab));
        app.event_loop_once(get_key_evt(KeyCode::Enter));
        assert!(app.state.input_mode);

        for event in get_typing_evts("q42t") {
            app.event_loop_once(event);
        }
        assert!(!app.state.should_quit);
        assert_eq!(app.state.theme.theme(), Theme::Light);

        app.event_loop_once(Event::Render);
        let screen = app.screen();
        assert!(screen.contains("101010"));
        assert!(screen.contains("2A"));
        assert!(screen.contains("value 42"));

        app.event_loop_once(get_key_evt(KeyCode::Esc));
        assert!(!app.state.input_mode);
        app.event_loop_once(get_char_evt('q'));
        assert!(app.state.should_quit);
    }

    #[test]
    fn suspend_sets_flag() {
        let mut app = test_app(MemoryThemeStore::with(Theme::Light));
        app.event_loop_once(Event::Key(KeyEvent::ctrl('z').into()));
        assert!(app.state.should_suspend);
        app.perform_action(Action::Resume).unwrap();
        assert!(!app.state.should_suspend);
    }

    #[tokio::test]
    async fn run_until_quit_key() {
        let store = MemoryThemeStore::with(Theme::Light);
        let mut app = scripted_app(
            store.clone(),
            [Event::Init, Event::Render, get_char_evt('t'), get_char_evt('q'), get_char_evt('t')],
        );
        app.run().await.unwrap();
        assert!(app.state.should_quit);
        // the second toggle came after quitting
        assert_eq!(store.saved(), Some(Theme::Dark));
        assert!(app.screen().contains("radix widgets"));
    }

    #[tokio::test]
    async fn run_ends_when_input_closes() {
        let mut app = scripted_app(MemoryThemeStore::with(Theme::Light), [Event::Tick]);
        app.run().await.unwrap();
        assert!(app.state.should_quit);
    }
}
