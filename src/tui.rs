//! The terminal side of the gallery.
//!
//! [`Tui`] owns stderr in raw mode on the alternate screen. A background task
//! merges crossterm input with two timers and feeds the app a single stream
//! of [`Event`]s: `Tick` at `tick_rate`, `Render` at `frame_rate`, and key
//! presses, pastes and resizes as they happen. Bracketed paste is switched on
//! so a pasted number reaches the numeric input as one [`Event::Paste`].
//!
//! [`TestTui`] draws into ratatui's `TestBackend` and replays a scripted list
//! of events, which lets tests drive [`crate::app::App::run`] end to end.

use std::{
    collections::VecDeque,
    io::{Stderr, stderr},
    ops::{Deref, DerefMut},
    time::{Duration, Instant},
};

use color_eyre::eyre::{Result, eyre};
use crossterm::event::{KeyCode, KeyModifiers};
use futures::{FutureExt, StreamExt};
use ratatui::{
    Frame,
    backend::{CrosstermBackend, TestBackend},
    crossterm::{
        cursor,
        event::{
            DisableBracketedPaste, EnableBracketedPaste, Event as CrosstermEvent, KeyEvent,
            KeyEventKind,
        },
        terminal::{EnterAlternateScreen, LeaveAlternateScreen},
    },
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// How long [`Tui::exit`] waits for the event task before aborting it
const SHUTDOWN_GRACE: Duration = Duration::from_millis(50);
/// How long it waits after aborting before giving up on the task
const ABORT_GRACE: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Init,
    /// The input stream failed; the app quits
    Error,
    Tick,
    Render,
    FocusGained,
    FocusLost,
    /// Bracketed paste
    Paste(String),
    /// Key press (releases and repeats are filtered out)
    Key(KeyEvent),
    Resize(u16, u16),
}

impl From<KeyCode> for Event {
    fn from(value: KeyCode) -> Self {
        Event::Key(KeyEvent::new(value, KeyModifiers::NONE))
    }
}
impl From<char> for Event {
    fn from(value: char) -> Self {
        Event::Key(KeyEvent::new(KeyCode::Char(value), KeyModifiers::NONE))
    }
}

/// Map a crossterm event to the gallery's own. Mouse input and key releases
/// are dropped.
fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
        CrosstermEvent::FocusLost => Some(Event::FocusLost),
        CrosstermEvent::FocusGained => Some(Event::FocusGained),
        CrosstermEvent::Paste(text) => Some(Event::Paste(text)),
        _ => None,
    }
}

/// Either a real terminal or the in-memory one, behind one interface for
/// [`crate::app::App`].
pub enum TuiEnum {
    Crossterm(Tui),
    Test(TestTui),
}

impl From<Tui> for TuiEnum {
    fn from(tui: Tui) -> Self {
        TuiEnum::Crossterm(tui)
    }
}
impl From<TestTui> for TuiEnum {
    fn from(tui: TestTui) -> Self {
        TuiEnum::Test(tui)
    }
}
impl TuiEnum {
    pub fn enter(&mut self) -> Result<()> {
        match self {
            TuiEnum::Crossterm(tui) => tui.enter(),
            TuiEnum::Test(_) => Ok(()),
        }
    }

    pub fn exit(&mut self) -> Result<()> {
        match self {
            TuiEnum::Crossterm(tui) => tui.exit(),
            TuiEnum::Test(_) => Ok(()),
        }
    }

    pub fn suspend(&mut self) -> Result<()> {
        match self {
            TuiEnum::Crossterm(tui) => tui.suspend(),
            TuiEnum::Test(_) => Ok(()),
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        match self {
            TuiEnum::Crossterm(tui) => tui.resume(),
            TuiEnum::Test(_) => Ok(()),
        }
    }

    pub async fn next(&mut self) -> Result<Event> {
        match self {
            TuiEnum::Crossterm(tui) => tui.next().await,
            TuiEnum::Test(tui) => Ok(tui.next_scripted()),
        }
    }

    pub fn draw(&mut self, f: impl FnOnce(&mut Frame)) -> Result<()> {
        match self {
            TuiEnum::Crossterm(tui) => tui.draw(f).map(|_| ()).map_err(Into::into),
            TuiEnum::Test(tui) => tui.draw(f).map(|_| ()).map_err(Into::into),
        }
    }
}

pub struct Tui {
    pub terminal: ratatui::Terminal<CrosstermBackend<Stderr>>,
    event_task: JoinHandle<()>,
    shutdown: CancellationToken,
    event_rx: UnboundedReceiver<Event>,
    event_tx: UnboundedSender<Event>,
    /// Render events per second
    pub frame_rate: f64,
    /// Tick events per second
    pub tick_rate: f64,
    pub paste: bool,
}

impl Tui {
    pub fn new() -> Result<Self> {
        let terminal = ratatui::Terminal::new(CrosstermBackend::new(stderr()))?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Ok(Self {
            terminal,
            event_task: tokio::spawn(async {}),
            shutdown: CancellationToken::new(),
            event_rx,
            event_tx,
            frame_rate: 60.0,
            tick_rate: 4.0,
            paste: false,
        })
    }

    pub fn tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn paste(mut self, paste: bool) -> Self {
        self.paste = paste;
        self
    }

    /// Spawn a fresh event task, replacing any previous one.
    fn spawn_event_task(&mut self) {
        let tick_every = Duration::from_secs_f64(1.0 / self.tick_rate);
        let render_every = Duration::from_secs_f64(1.0 / self.frame_rate);
        self.shutdown.cancel();
        self.shutdown = CancellationToken::new();
        let shutdown = self.shutdown.clone();
        let event_tx = self.event_tx.clone();

        self.event_task = tokio::spawn(async move {
            let mut input = crossterm::event::EventStream::new();
            let mut ticks = tokio::time::interval(tick_every);
            let mut frames = tokio::time::interval(render_every);
            let send = |event: Event| {
                if event_tx.send(event).is_err() {
                    debug!("Event receiver dropped");
                }
            };

            send(Event::Init);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    next = input.next().fuse() => match next {
                        Some(Ok(event)) => {
                            if let Some(event) = translate(event) {
                                send(event);
                            }
                        }
                        Some(Err(err)) => {
                            warn!("Terminal input failed: {}", err);
                            send(Event::Error);
                        }
                        None => {}
                    },
                    _ = ticks.tick() => send(Event::Tick),
                    _ = frames.tick() => send(Event::Render),
                }
            }
        });
    }

    /// Cancel the event task and wait for it, aborting it if it lingers.
    fn stop_event_task(&self) {
        self.shutdown.cancel();
        let started = Instant::now();
        let mut aborted = false;
        while !self.event_task.is_finished() {
            let waited = started.elapsed();
            if waited > SHUTDOWN_GRACE + ABORT_GRACE {
                error!("Event task still running after {:?}", waited);
                break;
            }
            if !aborted && waited > SHUTDOWN_GRACE {
                self.event_task.abort();
                aborted = true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn enter(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(stderr(), EnterAlternateScreen, cursor::Hide)?;
        if self.paste {
            crossterm::execute!(stderr(), EnableBracketedPaste)?;
        }
        self.spawn_event_task();
        Ok(())
    }

    /// Stop reading input and give the terminal back to the shell.
    pub fn exit(&mut self) -> Result<()> {
        self.stop_event_task();
        if crossterm::terminal::is_raw_mode_enabled()? {
            self.flush()?;
            if self.paste {
                crossterm::execute!(stderr(), DisableBracketedPaste)?;
            }
            crossterm::execute!(stderr(), LeaveAlternateScreen, cursor::Show)?;
            crossterm::terminal::disable_raw_mode()?;
        }
        Ok(())
    }

    /// Leave the terminal and stop the process with SIGTSTP (Unix only).
    pub fn suspend(&mut self) -> Result<()> {
        self.exit()?;
        #[cfg(not(windows))]
        signal_hook::low_level::raise(signal_hook::consts::signal::SIGTSTP)?;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.enter()
    }

    pub async fn next(&mut self) -> Result<Event> {
        self.event_rx
            .recv()
            .await
            .ok_or_else(|| eyre!("Terminal event stream closed"))
    }
}

impl Deref for Tui {
    type Target = ratatui::Terminal<CrosstermBackend<Stderr>>;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl DerefMut for Tui {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(err) = self.exit() {
            error!("Unable to restore terminal: {:?}", err);
        }
    }
}

/// In-memory terminal for tests. Hands out its scripted events in order;
/// once they run out it reports [`Event::Error`], which ends the session the
/// way a closed input stream would.
pub struct TestTui {
    pub terminal: ratatui::Terminal<TestBackend>,
    script: VecDeque<Event>,
}

impl TestTui {
    fn next_scripted(&mut self) -> Event {
        self.script.pop_front().unwrap_or(Event::Error)
    }
}

#[cfg(test)]
impl TestTui {
    pub fn new(width: u16, height: u16) -> Self {
        let terminal = ratatui::Terminal::new(TestBackend::new(width, height)).unwrap();
        Self {
            terminal,
            script: VecDeque::new(),
        }
    }

    pub fn script(mut self, events: impl IntoIterator<Item = Event>) -> Self {
        self.script.extend(events);
        self
    }
}

impl Deref for TestTui {
    type Target = ratatui::Terminal<TestBackend>;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl DerefMut for TestTui {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}

#[cfg(test)]
impl TuiEnum {
    pub fn backend(&self) -> &TestBackend {
        match self {
            TuiEnum::Crossterm(_) => panic!("Not a test backend"),
            TuiEnum::Test(tui) => tui.backend(),
        }
    }
}

#[cfg(test)]
mod test {
    use crossterm::event::{KeyEventState, MouseEvent, MouseEventKind};

    use super::*;

    #[test]
    fn translate_keeps_presses_only() {
        let press = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(
            translate(CrosstermEvent::Key(press)),
            Some(Event::Key(press))
        );

        let release = KeyEvent::new_with_kind_and_state(
            KeyCode::Char('a'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );
        assert_eq!(translate(CrosstermEvent::Key(release)), None);

        let mouse = MouseEvent {
            kind: MouseEventKind::Moved,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(translate(CrosstermEvent::Mouse(mouse)), None);
    }

    #[test]
    fn translate_passes_paste_and_resize() {
        assert_eq!(
            translate(CrosstermEvent::Paste("FF".into())),
            Some(Event::Paste("FF".into()))
        );
        assert_eq!(
            translate(CrosstermEvent::Resize(80, 24)),
            Some(Event::Resize(80, 24))
        );
        assert_eq!(translate(CrosstermEvent::FocusLost), Some(Event::FocusLost));
    }

    #[tokio::test]
    async fn scripted_events_then_error() {
        let mut tui: TuiEnum = TestTui::new(10, 2).script([Event::Tick, 'q'.into()]).into();
        assert_eq!(tui.next().await.unwrap(), Event::Tick);
        assert_eq!(tui.next().await.unwrap(), Event::from('q'));
        assert_eq!(tui.next().await.unwrap(), Event::Error);
    }
}
