//! Light/dark theme resolution and persistence.
//!
//! [`ThemeContext`] is owned by the root state and hands a [`Palette`] to the
//! layers. The theme at start-up is the first available of: an explicit
//! override, the saved preference, the terminal's background hint, `light`.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use color_eyre::{Result, eyre::Context};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{info, warn};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Icon of the theme a toggle would switch to.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            Theme::Light => "☾",
            Theme::Dark => "☀",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                fg: Color::Black,
                bg: Color::White,
                accent: Color::Blue,
                editing: Color::Magenta,
                muted: Color::Gray,
                border: Color::DarkGray,
                star_on: Color::Yellow,
                star_off: Color::Gray,
                danger: Color::Red,
            },
            Theme::Dark => Palette {
                fg: Color::White,
                bg: Color::Black,
                accent: Color::Cyan,
                editing: Color::Yellow,
                muted: Color::DarkGray,
                border: Color::Gray,
                star_on: Color::Yellow,
                star_off: Color::DarkGray,
                danger: Color::LightRed,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    /// Focused widgets
    pub accent: Color,
    /// Widgets receiving text input
    pub editing: Color,
    /// Disabled controls and hints
    pub muted: Color,
    pub border: Color,
    pub star_on: Color,
    pub star_off: Color,
    pub danger: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Theme::default().palette()
    }
}

/// Where the theme preference lives between runs.
pub trait ThemeStore: Send + Sync {
    fn load(&self) -> Result<Option<Theme>>;
    fn save(&self, theme: Theme) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct ThemeFile {
    theme: Theme,
}

/// Stores the preference as `{"theme": "dark"}` in a JSON file.
#[derive(Clone, Debug)]
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThemeStore for FileThemeStore {
    fn load(&self) -> Result<Option<Theme>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Error reading {}", self.path.display()))?;
        let file: ThemeFile = serde_json::from_str(&content)
            .with_context(|| format!("Error parsing {}", self.path.display()))?;
        Ok(Some(file.theme))
    }

    fn save(&self, theme: Theme) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Error creating {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&ThemeFile { theme })?;
        fs::write(&self.path, content)
            .with_context(|| format!("Error writing {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Error removing {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// Guess the terminal background from `COLORFGBG` (`"<fg>;<bg>"`).
///
/// Background colours 7 and 9-15 are light, the rest of the 16-colour range dark.
pub fn system_preference() -> Option<Theme> {
    let value = env::var("COLORFGBG").ok()?;
    let bg = value.rsplit(';').next()?.trim().parse::<u8>().ok()?;
    match bg {
        7 | 9..=15 => Some(Theme::Light),
        0..=6 | 8 => Some(Theme::Dark),
        _ => None,
    }
}

pub struct ThemeContext {
    theme: Theme,
    store: Box<dyn ThemeStore>,
}

impl ThemeContext {
    pub fn resolve(store: Box<dyn ThemeStore>, override_theme: Option<Theme>) -> Self {
        let saved = || match store.load() {
            Ok(theme) => theme,
            Err(err) => {
                warn!("Ignoring unreadable theme preference: {:?}", err);
                None
            }
        };
        let theme = override_theme
            .or_else(saved)
            .or_else(system_preference)
            .unwrap_or_default();
        info!("Resolved theme {}", theme);
        Self { theme, store }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn palette(&self) -> Palette {
        self.theme.palette()
    }

    /// Flip the theme and persist it. A failed save only costs the preference.
    pub fn toggle(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Err(err) = self.store.save(self.theme) {
            warn!("Unable to save theme preference: {:?}", err);
        }
        info!("Switched to {} theme", self.theme);
        self.theme
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// In-memory store; clones share the saved value.
    #[derive(Clone, Default)]
    pub(crate) struct MemoryThemeStore {
        saved: Arc<Mutex<Option<Theme>>>,
    }

    impl MemoryThemeStore {
        pub(crate) fn with(theme: Theme) -> Self {
            Self {
                saved: Arc::new(Mutex::new(Some(theme))),
            }
        }

        pub(crate) fn saved(&self) -> Option<Theme> {
            *self.saved.lock().unwrap()
        }
    }

    impl ThemeStore for MemoryThemeStore {
        fn load(&self) -> Result<Option<Theme>> {
            Ok(self.saved())
        }
        fn save(&self, theme: Theme) -> Result<()> {
            *self.saved.lock().unwrap() = Some(theme);
            Ok(())
        }
        fn clear(&self) -> Result<()> {
            *self.saved.lock().unwrap() = None;
            Ok(())
        }
    }
}
