use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};
use config::Source;

use crate::{
    config::get_data_dir,
    libs::{
        numeric::{FormatMode, NumberConfig},
        theme::Theme,
    },
};

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Tick rate, i.e. number of ticks per second
    #[arg(short, long, value_name = "FLOAT", default_value_t = 4.0)]
    pub tick_rate: f64,

    /// Frame rate, i.e. number of frames per second
    #[arg(short, long, value_name = "FLOAT", default_value_t = 60.0)]
    pub frame_rate: f64,

    /// Path to the data directory
    #[arg(short, long, value_name = "PATH")]
    pub data_dir: Option<String>,

    /// Use this theme instead of the saved preference (light or dark)
    #[arg(long, value_name = "THEME")]
    pub theme: Option<Theme>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a number between bases without starting the UI
    Convert {
        /// The number, written in the base given by --from
        #[arg(allow_hyphen_values = true)]
        text: String,
        /// Base of the input, 2 to 36
        #[arg(long, default_value_t = 10)]
        from: u32,
        /// Base of the output, 2 to 36
        #[arg(long, default_value_t = 16)]
        to: u32,
        /// Print the result in exponential notation instead of in --to
        #[arg(long)]
        scientific: bool,
    },
    /// Forget the saved theme preference
    ResetTheme,
}

const VERSION_MESSAGE: &str = concat!(env!("CARGO_PKG_VERSION"));

pub fn version() -> String {
    let author = clap::crate_authors!();
    let data_dir_path = get_data_dir().display().to_string();

    format!(
        "\
{VERSION_MESSAGE}

Authors: {author}

Data directory: {data_dir_path}"
    )
}

/// Parse `text` in base `from` and format it in base `to` (or scientific).
pub fn convert(text: &str, from: u32, to: u32, scientific: bool) -> Result<String> {
    let source = NumberConfig::default().with_base(from);
    source.validate().context("Invalid --from")?;
    let target = if scientific {
        NumberConfig::default().with_format_mode(FormatMode::Scientific)
    } else {
        NumberConfig::default().with_base(to)
    };
    target.validate().context("Invalid --to")?;

    let value = source
        .parse(&text.trim().to_uppercase())
        .with_context(|| format!("Unable to read '{text}' as a base {from} number"))?;
    Ok(target.format(value))
}

#[derive(Debug)]
pub(crate) struct ClapSource {
    pub data_dir: Option<String>,
    pub theme: Option<Theme>,
}

impl ClapSource {
    pub fn new(cli: &Cli) -> Self {
        Self {
            data_dir: cli.data_dir.clone(),
            theme: cli.theme,
        }
    }
}

impl Source for ClapSource {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(Self {
            data_dir: self.data_dir.clone(),
            theme: self.theme,
        })
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        let mut map = config::Map::new();
        if let Some(data_dir) = &self.data_dir {
            map.insert(
                "data_dir".to_string(),
                config::Value::new(None, data_dir.clone()),
            );
        }
        if let Some(theme) = self.theme {
            map.insert(
                "theme".to_string(),
                config::Value::new(None, theme.to_string()),
            );
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_between_bases() {
        assert_eq!(convert("255", 10, 16, false).unwrap(), "FF");
        assert_eq!(convert("ff", 16, 2, false).unwrap(), "11111111");
        assert_eq!(convert("-z", 36, 10, false).unwrap(), "-35");
        assert_eq!(convert("1500", 10, 16, true).unwrap(), "1.5e+3");
        assert_eq!(convert("ff.8", 16, 10, false).unwrap(), "255.5");
        assert_eq!(convert("0.1", 10, 2, false).unwrap().len(), 57);
    }

    #[test]
    fn convert_rejects_bad_input() {
        assert!(convert("12", 1, 10, false).is_err());
        assert!(convert("12", 10, 37, false).is_err());
        assert!(convert("19", 8, 10, false).is_err());
        assert!(convert("", 10, 10, false).is_err());
        assert!(convert(&"9".repeat(400), 10, 16, false).is_err());
    }

    #[test]
    fn parse_convert_command() {
        let cli = Cli::parse_from(["radix_widgets", "convert", "-FF", "--from", "16", "--to", "10"]);
        match cli.command {
            Some(Commands::Convert { text, from, to, scientific }) => {
                assert_eq!(text, "-FF");
                assert_eq!((from, to, scientific), (16, 10, false));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
