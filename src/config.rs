use std::{env, path::PathBuf};

use color_eyre::{Result, eyre::Context};
use directories::ProjectDirs;
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::libs::{
    numeric::{FormatMode, NumberConfig, NumberConfigError, Variant},
    theme::Theme,
};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default)]
    theme_file: PathBuf,

    /// Theme for this session; the saved preference is used when absent
    #[serde(default)]
    pub theme: Option<Theme>,
}

impl AppConfig {
    /// Where the theme preference is stored
    pub fn theme_path(&self) -> PathBuf {
        self.data_dir.join(&self.theme_file)
    }
}

/// What the demo page shows.
#[derive(Clone, Debug, Deserialize)]
pub struct GalleryConfig {
    /// One numeric input per base, all bound to the same value
    #[serde(default = "default_bases")]
    pub bases: Vec<u32>,
    /// Add a numeric input in scientific notation after the radix ones
    #[serde(default = "default_true")]
    pub scientific_field: bool,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default)]
    pub variant: Variant,
    /// Show the `base N` hint on the radix inputs
    #[serde(default = "default_true")]
    pub show_base: bool,
    #[serde(default = "default_tags")]
    pub suggested_tags: Vec<String>,
    /// Offer tags the user typed as suggestions afterwards
    #[serde(default = "default_true")]
    pub remember_custom_tags: bool,
    /// Granularity of the star rating
    #[serde(default = "default_rating_step")]
    pub rating_step: f64,
}

fn default_bases() -> Vec<u32> {
    vec![10, 2, 16, 21, 36]
}
fn default_true() -> bool {
    true
}
fn default_step() -> f64 {
    1.0
}
fn default_rating_step() -> f64 {
    0.1
}
fn default_tags() -> Vec<String> {
    vec!["hello".into(), "world".into(), "random".into()]
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            bases: default_bases(),
            scientific_field: default_true(),
            min: None,
            max: None,
            step: default_step(),
            variant: Variant::default(),
            show_base: default_true(),
            suggested_tags: default_tags(),
            remember_custom_tags: default_true(),
            rating_step: default_rating_step(),
        }
    }
}

impl GalleryConfig {
    /// Configurations of the numeric inputs, in display order.
    pub fn number_configs(&self) -> Result<Vec<NumberConfig>, NumberConfigError> {
        let mut base = NumberConfig::default()
            .with_step(self.step)
            .with_variant(self.variant)
            .with_show_base(self.show_base);
        if let Some(min) = self.min {
            base = base.with_min(min);
        }
        if let Some(max) = self.max {
            base = base.with_max(max);
        }
        let mut configs: Vec<NumberConfig> = self
            .bases
            .iter()
            .map(|&radix| base.clone().with_base(radix))
            .collect();
        if self.scientific_field {
            configs.push(base.with_format_mode(FormatMode::Scientific));
        }
        for config in &configs {
            config.validate()?;
        }
        Ok(configs)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
}

impl Config {
    /// Defaults, then `<data dir>/config.*` if present, then the command line.
    pub fn new(cli_source: Option<crate::cli::ClapSource>) -> Result<Self> {
        let data_dir = cli_source
            .as_ref()
            .and_then(|cli| cli.data_dir.clone())
            .map(PathBuf::from)
            .unwrap_or_else(get_data_dir);
        let config_file = data_dir.join("config");

        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .set_default("theme_file", "theme.json")?
            .add_source(config::File::with_name(&config_file.to_string_lossy()).required(false));

        // CLI last, highest priority
        if let Some(cli_source) = cli_source {
            builder = builder.add_source(cli_source);
        }

        let cfg: Self = builder
            .build()
            .context("Error building config")?
            .try_deserialize()
            .context("Error deserialize config")?;

        Ok(cfg)
    }
}

pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = env::var(format!("{}_DATA", PROJECT_NAME.clone()))
        .ok()
        .map(PathBuf::from)
    {
        dir
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "yyang", env!("CARGO_PKG_NAME"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::tempdir;

    use super::*;
    use crate::cli::{ClapSource, Cli};

    #[test]
    fn data_dir_from_env() {
        let temp_data = tempdir().unwrap();

        temp_env::with_vars(
            [(
                format!("{}_DATA", PROJECT_NAME.clone()).as_str(),
                Some(temp_data.path().to_str().unwrap()),
            )],
            || {
                let config = Config::new(None).unwrap();
                assert_eq!(config.config.data_dir, temp_data.path());
                assert_eq!(
                    config.config.theme_path(),
                    temp_data.path().join("theme.json")
                );
                assert_eq!(config.config.theme, None);
            },
        );
    }

    #[test]
    fn data_dir_from_cli() {
        let args = Cli::parse_from(["test-config", "--data-dir", ".cli-data"]);
        let config = Config::new(Some(ClapSource::new(&args))).expect("Failed to load config");

        assert_eq!(config.config.data_dir, PathBuf::from(".cli-data"));
    }

    #[test]
    fn theme_from_cli() {
        let args = Cli::parse_from(["test-config", "--theme", "dark"]);
        let config = Config::new(Some(ClapSource::new(&args))).expect("Failed to load config");

        assert_eq!(config.config.theme, Some(Theme::Dark));
    }

    #[test]
    fn gallery_defaults() {
        let temp_data = tempdir().unwrap();
        let args = Cli::parse_from([
            "test-config",
            "--data-dir",
            temp_data.path().to_str().unwrap(),
        ]);
        let config = Config::new(Some(ClapSource::new(&args))).unwrap();

        assert_eq!(config.gallery.bases, vec![10, 2, 16, 21, 36]);
        assert_eq!(config.gallery.suggested_tags, vec!["hello", "world", "random"]);
        let numbers = config.gallery.number_configs().unwrap();
        assert_eq!(numbers.len(), 6);
        assert_eq!(numbers[2].base, 16);
        assert_eq!(numbers[5].format_mode, FormatMode::Scientific);
    }

    #[test]
    fn gallery_from_config_file() {
        let temp_data = tempdir().unwrap();
        std::fs::write(
            temp_data.path().join("config.toml"),
            "[gallery]\nbases = [8, 16]\nscientific_field = false\nmin = 0.0\nmax = 255.0\nvariant = \"outline\"\n",
        )
        .unwrap();
        let args = Cli::parse_from([
            "test-config",
            "--data-dir",
            temp_data.path().to_str().unwrap(),
        ]);
        let config = Config::new(Some(ClapSource::new(&args))).unwrap();

        let numbers = config.gallery.number_configs().unwrap();
        assert_eq!(numbers.len(), 2);
        assert_eq!(numbers[0].base, 8);
        assert_eq!(numbers[1].max, Some(255.0));
        assert_eq!(numbers[1].variant, Variant::Outline);
        assert_eq!(numbers[1].min, Some(0.0));
        assert!(numbers[1].show_base);
        assert!(config.gallery.remember_custom_tags);
        assert_eq!(config.gallery.rating_step, 0.1);
    }

    #[test]
    fn invalid_base_is_rejected() {
        let gallery = GalleryConfig {
            bases: vec![10, 40],
            ..Default::default()
        };
        assert_eq!(
            gallery.number_configs().unwrap_err(),
            NumberConfigError::InvalidBase(40)
        );
    }
}
