use std::path::Path;

use color_eyre::Result;
use lazy_static::lazy_static;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::PROJECT_NAME;

lazy_static! {
    pub static ref LOG_ENV: String = format!("{}_LOGLEVEL", PROJECT_NAME.clone());
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

/// Log to `<data_dir>/radix_widgets.log`; the terminal belongs to the UI.
///
/// `data_dir` is the resolved one, so `--data-dir` and the config file move
/// the log along with the theme preference. The filter comes from
/// `RUST_LOG`, then `RADIX_WIDGETS_LOGLEVEL`, and defaults to `info`.
pub fn init(data_dir: &Path) -> Result<()> {
    let log_file = create_log_file(data_dir)?;

    let env_filter = EnvFilter::builder().with_default_directive(tracing::Level::INFO.into());
    let env_filter = env_filter
        .try_from_env()
        .or_else(|_| env_filter.with_env_var(LOG_ENV.clone()).from_env())?;

    let file_subscriber = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .try_init()?;
    Ok(())
}

fn create_log_file(data_dir: &Path) -> Result<std::fs::File> {
    std::fs::create_dir_all(data_dir)?;
    Ok(std::fs::File::create(data_dir.join(LOG_FILE.as_str()))?)
}
