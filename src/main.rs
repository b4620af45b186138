mod actions;
mod app;
mod cli;
mod component;
mod config;
mod libs;
mod page;
mod tui;
mod utils;

use app::{App, RootState};
use clap::Parser;
use color_eyre::eyre::Result;
use dotenv::dotenv;

#[cfg(not(tarpaulin_include))]
async fn run() -> Result<()> {
    use cli::{ClapSource, Commands};
    use color_eyre::eyre::Context;
    use libs::theme::{FileThemeStore, ThemeStore};

    let args = cli::Cli::parse();

    if let Some(Commands::Convert {
        text,
        from,
        to,
        scientific,
    }) = &args.command
    {
        println!("{}", cli::convert(text, *from, *to, *scientific)?);
        return Ok(());
    }

    let config =
        config::Config::new(Some(ClapSource::new(&args))).context("Error when loading config")?;
    utils::logging::init(&config.config.data_dir)?;

    if let Some(Commands::ResetTheme) = &args.command {
        let store = FileThemeStore::new(config.config.theme_path());
        store.clear().context("Error when removing theme preference")?;
        println!("Theme preference removed from {}", store.path().display());
        return Ok(());
    }

    let state = RootState::new(config);
    let mut app = App::new(
        state,
        tui::Tui::new()?
            .tick_rate(args.tick_rate)
            .frame_rate(args.frame_rate)
            .paste(true)
            .into(),
    )?;

    app.run().await?;
    Ok(())
}

#[tokio::main]
#[cfg(not(tarpaulin_include))]
async fn main() -> Result<()> {
    dotenv().ok();
    utils::errors::init()?;

    run().await
}
