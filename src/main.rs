use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use servicelog::{
    App, Cli, Config, LogReminders, NoopReminders, ReminderScheduler, Result, ServiceBook, Storage,
};

pub fn initialize_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let storage = Storage::open(&config.data_dir)?;
    let reminders: Arc<dyn ReminderScheduler> = if config.reminders_enabled {
        Arc::new(LogReminders::new())
    } else {
        Arc::new(NoopReminders)
    };
    let book = ServiceBook::new(storage, reminders, config.reminder_hour);

    let mut app = App::new(book, config, config_path, cli.verbose);
    app.run(cli.command).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!("Application shutting down");
}
