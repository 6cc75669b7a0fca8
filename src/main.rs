use clap::Parser;
use log::{error, info, LevelFilter};

use notebooks::{App, Cli, Config, JsonFileStorage, NotebookStore, VoiceInput};

pub fn initialize_logger(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

#[tokio::main(flavor = "current_thread")]
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

async fn run(cli: Cli) -> notebooks::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let storage = JsonFileStorage::new(&config.data_dir);
    let mut store = NotebookStore::new(storage, config.persist_policy());
    store.load();

    let mut app = App::new(
        store,
        config,
        cli.config,
        VoiceInput::unavailable(),
        cli.verbose,
    );
    app.run(cli.command).await
}
