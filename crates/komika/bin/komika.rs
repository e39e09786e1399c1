#[macro_use]
extern crate log;

use clap::Parser;
use komika::{
    application::shelf::Shelf,
    infrastructure::{config::Config, database::Database},
    presentation::cli::{self, Command},
};

#[derive(Parser)]
#[clap(version, about = "Read comics from a remote catalog and keep your library offline")]
struct Opts {
    /// Path to config file
    #[clap(long)]
    config: Option<String>,
    #[clap(subcommand)]
    subcmd: Command,
}

fn init_logger() {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        if let Ok(komika_log) = std::env::var("KOMIKA_LOG") {
            builder.parse_filters(&format!("komika={komika_log},komika_lib={komika_log}"));
        }
    }
    builder.init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logger();

    info!(
        "komika v{} (models v{})",
        env!("CARGO_PKG_VERSION"),
        komika_lib::LIB_VERSION
    );

    let opts: Opts = Opts::parse();
    let config = Config::open(opts.config)?;

    debug!("config: {:?}", config);

    let db = Database::new(&config.database_path, config.create_database);
    let pool = db.open().await?;
    let shelf = Shelf::new(pool);

    let res = cli::run(opts.subcmd, &config, &shelf).await;
    if let Err(e) = &res {
        error!("{e:#}");
    }

    db.close().await;

    res
}
