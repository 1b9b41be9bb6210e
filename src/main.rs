mod analyzer;
mod api;
mod database;
mod filter;
mod semantic_parsing;
mod settings;
mod web;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::{
    database::Database,
    settings::{Args, Settings},
    web::Tls,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings =
        Settings::from_file(args.config.as_deref()).context("Problem while loading settings.")?;

    tracing_subscriber::fmt()
        .with_max_level(settings.log.level)
        .init();

    let database = Database::connect(&settings.database.path)
        .context("Problem while Connect Sled Database.")?;
    info!("Opened database at {}", settings.database.path.display());

    let tls = args.cert.zip(args.key).map(|(cert, key)| Tls { cert, key });
    web::serve(database.clone(), settings.web.address, tls).await?;

    database
        .flush()
        .context("Problem while flushing the database.")?;
    info!("Server stopped");
    Ok(())
}
