mod config;
mod db;
mod errors;
mod handlers;
mod intake;
mod models;
mod utils;

use std::io;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;

use crate::config::{AppConfig, StoreKind};
use crate::db::{FileStore, MemoryFileStore, PgFileStore};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let store: Arc<dyn FileStore> = match config.store {
        StoreKind::Postgres => {
            let database_url = config.database_url.as_deref().unwrap_or_default();
            let pool = db::create_pool(database_url)
                .await
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
            Arc::new(PgFileStore::new(pool))
        }
        StoreKind::Memory => Arc::new(MemoryFileStore::new()),
    };

    info!(
        "Starting server at {} ({:?} store, limit {} bytes, extensions {})",
        config.bind_address,
        config.store,
        config.policy.max_size_bytes,
        config.policy.permitted_extensions().join(", ")
    );

    let store = web::Data::from(store);
    let policy = web::Data::new(config.policy.clone());

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .app_data(policy.clone())
            .configure(handlers::config)
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
