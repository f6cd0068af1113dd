// src/main.rs
use actix_files::Files; // Static file service for the browser UI
use actix_web::{middleware::Logger, web, App, HttpServer}; // HTTP server plumbing
use clap::Parser; // Command-line and environment configuration
use double_pendulum_sim::{config::Config, ui}; // Library crate: settings and request handlers
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    let bind_addr = config.bind_addr();
    let static_dir = config.static_dir.clone();
    info!(host = %bind_addr.0, port = bind_addr.1, static_dir = %static_dir.display(), "starting server");

    let data = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(data.clone())
            .app_data(web::JsonConfig::default().limit(64 * 1024))
            .configure(ui::configure)
            // Mounted last so the API scope takes precedence over "/"
            .service(Files::new("/", static_dir.clone()).index_file("index.html"))
    })
    .bind(bind_addr)?
    .run()
    .await
}
