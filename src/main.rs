// src/main.rs
use actix_web::{App, HttpServer, middleware, web};
use anyhow::Context;
use log::info;

use plating::AppState;
use plating::config::Config;
use plating::handlers::routes;
use plating::services::ImageProcessor;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting Plating service...");

    let config = Config::from_env().context("Failed to load configuration")?;
    let app_state = AppState::new(ImageProcessor::new(&config));

    info!("Starting HTTP server on {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind(&config.bind_addr)
    .with_context(|| format!("Failed to bind {}", config.bind_addr))?
    .run()
    .await
    .context("HTTP server error")
}
