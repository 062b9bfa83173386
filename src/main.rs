use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod attendance;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod face;
mod model;
mod models;
mod routes;
mod utils;

use attendance::{MySqlAttendanceStore, MySqlEmployeeDirectory};
use config::Config;
use db::init_db;
use face::FaceClient;

use crate::docs::ApiDoc;
use serde_json::json;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health(face: Data<FaceClient>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "face_verification": face.is_enabled(),
    }))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let face = FaceClient::new(config.face_api.clone()).context("Failed to build face API client")?;
    if face.is_enabled() {
        info!(base_url = %config.face_api.base_url, "Face verification enabled");
    } else {
        warn!("Face verification is disabled, attendance actions will be rejected");
    }

    // shared across workers so the identity cache is process-wide
    let face = Data::new(face);
    let store = Data::new(MySqlAttendanceStore::new(pool.clone()));
    let directory = Data::new(MySqlEmployeeDirectory::new(
        pool,
        config.identity_cache_ttl,
    ));

    let server_addr = config.server_addr.clone();
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config.clone())
            .app_data(face.clone())
            .app_data(store.clone())
            .app_data(directory.clone())
            .service(health)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
