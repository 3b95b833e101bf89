use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;

use notes_backend::autosave::spawn_autosave;
use notes_backend::config::Config;
use notes_backend::controllers;
use notes_backend::db::SqliteStateStore;
use notes_backend::gateway;
use notes_backend::models::NotesConfig;
use notes_backend::service::NotesService;
use notes_backend::workspace::Workspace;
use notes_backend::AppState;

/// Upper bound on request bodies; imports carry the whole note set
const MAX_PAYLOAD_BYTES: usize = 32 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    log::info!("Starting notes backend on port {}", config.port);

    std::fs::create_dir_all(&config.data_dir)?;

    let notes_config = NotesConfig::load(&config.notes_config_path());
    log::info!(
        "Autosave delay {}ms, title boost {}, content boost {}",
        notes_config.autosave_delay_ms,
        notes_config.title_boost,
        notes_config.content_boost
    );

    let db_path = config.db_path();
    log::info!("Opening state store at {}", db_path.display());
    let store = SqliteStateStore::open(&db_path, &notes_config.store_key)
        .map_err(|e| std::io::Error::other(format!("Failed to open {}: {}", db_path.display(), e)))?;

    let workspace = Workspace::open(Box::new(store), notes_config)
        .map_err(|e| std::io::Error::other(format!("Failed to load notes: {}", e)))?;
    let notes = NotesService::new(workspace);
    let autosave_task = spawn_autosave(notes.clone());

    let frontend_dist = config.frontend_dist.clone();
    if let Some(dist) = &frontend_dist {
        log::info!("Serving frontend from: {}", dist.display());
    }

    let state = AppState::new(notes.clone(), config.clone());

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let mut app = App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .app_data(web::JsonConfig::default().limit(MAX_PAYLOAD_BYTES))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::notes::config)
            .configure(controllers::state::config)
            .route("/ws", web::get().to(gateway::ws::ws_handler));

        // Serve static files only if a frontend dist is configured
        if let Some(dist) = &frontend_dist {
            let index = dist.join("index.html");
            app = app.service(
                Files::new("/", dist.clone())
                    .index_file("index.html")
                    .default_handler(web::to(move || {
                        let index = index.clone();
                        async move { NamedFile::open_async(index).await }
                    })),
            );
        }

        app
    })
    .bind(("0.0.0.0", config.port))?
    .run();

    // Get server handle for graceful shutdown
    let server_handle = server.handle();

    // actix stops the server itself on SIGINT/SIGTERM/SIGQUIT; this only
    // bounds how long a Ctrl+C stop may take
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        log::info!("Received Ctrl+C, shutting down...");

        log::info!("Stopping HTTP server...");
        let server_stop = server_handle.stop(true);
        if tokio::time::timeout(std::time::Duration::from_secs(5), server_stop).await.is_err() {
            log::warn!("Timeout waiting for HTTP server to stop, forcing exit...");
        }
    });

    let result = server.await;

    // Every exit path ends here: pending edits must reach the store
    autosave_task.abort();
    notes.shutdown();
    log::info!("Shutdown complete");

    result
}
