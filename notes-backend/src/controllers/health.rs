use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let (notes, autosave_pending, persistence_error) = state.notes.with(|ws| {
        (
            ws.current_list().len(),
            ws.autosave_pending(),
            ws.persistence_error().map(str::to_string),
        )
    });

    HttpResponse::Ok().json(serde_json::json!({
        "status": if persistence_error.is_some() { "degraded" } else { "ok" },
        "version": VERSION,
        "notes": notes,
        "autosave_pending": autosave_pending,
        "persistence_error": persistence_error,
        "uptime_secs": state.started_at.elapsed().as_secs()
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_reports_ok() {
        let (state, _store) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(config_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], VERSION);
        assert_eq!(body["notes"], 0);
    }
}
