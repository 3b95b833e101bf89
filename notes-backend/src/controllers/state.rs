//! Backup export/import and UI preferences.

use actix_web::http::header::{ContentDisposition, ContentType};
use actix_web::{web, HttpResponse, Responder};
use notes_types::{ConfirmQuery, Prefs};
use serde::Serialize;

use super::{confirmation_required, error_response, ok_response};
use crate::notes::backup;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleResponse {
    prefs: Prefs,
}

/// Download the whole state as `markdown-notes-backup-<millis>.json`
async fn export_state(data: web::Data<AppState>) -> impl Responder {
    match data.notes.with(|ws| ws.export()) {
        Ok(doc) => {
            log::info!("[BACKUP] Exported {}", doc.file_name);
            HttpResponse::Ok()
                .insert_header(ContentType::json())
                .insert_header(ContentDisposition::attachment(doc.file_name))
                .body(doc.body)
        }
        Err(e) => error_response(&e),
    }
}

/// Replace everything with an uploaded backup. The document is validated
/// first; a valid one is only applied with `?confirm=true`.
async fn import_state(
    data: web::Data<AppState>,
    query: web::Query<ConfirmQuery>,
    body: String,
) -> impl Responder {
    let state = match backup::parse_import(&body) {
        Ok(state) => state,
        Err(e) => {
            log::warn!("[BACKUP] Rejected import: {}", e);
            return error_response(&e);
        }
    };

    if !query.confirm {
        return confirmation_required("Importing a backup");
    }

    let (result, err) = data.notes.with(|ws| {
        let result = ws.replace_state(state);
        (result, ws.persistence_error().map(str::to_string))
    });
    ok_response(result, err)
}

async fn get_prefs(data: web::Data<AppState>) -> impl Responder {
    let (prefs, err) = data
        .notes
        .with(|ws| (ws.prefs(), ws.persistence_error().map(str::to_string)));
    ok_response(prefs, err)
}

async fn toggle_theme(data: web::Data<AppState>) -> impl Responder {
    let (prefs, err) = data.notes.with(|ws| {
        ws.toggle_theme();
        (ws.prefs(), ws.persistence_error().map(str::to_string))
    });
    ok_response(ToggleResponse { prefs }, err)
}

async fn toggle_sidebar(data: web::Data<AppState>) -> impl Responder {
    let (prefs, err) = data.notes.with(|ws| {
        ws.toggle_sidebar();
        (ws.prefs(), ws.persistence_error().map(str::to_string))
    });
    ok_response(ToggleResponse { prefs }, err)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/state")
            .route("/export", web::get().to(export_state))
            .route("/import", web::post().to(import_state)),
    );
    cfg.service(
        web::scope("/api/prefs")
            .route("", web::get().to(get_prefs))
            .route("/theme/toggle", web::post().to(toggle_theme))
            .route("/sidebar/toggle", web::post().to(toggle_sidebar)),
    );
}
