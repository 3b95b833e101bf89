pub mod health;
pub mod notes;
pub mod state;

use actix_web::HttpResponse;
use notes_types::RpcResponse;
use serde::Serialize;

use crate::error::NotesError;

/// `200` with `data`, carrying the last persistence failure if there is one
pub(crate) fn ok_response<T: Serialize>(data: T, persistence_error: Option<String>) -> HttpResponse {
    HttpResponse::Ok().json(RpcResponse::ok(data).with_persistence_error(persistence_error))
}

pub(crate) fn error_response(err: &NotesError) -> HttpResponse {
    let body = RpcResponse::<()>::err(err.to_string());
    match err {
        NotesError::MalformedImport(_) | NotesError::SearchQueryError(_) => {
            HttpResponse::BadRequest().json(body)
        }
        NotesError::NoteNotFound(_) => HttpResponse::NotFound().json(body),
        NotesError::PersistenceWriteFailure(_)
        | NotesError::Storage(_)
        | NotesError::Serialization(_) => {
            log::error!("[API] {}", err);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

/// `409` for a destructive action sent without `confirm=true`
pub(crate) fn confirmation_required(action: &str) -> HttpResponse {
    HttpResponse::Conflict().json(RpcResponse::<()>::err(format!(
        "{} requires confirmation (confirm=true)",
        action
    )))
}
