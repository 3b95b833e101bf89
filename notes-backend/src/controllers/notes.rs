//! Notes REST API: list, search, create, edit, select, favorite and delete.
//!
//! Edits go through the debounced autosave; every other mutation is saved
//! before the response is sent.

use actix_web::{web, HttpResponse, Responder};
use notes_types::{ConfirmQuery, EditRequest, Note, NoteId, SearchQuery};
use serde::Serialize;

use super::{confirmation_required, error_response, ok_response};
use crate::error::NotesError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteListResponse {
    notes: Vec<Note>,
    active_note_id: Option<NoteId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    query: String,
    notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    deleted: NoteId,
}

#[derive(Debug, Serialize)]
struct FavoriteResponse {
    id: NoteId,
    favorite: bool,
}

/// Notes in display order (most recently updated first)
async fn list_notes(data: web::Data<AppState>) -> impl Responder {
    let (list, err) = data.notes.with(|ws| {
        let list = NoteListResponse {
            notes: ws.current_list(),
            active_note_id: ws.active_note().map(|n| n.id),
        };
        (list, ws.persistence_error().map(str::to_string))
    });
    ok_response(list, err)
}

async fn active_note(data: web::Data<AppState>) -> impl Responder {
    let (active, err) = data
        .notes
        .with(|ws| (ws.active_note(), ws.persistence_error().map(str::to_string)));
    ok_response(active, err)
}

/// Ranked search. A blank or unparsable query returns the whole list.
async fn search_notes(data: web::Data<AppState>, query: web::Query<SearchQuery>) -> impl Responder {
    let q = query.into_inner().q;
    let (notes, err) = data
        .notes
        .with(|ws| (ws.search_results(&q), ws.persistence_error().map(str::to_string)));
    ok_response(SearchResponse { query: q, notes }, err)
}

async fn create_note(data: web::Data<AppState>) -> impl Responder {
    let (note, err) = data
        .notes
        .with(|ws| (ws.create(), ws.persistence_error().map(str::to_string)));
    log::info!("[NOTES] Created {}", note.id);
    ok_response(note, err)
}

async fn get_note(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    let (note, err) = data
        .notes
        .with(|ws| (ws.find(&id), ws.persistence_error().map(str::to_string)));
    match note {
        Some(note) => ok_response(note, err),
        None => error_response(&NotesError::NoteNotFound(id)),
    }
}

/// Title or content change from the editor
async fn edit_note(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<EditRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let EditRequest { field, value } = body.into_inner();
    match data.notes.edit(&id, field, &value) {
        Ok(result) => {
            let err = data.notes.with(|ws| ws.persistence_error().map(str::to_string));
            ok_response(result, err)
        }
        Err(e) => error_response(&e),
    }
}

async fn select_note(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    let (selected, err) = data
        .notes
        .with(|ws| (ws.select(&id), ws.persistence_error().map(str::to_string)));
    match selected {
        Some(note) => ok_response(note, err),
        None => error_response(&NotesError::NoteNotFound(id)),
    }
}

async fn toggle_favorite(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    let result = data.notes.with(|ws| {
        ws.toggle_favorite(&id)
            .map(|favorite| (favorite, ws.persistence_error().map(str::to_string)))
    });
    match result {
        Ok((favorite, err)) => ok_response(FavoriteResponse { id, favorite }, err),
        Err(e) => error_response(&e),
    }
}

/// Requires `?confirm=true`; the UI asks the user before sending it.
async fn delete_note(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ConfirmQuery>,
) -> impl Responder {
    let id = path.into_inner();
    if !query.confirm {
        return confirmation_required("Deleting a note");
    }

    let (deleted, err) = data
        .notes
        .with(|ws| (ws.delete(&id), ws.persistence_error().map(str::to_string)));
    if deleted {
        ok_response(DeleteResponse { deleted: id }, err)
    } else {
        error_response(&NotesError::NoteNotFound(id))
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/notes")
            .route("", web::get().to(list_notes))
            .route("", web::post().to(create_note))
            .route("/active", web::get().to(active_note))
            .route("/search", web::get().to(search_notes))
            .route("/{id}", web::get().to(get_note))
            .route("/{id}", web::put().to(edit_note))
            .route("/{id}", web::delete().to(delete_note))
            .route("/{id}/select", web::post().to(select_note))
            .route("/{id}/favorite", web::post().to(toggle_favorite)),
    );
}
