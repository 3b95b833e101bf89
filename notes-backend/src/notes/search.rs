//! SearchIndex: FTS5 trigram table over note titles and bodies
//!
//! A derived cache. It lives in a private in-memory SQLite database, is
//! rebuilt from scratch from the repository snapshot, and only ever answers
//! with note ids that the caller resolves against the repository.
//!
//! Text and terms are lowercased in Rust before they reach SQLite, whose
//! `LIKE` only folds ASCII. Every match is returned; there is no cap.

use notes_types::{Note, NoteId};
use rusqlite::{params, params_from_iter, Connection};

use super::query::{Clause, FieldScope, ParsedQuery, Presence};
use crate::error::NotesResult;

pub struct SearchIndex {
    conn: Connection,
    title_boost: f64,
    content_boost: f64,
    indexed: usize,
}

impl SearchIndex {
    pub fn new(title_boost: f64, content_boost: f64) -> NotesResult<Self> {
        let conn = Connection::open_in_memory()?;

        // Trigram tokens let LIKE '%term%' use the index for terms of 3+ chars
        conn.execute(
            "CREATE VIRTUAL TABLE IF NOT EXISTS notes_fts USING fts5(
                note_id UNINDEXED,
                title,
                content,
                tokenize='trigram'
            )",
            [],
        )?;

        Ok(Self {
            conn,
            title_boost,
            content_boost,
            indexed: 0,
        })
    }

    /// Number of notes in the current build
    pub fn len(&self) -> usize {
        self.indexed
    }

    pub fn is_empty(&self) -> bool {
        self.indexed == 0
    }

    /// Throw the index away and index `notes` in the given order. Ties in
    /// relevance come back in this order.
    pub fn rebuild(&mut self, notes: &[Note]) -> NotesResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM notes_fts", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO notes_fts (note_id, title, content) VALUES (?1, ?2, ?3)")?;
            for note in notes {
                stmt.execute(params![
                    note.id,
                    note.title.to_lowercase(),
                    note.content.to_lowercase()
                ])?;
            }
        }
        tx.commit()?;

        self.indexed = notes.len();
        log::debug!("[SEARCH] Indexed {} notes", self.indexed);
        Ok(self.indexed)
    }

    /// Ids of matching notes, most relevant first.
    pub fn search(&self, query: &ParsedQuery) -> NotesResult<Vec<NoteId>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let patterns: Vec<String> = query.clauses.iter().map(|c| like_pattern(&c.term)).collect();

        let mut score_terms = Vec::new();
        let mut required = Vec::new();
        let mut prohibited = Vec::new();
        let mut optional = Vec::new();

        for (i, clause) in query.clauses.iter().enumerate() {
            let param = i + 1;
            let matches = match_expr(clause.field, param);
            match clause.presence {
                Presence::Required => required.push(matches),
                Presence::Prohibited => {
                    prohibited.push(format!("NOT {}", matches));
                    continue;
                }
                Presence::Optional => optional.push(matches),
            }
            score_terms.push(self.score_expr(clause, param));
        }

        // Optional clauses only filter when nothing is required
        let any_required = !required.is_empty();
        let mut conditions = required;
        conditions.extend(prohibited);
        if !any_required && !optional.is_empty() {
            conditions.push(format!("({})", optional.join(" OR ")));
        }

        let score = if score_terms.is_empty() {
            "0".to_string()
        } else {
            score_terms.join(" + ")
        };

        let sql = format!(
            "SELECT note_id, {} AS score FROM notes_fts WHERE {} ORDER BY score DESC, rowid ASC",
            score,
            conditions.join(" AND ")
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(patterns.iter()), |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn score_expr(&self, clause: &Clause, param: usize) -> String {
        let title = format!(
            "(CASE WHEN title LIKE ?{} ESCAPE '\\' THEN {:?} ELSE 0.0 END)",
            param, self.title_boost
        );
        let content = format!(
            "(CASE WHEN content LIKE ?{} ESCAPE '\\' THEN {:?} ELSE 0.0 END)",
            param, self.content_boost
        );
        let weighted = match clause.field {
            FieldScope::Any => format!("({} + {})", title, content),
            FieldScope::Title => title,
            FieldScope::Content => content,
        };
        format!("({} * {:?})", weighted, clause.boost)
    }
}

fn match_expr(field: FieldScope, param: usize) -> String {
    match field {
        FieldScope::Any => format!(
            "(title LIKE ?{p} ESCAPE '\\' OR content LIKE ?{p} ESCAPE '\\')",
            p = param
        ),
        FieldScope::Title => format!("(title LIKE ?{} ESCAPE '\\')", param),
        FieldScope::Content => format!("(content LIKE ?{} ESCAPE '\\')", param),
    }
}

/// Wrap a lowercased term as `%term%`, escaping LIKE metacharacters and
/// turning `*` into `%`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        match c {
            '%' | '_' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            '*' => pattern.push('%'),
            _ => pattern.push(c),
        }
    }
    pattern.push('%');
    pattern
}
