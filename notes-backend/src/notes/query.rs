//! Search query syntax.
//!
//! Whitespace separated clauses of the form
//! `[+|-][title:|content:]term[^boost][~distance]`. Every term matches as a
//! substring; a `*` inside a term matches any run of characters.

use strum::EnumString;

use crate::error::{NotesError, NotesResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Optional,
    Required,
    Prohibited,
}

/// Which fields a clause looks at. Only the named scopes can be written
/// as a `field:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FieldScope {
    #[strum(disabled)]
    Any,
    Title,
    Content,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub term: String,
    pub field: FieldScope,
    pub presence: Presence,
    pub boost: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedQuery {
    pub clauses: Vec<Clause>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

fn syntax_error(clause: &str, msg: &str) -> NotesError {
    NotesError::SearchQueryError(format!("{} in '{}'", msg, clause))
}

pub fn parse(input: &str) -> NotesResult<ParsedQuery> {
    let clauses = input
        .split_whitespace()
        .map(parse_clause)
        .collect::<NotesResult<Vec<_>>>()?;
    Ok(ParsedQuery { clauses })
}

fn parse_clause(raw: &str) -> NotesResult<Clause> {
    let (presence, rest) = match raw.chars().next() {
        Some('+') => (Presence::Required, &raw[1..]),
        Some('-') => (Presence::Prohibited, &raw[1..]),
        _ => (Presence::Optional, raw),
    };
    if rest.is_empty() {
        return Err(syntax_error(raw, "presence modifier without a term"));
    }

    let (field, rest) = match rest.split_once(':') {
        Some((name, term)) => {
            if name.is_empty() {
                return Err(syntax_error(raw, "missing field name"));
            }
            let field = name
                .parse::<FieldScope>()
                .map_err(|_| syntax_error(raw, &format!("unknown field '{}'", name)))?;
            if term.contains(':') {
                return Err(syntax_error(raw, "more than one field separator"));
            }
            (field, term)
        }
        None => (FieldScope::Any, rest),
    };

    let (term, modifiers) = match rest.find(['^', '~']) {
        Some(pos) => rest.split_at(pos),
        None => (rest, ""),
    };
    if term.is_empty() {
        return Err(syntax_error(raw, "empty term"));
    }
    if term.starts_with(['+', '-']) {
        return Err(syntax_error(raw, "misplaced presence modifier"));
    }

    let boost = parse_modifiers(raw, modifiers)?;

    Ok(Clause {
        term: term.to_string(),
        field,
        presence,
        boost,
    })
}

/// Parse a run of `^boost` / `~distance` suffixes. Edit distance is accepted
/// for compatibility but has no effect on substring matching.
fn parse_modifiers(raw: &str, mut modifiers: &str) -> NotesResult<f64> {
    let mut boost = 1.0;
    while let Some(marker) = modifiers.chars().next() {
        let body = &modifiers[1..];
        let end = body.find(['^', '~']).unwrap_or(body.len());
        let value = &body[..end];
        if value.is_empty() {
            return Err(syntax_error(raw, &format!("dangling '{}'", marker)));
        }
        match marker {
            '^' => {
                boost = value
                    .parse::<f64>()
                    .ok()
                    .filter(|b| b.is_finite() && *b > 0.0)
                    .ok_or_else(|| syntax_error(raw, "boost must be a positive number"))?;
            }
            _ => {
                value
                    .parse::<u32>()
                    .map_err(|_| syntax_error(raw, "edit distance must be an integer"))?;
            }
        }
        modifiers = &body[end..];
    }
    Ok(boost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_terms() {
        let q = parse("milk  eggs").unwrap();
        assert_eq!(q.clauses.len(), 2);
        assert_eq!(q.clauses[0].term, "milk");
        assert_eq!(q.clauses[0].field, FieldScope::Any);
        assert_eq!(q.clauses[0].presence, Presence::Optional);
        assert_eq!(q.clauses[1].boost, 1.0);
    }

    #[test]
    fn test_modifiers() {
        let q = parse("+title:work^2 -content:draft~1 mee*ng").unwrap();
        let work = &q.clauses[0];
        assert_eq!(work.presence, Presence::Required);
        assert_eq!(work.field, FieldScope::Title);
        assert_eq!(work.term, "work");
        assert_eq!(work.boost, 2.0);

        let draft = &q.clauses[1];
        assert_eq!(draft.presence, Presence::Prohibited);
        assert_eq!(draft.field, FieldScope::Content);
        assert_eq!(draft.term, "draft");

        assert_eq!(q.clauses[2].term, "mee*ng");
    }

    #[test]
    fn test_blank_is_empty() {
        assert!(parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_clauses() {
        for bad in [
            "milk:", "author:bob", ":milk", "+", "-", "milk^", "milk^abc", "milk^-2",
            "milk~", "milk~x", "title:a:b", "^3", "+-milk",
        ] {
            let err = parse(bad).unwrap_err();
            assert!(
                matches!(err, NotesError::SearchQueryError(_)),
                "expected syntax error for {:?}",
                bad
            );
        }
    }
}
