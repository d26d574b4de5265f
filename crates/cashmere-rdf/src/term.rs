use anyhow::{anyhow, Result};

/// A parsed RDF term, reduced to the subset this crate's triple store
/// needs: IRIs, blank nodes, and literals with an optional datatype or
/// language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfTerm {
    Iri(String),
    BlankNode(String),
    Literal {
        lexical: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl RdfTerm {
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            RdfTerm::Iri(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn lexical(&self) -> Option<&str> {
        match self {
            RdfTerm::Literal { lexical, .. } => Some(lexical.as_str()),
            _ => None,
        }
    }

    /// Canonical N-Triples-like rendering, used both for serializing
    /// generated RDF and for building stable cache keys.
    pub fn to_nt(&self) -> String {
        match self {
            RdfTerm::Iri(iri) => format!("<{iri}>"),
            RdfTerm::BlankNode(id) => format!("_:{id}"),
            RdfTerm::Literal {
                lexical,
                datatype,
                language,
            } => {
                let escaped = escape_literal(lexical);
                if let Some(lang) = language {
                    format!("\"{escaped}\"@{lang}")
                } else if let Some(dt) = datatype {
                    format!("\"{escaped}\"^^<{dt}>")
                } else {
                    format!("\"{escaped}\"")
                }
            }
        }
    }
}

fn escape_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Parses the `Display` form sophia terms render to (an N-Triples-ish
/// textual form) into an owned `RdfTerm`, decoupling the crate's own
/// data model from sophia's borrowed term types.
pub fn parse_term_display(term: &str) -> Result<RdfTerm> {
    let s = term.trim();

    if let Some(rest) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(RdfTerm::Iri(rest.to_string()));
    }

    if let Some(rest) = s.strip_prefix("_:") {
        return Ok(RdfTerm::BlankNode(rest.to_string()));
    }

    if s.starts_with('"') {
        let mut end_quote = None;
        let mut prev_was_escape = false;
        for (i, ch) in s.char_indices().skip(1) {
            if ch == '"' && !prev_was_escape {
                end_quote = Some(i);
                break;
            }
            prev_was_escape = ch == '\\' && !prev_was_escape;
        }
        let Some(end) = end_quote else {
            return Err(anyhow!("invalid literal term (missing closing quote): {s}"));
        };

        let lexical_raw = &s[1..end];
        let lexical = unescape_rdf_string(lexical_raw);
        let rest = s[end + 1..].trim();

        let mut language = None;
        let mut datatype = None;

        if let Some(lang) = rest.strip_prefix('@') {
            language = Some(lang.to_string());
        } else if let Some(dt) = rest.strip_prefix("^^") {
            let dt = dt.trim();
            if let Some(dt_iri) = dt.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
                datatype = Some(dt_iri.to_string());
            } else if !dt.is_empty() {
                datatype = Some(dt.to_string());
            }
        }

        return Ok(RdfTerm::Literal {
            lexical,
            datatype,
            language,
        });
    }

    Err(anyhow!("unsupported RDF term form: {s}"))
}

pub fn parse_node_term_display(term: &str) -> Result<RdfTerm> {
    match parse_term_display(term)? {
        node @ RdfTerm::Iri(_) | node @ RdfTerm::BlankNode(_) => Ok(node),
        RdfTerm::Literal { .. } => Err(anyhow!("expected IRI/blank node, got literal: {term}")),
    }
}

fn unescape_rdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
