//! Extraction of JSON embedded in portal HTML.
//!
//! The portal renders data into hidden inputs:
//!
//! ```html
//! <input type="hidden" id="items-data" value="[{&quot;Materia&quot;:...}]" />
//! ```
//!
//! The marker contract per page is `id="<marker>"` followed by whitespace and
//! `value="<html-escaped JSON>"`. The first occurrence with that shape wins.
//! The value is entity-decoded before parsing. A change to either marker on
//! the portal side is an external contract break.

use std::fmt;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// A hidden-input marker the portal embeds JSON under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `id="carreras-me"` on the enrollment page: the student's programs.
    Programs,
    /// `id="items-data"` on the history page: the course-history rows.
    CourseHistory,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Marker {
    pub fn id(self) -> &'static str {
        match self {
            Marker::Programs => "carreras-me",
            Marker::CourseHistory => "items-data",
        }
    }
}

/// Errors from [`extract_embedded`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The marker (or a non-empty value after it) is not in the page.
    #[error("marker `{0}` not found")]
    MarkerNotFound(Marker),

    /// The decoded value is not the expected JSON.
    #[error("invalid JSON under `{marker}`: {source}")]
    Json {
        marker: Marker,
        #[source]
        source: serde_json::Error,
    },
}

/// Find `marker` in `html`, decode its value, and parse it as `T`.
pub fn extract_embedded<T: DeserializeOwned>(html: &str, marker: Marker) -> Result<T, ExtractError> {
    let raw = find_value(html, marker.id()).ok_or(ExtractError::MarkerNotFound(marker))?;
    let decoded = decode_entities(raw);
    serde_json::from_str(&decoded).map_err(|source| ExtractError::Json { marker, source })
}

/// Raw attribute text of the first `id="<id>" value="..."` pair.
fn find_value<'a>(html: &'a str, id: &str) -> Option<&'a str> {
    let needle = format!(r#"id="{id}""#);
    let mut from = 0;
    while let Some(rel) = html[from..].find(&needle) {
        let after_id = from + rel + needle.len();
        if let Some(value) = value_after(&html[after_id..]) {
            return Some(value);
        }
        from = after_id;
    }
    None
}

/// Whitespace, then a non-empty `value="..."`, at the start of `rest`.
fn value_after(rest: &str) -> Option<&str> {
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    let body = trimmed.strip_prefix(r#"value=""#)?;
    let end = body.find('"')?;
    (end > 0).then(|| &body[..end])
}

/// Decode the entities an HTML attribute value may carry: the markup ones,
/// the Latin-1 letters and punctuation Spanish text uses, and numeric
/// references. Anything else is kept verbatim.
fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match rest.find(';').and_then(|semi| Some((entity(&rest[1..semi])?, semi))) {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    match name {
        "quot" => Some('"'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "aacute" => Some('á'),
        "eacute" => Some('é'),
        "iacute" => Some('í'),
        "oacute" => Some('ó'),
        "uacute" => Some('ú'),
        "Aacute" => Some('Á'),
        "Eacute" => Some('É'),
        "Iacute" => Some('Í'),
        "Oacute" => Some('Ó'),
        "Uacute" => Some('Ú'),
        "ntilde" => Some('ñ'),
        "Ntilde" => Some('Ñ'),
        "uuml" => Some('ü'),
        "Uuml" => Some('Ü'),
        "iexcl" => Some('¡'),
        "iquest" => Some('¿'),
        "ordf" => Some('ª'),
        "ordm" => Some('º'),
        "deg" => Some('°'),
        "laquo" => Some('«'),
        "raquo" => Some('»'),
        "middot" => Some('·'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
