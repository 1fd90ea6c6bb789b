//! Namespace prefixes and term escaping shared by the writer and the queries.

use std::fmt::Write as _;

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const DBR: &str = "http://dbpedia.org/resource/";
pub const DBO: &str = "http://dbpedia.org/ontology/";
pub const FOAF: &str = "http://xmlns.com/foaf/spec/";

/// Prefix bindings for one graph; only `uni:` varies.
#[derive(Debug, Clone)]
pub struct Namespaces {
    pub uni: String,
}

impl Namespaces {
    pub fn new(base_iri: impl Into<String>) -> Self {
        Self {
            uni: base_iri.into(),
        }
    }

    fn bindings(&self) -> [(&str, &str); 6] {
        [
            ("rdf", RDF),
            ("rdfs", RDFS),
            ("dbr", DBR),
            ("dbo", DBO),
            ("foaf", FOAF),
            ("uni", self.uni.as_str()),
        ]
    }

    /// `@prefix` lines for a Turtle document.
    pub fn turtle_prefixes(&self) -> String {
        let mut out = String::new();
        for (prefix, iri) in self.bindings() {
            let label = format!("{prefix}:");
            let _ = writeln!(out, "@prefix {label:<7} <{iri}> .");
        }
        out
    }

    /// `PREFIX` lines for a SPARQL query.
    pub fn sparql_prefixes(&self) -> String {
        let mut out = String::new();
        for (prefix, iri) in self.bindings() {
            let _ = writeln!(out, "PREFIX {prefix}: <{iri}>");
        }
        out
    }
}

/// Quote and escape a string literal (valid in both Turtle and SPARQL).
pub fn literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Escape a prefixed-name local part.
///
/// Reserved punctuation is backslash-escaped; anything else outside the
/// allowed set is percent-encoded.
pub fn local_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            c if c.is_ascii_alphanumeric() || c == '_' || c == ':' => out.push(c),
            c if is_pn_chars_base(c) => out.push(c),
            '~' | '.' | '-' | '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';'
            | '=' | '/' | '?' | '#' | '@' | '%' => {
                out.push('\\');
                out.push(c);
            }
            c => percent_encode_char(&mut out, c),
        }
    }
    out
}

/// Non-ASCII ranges of Turtle's `PN_CHARS_BASE`.
fn is_pn_chars_base(c: char) -> bool {
    matches!(c,
        '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// `prefix:local` with the local part escaped.
pub fn prefixed(prefix: &str, local: &str) -> String {
    format!("{prefix}:{}", local_name(local))
}

/// Wrap an IRI in angle brackets, percent-encoding characters IRIs may not contain.
pub fn iri(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('<');
    for c in s.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                percent_encode_char(&mut out, c)
            }
            c if c <= ' ' => percent_encode_char(&mut out, c),
            c => out.push(c),
        }
    }
    out.push('>');
    out
}

fn percent_encode_char(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    for byte in c.encode_utf8(&mut buf).bytes() {
        let _ = write!(out, "%{byte:02X}");
    }
}
