//! Markdown transcripts of recorded exchanges.
//!
//! A transcript is made of up to four fenced blocks: the request head, the
//! request body as JSON, the response head and the response body as JSON.
//!
//! ````text
//! ```text
//! POST /posts HTTP/1.1
//! Content-Type: application/json
//!
//! ```
//! ```json
//! {
//!   "text": "hello"
//! }
//! ```
//!
//! ```text
//! HTTP/1.1 200 OK
//! Content-Type: application/json
//!
//! ```
//! ````

use std::collections::HashSet;

use http::header::{self, HeaderName};
use http::{HeaderMap, StatusCode};
use serde::de::IgnoredAny;
use tracing::debug;

use crate::recorder::Exchange;

/// Headers left out of transcripts by default.
///
/// They describe how the message travelled rather than what it says.
pub const EXCLUDED_HEADERS: [HeaderName; 5] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::TRAILER,
    header::USER_AGENT,
];

const DEFAULT_INDENT: usize = 2;

/// Renders `exchange` with the default [`Transcriber`].
pub fn render(exchange: &Exchange) -> String {
    Transcriber::default().render(exchange)
}

/// Configurable transcript renderer.
///
/// # Example
///
/// ```rust
/// use http::header::AUTHORIZATION;
/// use tapspec_core::Transcriber;
///
/// let transcriber = Transcriber::new()
///     .with_excluded_header(AUTHORIZATION)
///     .with_indent(4);
///
/// assert!(transcriber.is_excluded(&AUTHORIZATION));
/// ```
#[derive(Debug, Clone)]
pub struct Transcriber {
    excluded: HashSet<HeaderName>,
    indent: usize,
}

impl Default for Transcriber {
    fn default() -> Self {
        Self {
            excluded: EXCLUDED_HEADERS.into_iter().collect(),
            indent: DEFAULT_INDENT,
        }
    }
}

impl Transcriber {
    /// Transcriber excluding [`EXCLUDED_HEADERS`] and indenting JSON by two spaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also leaves `name` out of transcripts.
    #[must_use]
    pub fn with_excluded_header(mut self, name: HeaderName) -> Self {
        self.excluded.insert(name);
        self
    }

    /// Renders `name` again, even if it is part of the default exclusions.
    #[must_use]
    pub fn without_excluded_header(mut self, name: &HeaderName) -> Self {
        self.excluded.remove(name);
        self
    }

    /// Number of spaces per JSON nesting level.
    #[must_use]
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = width;
        self
    }

    /// Whether `name` is left out of transcripts.
    pub fn is_excluded(&self, name: &HeaderName) -> bool {
        self.excluded.contains(name)
    }

    /// Renders one exchange as markdown.
    pub fn render(&self, exchange: &Exchange) -> String {
        let request = exchange.request();
        let response = exchange.response();
        let mut out = String::new();

        out.push_str("```text\n");
        out.push_str(&format!("{} {} HTTP/1.1\n", request.method, request.target()));
        self.push_headers(&mut out, &request.headers);
        out.push_str("\n```\n");

        if let Some(body) = exchange.request_body() {
            self.push_json(&mut out, &body.bytes());
        }

        out.push_str("\n```text\n");
        out.push_str(&format!(
            "{:?} {}\n",
            response.version,
            status_line(response.status)
        ));
        self.push_headers(&mut out, &response.headers);
        out.push_str("\n```\n");

        let body = exchange.response_body().bytes();
        if !body.is_empty() {
            self.push_json(&mut out, &body);
        }

        out
    }

    fn push_headers(&self, out: &mut String, headers: &HeaderMap) {
        let mut lines: Vec<_> = headers
            .iter()
            .filter(|(name, _)| !self.is_excluded(name))
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes());
                (canonical_name(name), value)
            })
            .collect();
        lines.sort_by(|(left, _), (right, _)| left.cmp(right));

        for (name, value) in lines {
            out.push_str(&format!("{name}: {value}\n"));
        }
    }

    fn push_json(&self, out: &mut String, bytes: &[u8]) {
        out.push_str("```json\n");
        out.push_str(&self.indent_json(bytes));
        out.push_str("\n```\n");
    }

    /// Re-indents a JSON body, touching nothing but the whitespace between tokens.
    ///
    /// Numbers, string escapes and duplicate keys come out exactly as they went
    /// in. Bodies that are not valid JSON are returned as is.
    fn indent_json(&self, bytes: &[u8]) -> String {
        if let Err(error) = serde_json::from_slice::<IgnoredAny>(bytes) {
            debug!(%error, "body is not JSON, keeping raw bytes");
            return String::from_utf8_lossy(bytes).into_owned();
        }

        let indent = " ".repeat(self.indent);
        let indented = reindent(bytes, indent.as_bytes());
        String::from_utf8_lossy(&indented).into_owned()
    }
}

/// Rewrites the whitespace of a valid JSON text, one value per line.
fn reindent(json: &[u8], indent: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(json.len() * 2);
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;
    // a container was just opened, its first line break is still pending
    let mut opened = false;

    for &byte in json {
        if in_string {
            out.push(byte);
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b' ' | b'\t' | b'\n' | b'\r' => continue,
            b'}' | b']' if opened => {
                opened = false;
                depth = depth.saturating_sub(1);
                out.push(byte);
                continue;
            }
            _ => {}
        }

        if opened {
            opened = false;
            push_line_break(&mut out, indent, depth);
        }

        match byte {
            b'{' | b'[' => {
                out.push(byte);
                depth += 1;
                opened = true;
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                push_line_break(&mut out, indent, depth);
                out.push(byte);
            }
            b',' => {
                out.push(byte);
                push_line_break(&mut out, indent, depth);
            }
            b':' => out.extend_from_slice(b": "),
            b'"' => {
                in_string = true;
                out.push(byte);
            }
            _ => out.push(byte),
        }
    }

    out
}

fn push_line_break(out: &mut Vec<u8>, indent: &[u8], depth: usize) {
    out.push(b'\n');
    for _ in 0..depth {
        out.extend_from_slice(indent);
    }
}

/// `200 OK`, or only the code when the status has no canonical reason.
fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_str()),
        None => status.as_str().to_string(),
    }
}

/// Canonical MIME form of a header name: `x-request-id` becomes `X-Request-Id`.
fn canonical_name(name: &HeaderName) -> String {
    let mut canonical = String::with_capacity(name.as_str().len());
    let mut upper = true;
    for ch in name.as_str().chars() {
        if upper {
            canonical.extend(ch.to_uppercase());
        } else {
            canonical.push(ch);
        }
        upper = ch == '-';
    }
    canonical
}
