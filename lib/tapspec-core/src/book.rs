use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::TapspecError;
use crate::recorder::Exchange;
use crate::transcript::Transcriber;

/// Named collection of transcripts, written out as a single JSON object.
///
/// Keys are example names, values are the markdown transcripts. Names are
/// kept sorted so the written document is stable from one run to the next.
///
/// # Example
///
/// ```rust,no_run
/// # use tapspec_core::{ExampleBook, Exchange};
/// # fn example(exchanges: Vec<Exchange>) -> Result<(), tapspec_core::TapspecError> {
/// let mut book = ExampleBook::new();
/// for (name, exchange) in ["discover_head", "discover_meta"].into_iter().zip(&exchanges) {
///     book.insert(name, exchange)?;
/// }
/// book.write_to("target/examples.json")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExampleBook {
    transcriber: Transcriber,
    examples: BTreeMap<String, String>,
}

impl ExampleBook {
    /// Empty book rendering with the default [`Transcriber`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty book rendering with `transcriber`.
    pub fn with_transcriber(transcriber: Transcriber) -> Self {
        Self {
            transcriber,
            examples: BTreeMap::new(),
        }
    }

    /// Renders `exchange` and stores it under `name`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`TapspecError::InvalidExampleName`] for a blank name.
    pub fn insert(&mut self, name: impl Into<String>, exchange: &Exchange) -> Result<(), TapspecError> {
        let text = self.transcriber.render(exchange);
        self.insert_transcript(name, text)
    }

    /// Stores an already rendered transcript under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TapspecError::InvalidExampleName`] for a blank name.
    pub fn insert_transcript(
        &mut self,
        name: impl Into<String>,
        transcript: impl Into<String>,
    ) -> Result<(), TapspecError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TapspecError::InvalidExampleName { name });
        }
        self.examples.insert(name, transcript.into());
        Ok(())
    }

    /// The transcript stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.examples.get(name).map(String::as_str)
    }

    /// Example names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.examples.keys().map(String::as_str)
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Whether the book has no example.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// The book as a compact JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, TapspecError> {
        let json = serde_json::to_string(&self.examples)?;
        Ok(json)
    }

    /// Writes the JSON document to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file system operation fails.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), TapspecError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), examples = self.len(), "example book written");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::Request;
    use http_body_util::BodyExt;

    use super::*;
    use crate::fixtures::StubTransport;
    use crate::{Transport, empty, install};

    async fn exchange(path: &str) -> Exchange {
        let recorder = install(StubTransport::ok(r#"{"ok":true}"#));
        let request = Request::get(path).body(empty()).expect("valid request");
        let response = recorder.dispatch(request).await.expect("dispatch");
        response.into_body().collect().await.expect("readable body");
        recorder.drain().remove(0)
    }

    #[tokio::test]
    async fn test_insert_renders_exchange() {
        let exchange = exchange("/posts").await;
        let mut book = ExampleBook::new();

        book.insert("posts_feed", &exchange).expect("valid name");

        assert_eq!(book.get("posts_feed"), Some(crate::render(&exchange).as_str()));
        assert_eq!(book.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_uses_custom_transcriber() {
        let exchange = exchange("/posts").await;
        let transcriber = Transcriber::new().with_excluded_header(http::header::CONTENT_TYPE);
        let mut book = ExampleBook::with_transcriber(transcriber);

        book.insert("posts_feed", &exchange).expect("valid name");

        let text = book.get("posts_feed").expect("inserted");
        assert!(!text.contains("Content-Type"));
    }

    #[test]
    fn test_reject_blank_name() {
        let mut book = ExampleBook::new();

        let result = book.insert_transcript(" ", "text");

        assert!(matches!(
            result,
            Err(TapspecError::InvalidExampleName { name }) if name == " "
        ));
        assert!(book.is_empty());
    }

    #[test]
    fn test_replace_existing_name() {
        let mut book = ExampleBook::new();
        book.insert_transcript("new_post", "first").expect("valid name");
        book.insert_transcript("new_post", "second").expect("valid name");

        assert_eq!(book.get("new_post"), Some("second"));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_to_json_sorted_keys() {
        let mut book = ExampleBook::new();
        book.insert_transcript("post_refs", "b").expect("valid name");
        book.insert_transcript("app_create", "a\n```").expect("valid name");

        let json = book.to_json().expect("serializable");

        insta::assert_snapshot!(json, @r#"{"app_create":"a\n```","post_refs":"b"}"#);
        assert_eq!(book.names().collect::<Vec<_>>(), ["app_create", "post_refs"]);
    }

    #[test]
    fn test_write_to_creates_parents() {
        let dir = std::env::temp_dir().join(format!("tapspec-book-{}", std::process::id()));
        let path = dir.join("nested").join("examples.json");
        let mut book = ExampleBook::new();
        book.insert_transcript("discover_head", "HEAD / HTTP/1.1").expect("valid name");

        book.write_to(&path).expect("writable");

        let content = fs::read_to_string(&path).expect("file should exist");
        let value: serde_json::Value = serde_json::from_str(&content).expect("valid JSON");
        assert_eq!(value["discover_head"], "HEAD / HTTP/1.1");

        fs::remove_dir_all(dir).expect("cleanup");
    }
}
