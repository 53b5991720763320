use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use http::header::CONTENT_TYPE;
use http::{Method, Request};
use http_body_util::BodyExt;
use serde::Deserialize;
use tapspec_core::{Body, ExampleBook, Recorder, Transport, empty, full};
use tracing::{debug, info, warn};
use url::Url;

/// Ordered list of HTTP calls to replay.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Scenario {
    steps: Vec<Step>,
}

/// One HTTP call of a scenario.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    name: String,
    #[serde(default = "default_method")]
    method: String,
    path: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    /// JSON payload, sent as `application/json` unless a content type is given.
    #[serde(default)]
    body: Option<serde_json::Value>,
    /// Payload sent as is.
    #[serde(default)]
    text: Option<String>,
    #[serde(default = "default_record")]
    record: bool,
}

fn default_method() -> String {
    Method::GET.to_string()
}

fn default_record() -> bool {
    true
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(content).context("parsing scenario JSON")?;
        Ok(scenario)
    }

    /// Replays every step through `recorder`, collecting the recorded ones.
    ///
    /// Response bodies are read to the end so the transcripts are complete.
    pub async fn run<T>(&self, recorder: &Recorder<T>, base: &Url) -> Result<ExampleBook>
    where
        T: Transport,
    {
        let mut book = ExampleBook::new();
        info!(steps = self.steps.len(), %base, "running scenario");

        for step in &self.steps {
            let request = step
                .to_request(base)
                .with_context(|| format!("building request for step '{}'", step.name))?;

            let response = recorder
                .dispatch(request)
                .await
                .with_context(|| format!("sending request for step '{}'", step.name))?;
            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                warn!(step = %step.name, %status, "unexpected status");
            }

            response
                .into_body()
                .collect()
                .await
                .map_err(|err| anyhow!(err))
                .with_context(|| format!("reading response for step '{}'", step.name))?;

            let Some(exchange) = recorder.drain_last(1).pop() else {
                bail!("no exchange recorded for step '{}'", step.name);
            };
            if step.record {
                book.insert(step.name.as_str(), &exchange)?;
            } else {
                debug!(step = %step.name, "step not documented");
            }
        }

        Ok(book)
    }
}

impl Step {
    pub fn to_request(&self, base: &Url) -> Result<Request<Body>> {
        let url = base
            .join(&self.path)
            .with_context(|| format!("invalid path {:?}", self.path))?;

        let mut builder = Request::builder()
            .method(self.method.as_str())
            .uri(url.as_str());
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let has_content_type = self
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));

        let body = match (&self.body, &self.text) {
            (Some(_), Some(_)) => bail!("step '{}' has both a JSON body and a text body", self.name),
            (Some(json), None) => {
                if !has_content_type {
                    builder = builder.header(CONTENT_TYPE, "application/json");
                }
                full(serde_json::to_vec(json)?)
            }
            (None, Some(text)) => full(text.clone()),
            (None, None) => empty(),
        };

        let request = builder.body(body)?;
        Ok(request)
    }
}
