#![allow(missing_docs)]
use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::redirect::Policy;
use tapspec_core::{ReqwestTransport, install};
use tracing::{info, warn};
use url::Url;

use self::scenario::Scenario;

mod scenario;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let AppArgs {
        base,
        scenario,
        output,
    } = AppArgs::parse().context("parsing arguments")?;

    let scenario = Scenario::load(&scenario)
        .with_context(|| format!("loading scenario {}", scenario.display()))?;

    // every hop is an exchange worth documenting, redirects are not followed
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .context("building HTTP client")?;
    let recorder = install(ReqwestTransport::new(client));

    let book = scenario.run(&recorder, &base).await?;
    book.write_to(&output)
        .with_context(|| format!("writing examples to {}", output.display()))?;

    info!(examples = book.len(), "Bye!");
    Ok(())
}

#[derive(Debug)]
struct AppArgs {
    base: Url,
    scenario: PathBuf,
    output: PathBuf,
}

impl AppArgs {
    fn parse() -> Result<Self> {
        let mut pargs = pico_args::Arguments::from_env();

        let base = pargs
            .value_from_str(["-b", "--base"])
            .context("parsing base URL argument")?;

        let scenario = pargs
            .value_from_str(["-s", "--scenario"])
            .context("parsing scenario argument")?;

        let output = pargs
            .opt_value_from_str(["-o", "--output"])
            .context("parsing output argument")?;

        let result = Self {
            base,
            scenario,
            output: output.unwrap_or_else(|| PathBuf::from("examples.json")),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            warn!(?remaining, "Warning: unused arguments left");
        }
        Ok(result)
    }
}
