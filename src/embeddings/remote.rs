// remote.rs — Hosted text-embedding API client.
//
// One POST per word, no caching, no retry. Any HTTP or transport error aborts
// the run. Pacing is a blind fixed-interval pause (see pacing.rs).

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use super::pacing::{FixedIntervalPacing, Throttle, ThreadSleeper};
use super::EmbeddingSource;
use crate::config::{self, RemoteConfig};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
}

pub struct RemoteSource {
    agent: ureq::Agent,
    endpoint: String,
    config: RemoteConfig,
    throttle: Throttle,
}

impl RemoteSource {
    pub fn new(config: RemoteConfig, throttle: Throttle) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        let endpoint = format!("{}/embeddings", config.api_base.trim_end_matches('/'));
        Self {
            agent,
            endpoint,
            config,
            throttle,
        }
    }

    /// Default pacing: 120s pause after every 30th request, real sleeps.
    pub fn with_default_pacing(config: RemoteConfig) -> Self {
        Self::new(
            config,
            Throttle::new(Box::new(FixedIntervalPacing::default()), Box::new(ThreadSleeper)),
        )
    }

    fn request(&self, api_key: &str, word: &str) -> anyhow::Result<Vec<f64>> {
        // The hosted client library replaces newlines before embedding.
        let input = word.replace('\n', " ");
        let body = serde_json::to_string(&EmbeddingRequest {
            input: &input,
            model: &self.config.engine,
        })
        .context("failed serializing embedding request")?;

        let resp = match self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {api_key}"))
            .set("Content-Type", "application/json")
            .send_string(&body)
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, resp)) => {
                let detail = resp.into_string().unwrap_or_default();
                match status {
                    401 | 403 => bail!("authentication failed (HTTP {status}): {detail}"),
                    429 => bail!("rate limit rejected request (HTTP 429): {detail}"),
                    _ => bail!("HTTP {status} from {}: {detail}", self.endpoint),
                }
            }
            Err(e) => return Err(e).with_context(|| format!("request to {} failed", self.endpoint)),
        };

        let text = resp
            .into_string()
            .with_context(|| format!("failed to read response body from {}", self.endpoint))?;
        parse_embedding(&text)
    }
}

impl EmbeddingSource for RemoteSource {
    type Component = f64;

    fn embed(&mut self, word: &str) -> anyhow::Result<Vec<f64>> {
        let api_key = self.config.api_key.clone().with_context(|| {
            format!(
                "authentication failed: no API key provided (set {})",
                config::remote::ENV_API_KEY
            )
        })?;

        log::debug!("Embedding request #{} for {:?}", self.throttle.issued() + 1, word);
        let vector = self
            .request(&api_key, word)
            .with_context(|| format!("embedding {word:?} with {}", self.config.engine))?;

        self.throttle.after_request();
        Ok(vector)
    }

    fn name(&self) -> &str {
        &self.config.engine
    }
}

fn parse_embedding(text: &str) -> anyhow::Result<Vec<f64>> {
    let parsed: EmbeddingResponse = serde_json::from_str(text).context("invalid embedding response JSON")?;
    match parsed.data.into_iter().next() {
        Some(item) => Ok(item.embedding),
        None => bail!("embedding response contained no data"),
    }
}
