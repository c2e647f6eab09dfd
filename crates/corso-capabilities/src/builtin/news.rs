use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

use corso_core::error::Result;
use corso_core::traits::Capability;
use corso_core::types::{CallerId, CapabilityReply};

/// Retrieve recent headlines, optionally filtered by topic.
pub struct FetchNews;

#[derive(Deserialize)]
struct FetchNewsInput {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    3
}

const HEADLINES: &[(&str, &str)] = &[
    ("markets", "European markets close higher on energy rebound"),
    ("markets", "Small-cap index posts third straight weekly gain"),
    ("technology", "Open-source toolchains gain ground in embedded development"),
    ("technology", "Cloud providers cut cold-storage prices again"),
    ("logistics", "Port congestion eases as container rates normalize"),
    ("logistics", "Rail freight corridor upgrade enters second phase"),
];

impl Capability for FetchNews {
    fn name(&self) -> &str {
        "fetch_news"
    }

    fn description(&self) -> &str {
        "Fetch recent headlines, optionally filtered by topic keyword."
    }

    fn invoke(
        &self,
        args: serde_json::Value,
        _caller: CallerId,
    ) -> BoxFuture<'_, Result<CapabilityReply>> {
        Box::pin(async move {
            let input: FetchNewsInput = match serde_json::from_value(args) {
                Ok(input) => input,
                Err(e) => return Ok(CapabilityReply::failure(format!("invalid arguments: {}", e))),
            };

            let topic = input.topic.as_deref().map(str::to_lowercase);
            debug!(topic = ?topic, limit = input.limit, "Fetching headlines");

            let headlines: Vec<serde_json::Value> = HEADLINES
                .iter()
                .filter(|(section, title)| match &topic {
                    // An unfiltered request (or a free-text topic with no
                    // section hit) falls back to the full feed below.
                    Some(t) => section.contains(t.as_str()) || title.to_lowercase().contains(t.as_str()),
                    None => true,
                })
                .take(input.limit)
                .map(|(_, title)| serde_json::Value::String((*title).to_string()))
                .collect();

            let headlines = if headlines.is_empty() {
                HEADLINES
                    .iter()
                    .take(input.limit)
                    .map(|(_, title)| serde_json::Value::String((*title).to_string()))
                    .collect()
            } else {
                headlines
            };

            let mut data = serde_json::Map::new();
            data.insert("count".into(), headlines.len().into());
            data.insert("headlines".into(), serde_json::Value::Array(headlines));
            Ok(CapabilityReply::ok(data))
        })
    }
}
