use chrono::Utc;
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

use corso_core::error::Result;
use corso_core::traits::Capability;
use corso_core::types::{CallerId, CapabilityReply};

/// Assemble a plain-text document from a title and optional sections.
pub struct AssembleDocument;

#[derive(Deserialize)]
struct AssembleDocumentInput {
    title: String,
    #[serde(default)]
    sections: Vec<String>,
}

impl Capability for AssembleDocument {
    fn name(&self) -> &str {
        "assemble_document"
    }

    fn description(&self) -> &str {
        "Compose a dated plain-text document from a title and sections."
    }

    fn invoke(
        &self,
        args: serde_json::Value,
        caller: CallerId,
    ) -> BoxFuture<'_, Result<CapabilityReply>> {
        Box::pin(async move {
            let input: AssembleDocumentInput = match serde_json::from_value(args) {
                Ok(input) => input,
                Err(e) => return Ok(CapabilityReply::failure(format!("invalid arguments: {}", e))),
            };

            if input.title.trim().is_empty() {
                return Ok(CapabilityReply::failure("title must not be empty"));
            }

            let mut document = format!(
                "# {}\n\nPrepared by {} on {}.\n",
                input.title.trim(),
                caller,
                Utc::now().format("%Y-%m-%d")
            );
            for section in &input.sections {
                document.push('\n');
                document.push_str(section);
                document.push('\n');
            }

            let word_count = document.split_whitespace().count();
            debug!(title = %input.title, word_count, "Assembled document");

            let mut data = serde_json::Map::new();
            data.insert("document".into(), document.into());
            data.insert("word_count".into(), word_count.into());
            Ok(CapabilityReply::ok(data))
        })
    }
}
