use std::path::Path;

use tracing::info;

use corso_core::error::{CorsoError, Result};

use crate::flow::Flow;
use crate::registry::FlowRegistry;

/// Load one flow definition from a `.toml` or `.json` file.
pub fn load_file(path: &Path) -> Result<Flow> {
    let content = std::fs::read_to_string(path)?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension {
        "toml" => toml::from_str(&content).map_err(|e| CorsoError::FlowParse {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
        "json" => serde_json::from_str(&content).map_err(|e| CorsoError::FlowParse {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
        other => Err(CorsoError::FlowParse {
            path: path.display().to_string(),
            message: format!("unsupported extension '{}'", other),
        }),
    }
}

/// Load every `*.toml` / `*.json` flow in a directory, in filename order.
///
/// Filename order makes the matcher's first-match tie-break reproducible.
/// A malformed file fails the whole load rather than being skipped.
pub fn load_dir(dir: &Path) -> Result<FlowRegistry> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("toml") | Some("json")
            )
        })
        .collect();
    paths.sort();

    let mut registry = FlowRegistry::new();
    for path in paths {
        let flow = load_file(&path)?;
        info!(flow_id = %flow.id, path = %path.display(), "Loaded flow");
        registry.register(flow);
    }
    Ok(registry)
}
