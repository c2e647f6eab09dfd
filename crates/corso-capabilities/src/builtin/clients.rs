use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

use corso_core::error::Result;
use corso_core::traits::Capability;
use corso_core::types::{CallerId, CapabilityReply};

/// Look up a client record by (partial) name, company, or email.
pub struct ClientLookup;

#[derive(Deserialize)]
struct ClientLookupInput {
    query: String,
}

struct ClientRecord {
    name: &'static str,
    company: &'static str,
    email: &'static str,
    segment: &'static str,
}

// Demo directory; a production deployment replaces this capability with a
// CRM-backed provider implementing the same contract.
const DIRECTORY: &[ClientRecord] = &[
    ClientRecord {
        name: "Mario Rossi",
        company: "Rossi Serramenti SRL",
        email: "mario.rossi@rossiserramenti.it",
        segment: "premium",
    },
    ClientRecord {
        name: "Giulia Bianchi",
        company: "Bianchi Logistica",
        email: "g.bianchi@bianchilogistica.it",
        segment: "standard",
    },
    ClientRecord {
        name: "Ada Conti",
        company: "Conti Arredamenti",
        email: "ada@contiarredamenti.it",
        segment: "premium",
    },
    ClientRecord {
        name: "Luca Ferrari",
        company: "Ferrari Impianti",
        email: "luca@ferrari-impianti.it",
        segment: "trial",
    },
];

impl Capability for ClientLookup {
    fn name(&self) -> &str {
        "client_lookup"
    }

    fn description(&self) -> &str {
        "Look up a client record by name, company, or email fragment."
    }

    fn invoke(
        &self,
        args: serde_json::Value,
        _caller: CallerId,
    ) -> BoxFuture<'_, Result<CapabilityReply>> {
        Box::pin(async move {
            let input: ClientLookupInput = match serde_json::from_value(args) {
                Ok(input) => input,
                Err(e) => return Ok(CapabilityReply::failure(format!("invalid arguments: {}", e))),
            };

            let query = input.query.to_lowercase();
            debug!(query = %query, "Searching client directory");

            let hit = DIRECTORY.iter().find(|c| {
                query.contains(&c.name.to_lowercase())
                    || c.name.to_lowercase().contains(&query)
                    || c.company.to_lowercase().contains(&query)
                    || c.email.to_lowercase().contains(&query)
            });

            match hit {
                Some(client) => {
                    let mut data = serde_json::Map::new();
                    data.insert("client_name".into(), client.name.into());
                    data.insert("client_company".into(), client.company.into());
                    data.insert("client_email".into(), client.email.into());
                    data.insert("client_segment".into(), client.segment.into());
                    Ok(CapabilityReply::ok(data))
                }
                None => Ok(CapabilityReply::failure(format!(
                    "no client matching '{}'",
                    input.query
                ))),
            }
        })
    }
}
