use chrono::{Datelike, Duration, Utc, Weekday};
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use corso_core::error::Result;
use corso_core::traits::Capability;
use corso_core::types::{CallerId, CapabilityReply};

/// Book a meeting slot with a client.
pub struct ScheduleMeeting;

#[derive(Deserialize)]
struct ScheduleMeetingInput {
    client_name: String,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default = "default_duration")]
    duration_minutes: u64,
}

fn default_duration() -> u64 {
    30
}

impl Capability for ScheduleMeeting {
    fn name(&self) -> &str {
        "schedule_meeting"
    }

    fn description(&self) -> &str {
        "Book the next free slot with a client and return a booking reference."
    }

    fn invoke(
        &self,
        args: serde_json::Value,
        caller: CallerId,
    ) -> BoxFuture<'_, Result<CapabilityReply>> {
        Box::pin(async move {
            let input: ScheduleMeetingInput = match serde_json::from_value(args) {
                Ok(input) => input,
                Err(e) => return Ok(CapabilityReply::failure(format!("invalid arguments: {}", e))),
            };

            if input.client_name.trim().is_empty() {
                return Ok(CapabilityReply::failure("client_name must not be empty"));
            }

            // Demo scheduler: next business day at 10:00 UTC.
            let mut day = Utc::now().date_naive() + Duration::days(1);
            while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                day = day + Duration::days(1);
            }
            let slot = day
                .and_hms_opt(10, 0, 0)
                .expect("10:00:00 is a valid time")
                .and_utc();
            let booking_ref = Uuid::new_v4().to_string();

            debug!(
                client = %input.client_name,
                caller = %caller,
                slot = %slot,
                "Booked meeting slot"
            );

            let mut data = serde_json::Map::new();
            data.insert("client_name".into(), input.client_name.into());
            data.insert("meeting_time".into(), slot.to_rfc3339().into());
            data.insert("duration_minutes".into(), input.duration_minutes.into());
            data.insert("booking_ref".into(), booking_ref.into());
            if let Some(topic) = input.topic {
                data.insert("topic".into(), topic.into());
            }
            Ok(CapabilityReply::ok(data))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schedule_returns_slot_and_reference() {
        let reply = ScheduleMeeting
            .invoke(
                serde_json::json!({"client_name": "Mario Rossi", "topic": "renewal"}),
                CallerId::from_str("t"),
            )
            .await
            .unwrap();
        assert!(reply.success);
        assert!(reply.field("booking_ref").unwrap().as_str().unwrap().len() > 10);
        assert_eq!(reply.field("duration_minutes"), Some(&serde_json::json!(30)));
        assert_eq!(reply.field("topic"), Some(&serde_json::json!("renewal")));
    }

    #[tokio::test]
    async fn test_empty_client_name_fails() {
        let reply = ScheduleMeeting
            .invoke(serde_json::json!({"client_name": "  "}), CallerId::from_str("t"))
            .await
            .unwrap();
        assert!(!reply.success);
    }
}
