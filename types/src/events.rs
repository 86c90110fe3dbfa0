use serde_json::Value;

/// A JSON message received on the avatar's data channel.
///
/// The payload shape is owned by the speech service, so only the event type is
/// pulled out; everything else is kept as raw JSON.
#[derive(Debug, Clone)]
pub struct DataChannelEvent {
    raw: Value,
}

impl DataChannelEvent {
    pub fn parse(data: &str) -> serde_json::Result<Self> {
        let raw = serde_json::from_str::<Value>(data)?;
        Ok(Self { raw })
    }

    /// `event.eventType`, e.g. `EVENT_TYPE_TURN_START`.
    pub fn event_type(&self) -> Option<&str> {
        self.raw
            .get("event")
            .and_then(|e| e.get("eventType"))
            .and_then(|v| v.as_str())
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}
