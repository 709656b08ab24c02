//! Event names and wire payloads for the Beaconpost API
//!
//! Field names in the serialized payloads are part of the backend contract
//! and must round-trip exactly; the `#[serde(rename)]` attributes are load
//! bearing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Configuration;

/// Platform constant reported in device registrations
pub const PLATFORM: &str = "rust";

/// An analytics event name
///
/// Well-known events get a variant; anything else is `Custom`. Free-form
/// strings convert directly, so `dispatcher.track("app_open", ...)` and
/// `dispatcher.track(Event::AppOpen, ...)` are equivalent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    AppOpen,
    NotificationOpened,
    Custom(String),
}

impl Event {
    pub fn name(&self) -> &str {
        match self {
            Event::AppOpen => "app_open",
            Event::NotificationOpened => "notification_opened",
            Event::Custom(name) => name,
        }
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        Event::from(name.to_string())
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        match name.as_str() {
            "app_open" => Event::AppOpen,
            "notification_opened" => Event::NotificationOpened,
            _ => Event::Custom(name),
        }
    }
}

/// Wire payload for `POST /v2/analytics/track`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Per-installation device identifier
    pub uuid: String,

    #[serde(rename = "eventName")]
    pub event_name: String,

    /// Free-form event parameters; values must be JSON-serializable
    pub parameters: HashMap<String, serde_json::Value>,

    #[serde(rename = "bundleId")]
    pub bundle_id: String,

    pub version: String,
    pub build: String,
}

impl EventPayload {
    /// Build a payload from a configuration snapshot
    pub fn new(
        config: &Configuration,
        event: &Event,
        parameters: HashMap<String, serde_json::Value>,
    ) -> Self {
        EventPayload {
            uuid: config.device_uuid.clone(),
            event_name: event.name().to_string(),
            parameters,
            bundle_id: config.bundle_id.clone(),
            version: config.version.clone(),
            build: config.build.clone(),
        }
    }
}

/// Wire payload for `POST /v2/devices/register`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePayload {
    /// Per-installation device identifier
    pub uuid: String,

    /// Push token; omitted entirely when the platform has not issued one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    pub platform: String,
    pub version: String,
    pub build: String,

    #[serde(rename = "bundleId")]
    pub bundle_id: String,

    pub production: bool,

    #[serde(rename = "notificationsEnabled")]
    pub notifications_enabled: bool,
}

impl DevicePayload {
    /// Build a payload from a configuration snapshot
    pub fn new(
        config: &Configuration,
        token: Option<String>,
        production: bool,
        notifications_enabled: bool,
    ) -> Self {
        DevicePayload {
            uuid: config.device_uuid.clone(),
            token,
            platform: PLATFORM.to_string(),
            version: config.version.clone(),
            build: config.build.clone(),
            bundle_id: config.bundle_id.clone(),
            production,
            notifications_enabled,
        }
    }
}

/// Fresh v4 UUID string, used by identifier stores creating a device id
pub fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> Configuration {
        Configuration {
            api_key: "key1".to_string(),
            bundle_id: "com.example.demo".to_string(),
            version: "1.2.0".to_string(),
            build: "42".to_string(),
            device_uuid: "device-0001".to_string(),
        }
    }

    #[test]
    fn test_event_name_sugar() {
        assert_eq!(Event::from("app_open"), Event::AppOpen);
        assert_eq!(Event::from("notification_opened"), Event::NotificationOpened);
        assert_eq!(
            Event::from("purchase_completed"),
            Event::Custom("purchase_completed".to_string())
        );
        assert_eq!(Event::Custom("purchase_completed".into()).name(), "purchase_completed");
    }

    #[test]
    fn test_event_payload_wire_field_names() {
        let mut parameters = HashMap::new();
        parameters.insert("plan".to_string(), serde_json::json!("pro"));

        let payload = EventPayload::new(&make_config(), &Event::AppOpen, parameters);
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["uuid"], "device-0001");
        assert_eq!(value["eventName"], "app_open");
        assert_eq!(value["bundleId"], "com.example.demo");
        assert_eq!(value["parameters"]["plan"], "pro");
        assert_eq!(value["version"], "1.2.0");
        assert_eq!(value["build"], "42");
        // snake_case spellings must not leak onto the wire
        assert!(value.get("event_name").is_none());
        assert!(value.get("bundle_id").is_none());
    }

    #[test]
    fn test_event_payload_round_trip() {
        let mut parameters = HashMap::new();
        parameters.insert("count".to_string(), serde_json::json!(3));
        parameters.insert("nested".to_string(), serde_json::json!({"a": [1, 2]}));

        let payload = EventPayload::new(&make_config(), &Event::Custom("sync_done".into()), parameters);
        let json = serde_json::to_string(&payload).unwrap();
        let decoded: EventPayload = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_device_payload_omits_absent_token() {
        let payload = DevicePayload::new(&make_config(), None, true, false);
        let value = serde_json::to_value(&payload).unwrap();

        assert!(value.get("token").is_none());
        assert_eq!(value["platform"], "rust");
        assert_eq!(value["production"], true);
        assert_eq!(value["notificationsEnabled"], false);
        assert_eq!(value["bundleId"], "com.example.demo");
    }

    #[test]
    fn test_device_payload_with_token_round_trips() {
        let payload = DevicePayload::new(&make_config(), Some("push-token-abc".into()), false, true);
        let json = serde_json::to_string(&payload).unwrap();
        let decoded: DevicePayload = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, payload);
        assert_eq!(decoded.token.as_deref(), Some("push-token-abc"));
    }

    #[test]
    fn test_device_payload_decodes_without_token_field() {
        let json = r#"{
            "uuid": "device-0001",
            "platform": "rust",
            "version": "1.2.0",
            "build": "42",
            "bundleId": "com.example.demo",
            "production": true,
            "notificationsEnabled": true
        }"#;
        let decoded: DevicePayload = serde_json::from_str(json).unwrap();
        assert!(decoded.token.is_none());
    }
}
