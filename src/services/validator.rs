use crate::errors::ValidationError;
use serde_json::Value;

/// Device classes accepted when no list is configured.
pub const DEFAULT_DEVICE_TYPES: &[&str] = &["sensor", "gateway", "actuator", "controller", "tracker"];

const DEVICE_TYPE_KEYS: &[&str] = &["deviceType", "device_type"];

/// A payload that passed validation, normalized to a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPayload {
    pub document: Value,
    pub device_type: Option<String>,
}

/// Structural checks on submitted configuration payloads.
///
/// Only two things are enforced: the payload must be a structured document
/// (object or array), and a `deviceType` discriminator, when present, must
/// name a known device class. Everything else is left to the device.
#[derive(Debug, Clone)]
pub struct ConfigValidator {
    device_types: Vec<String>,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_TYPES.iter().map(|t| t.to_string()).collect())
    }
}

impl ConfigValidator {
    pub fn new(device_types: Vec<String>) -> Self {
        let device_types = device_types
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { device_types }
    }

    pub fn validate(&self, payload: &Value) -> Result<ParsedPayload, ValidationError> {
        let document = match payload {
            Value::String(raw) => serde_json::from_str::<Value>(raw)
                .map_err(|err| ValidationError::MalformedPayload(err.to_string()))?,
            other => other.clone(),
        };

        if !(document.is_object() || document.is_array()) {
            return Err(ValidationError::MalformedPayload(
                "payload must be a JSON object or array".to_string(),
            ));
        }

        let device_type = self.device_type(&document)?;

        Ok(ParsedPayload {
            document,
            device_type,
        })
    }

    fn device_type(&self, document: &Value) -> Result<Option<String>, ValidationError> {
        let Some(object) = document.as_object() else {
            return Ok(None);
        };

        for key in DEVICE_TYPE_KEYS {
            let Some(value) = object.get(*key) else {
                continue;
            };
            let name = value
                .as_str()
                .ok_or_else(|| ValidationError::UnsupportedDeviceType(value.to_string()))?;
            let normalized = name.trim().to_lowercase();
            if !self.device_types.contains(&normalized) {
                return Err(ValidationError::UnsupportedDeviceType(name.to_string()));
            }
            return Ok(Some(normalized));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_arbitrary_structure() {
        let validator = ConfigValidator::default();
        let parsed = validator
            .validate(&json!({"interval": 3600, "thresholds": {"temp": [10, 40]}}))
            .unwrap();
        assert_eq!(parsed.device_type, None);
        assert_eq!(parsed.document["interval"], 3600);

        assert!(validator.validate(&json!([1, 2, 3])).is_ok());
    }

    #[test]
    fn parses_serialized_documents() {
        let validator = ConfigValidator::default();
        let parsed = validator
            .validate(&json!("{\"deviceType\": \"Gateway\", \"uplink\": \"lte\"}"))
            .unwrap();
        assert_eq!(parsed.device_type.as_deref(), Some("gateway"));
        assert_eq!(parsed.document["uplink"], "lte");
    }

    #[test]
    fn rejects_unparseable_and_scalar_payloads() {
        let validator = ConfigValidator::default();
        for payload in [json!("{not json"), json!(42), json!(null), json!("\"text\"")] {
            match validator.validate(&payload) {
                Err(ValidationError::MalformedPayload(_)) => {}
                other => panic!("expected malformed for {}, got {:?}", payload, other),
            }
        }
    }

    #[test]
    fn rejects_unknown_device_class() {
        let validator = ConfigValidator::default();
        assert_eq!(
            validator.validate(&json!({"device_type": "toaster"})),
            Err(ValidationError::UnsupportedDeviceType("toaster".to_string()))
        );
        assert!(matches!(
            validator.validate(&json!({"deviceType": 7})),
            Err(ValidationError::UnsupportedDeviceType(_))
        ));
    }

    #[test]
    fn device_classes_are_configurable() {
        let validator = ConfigValidator::new(vec!["Meter".to_string(), " ".to_string()]);
        assert!(validator.validate(&json!({"deviceType": "meter"})).is_ok());
        assert!(validator.validate(&json!({"deviceType": "sensor"})).is_err());
    }
}
