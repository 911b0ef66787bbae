//! Phone record
//!
//! The entity persisted by the record store and snapshotted into the cache.
//! Apart from `id`, `imei` and `version`, its fields are opaque to the
//! cache-aside layer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// == Phone ==
/// A registered mobile device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
    /// Primary identifier, assigned by the store on first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub short_name: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    /// Device identifier, unique across records when present
    pub imei: Option<String>,
    pub phone_number: Option<String>,
    pub support_email: Option<String>,
    pub has_ios: Option<bool>,
    /// Store-assigned write stamp, strictly increasing across all saves
    #[serde(default)]
    pub version: u64,
}

impl Phone {
    /// Returns the IMEI if the record is eligible for caching.
    pub fn secondary_key(&self) -> Option<&str> {
        self.imei.as_deref().filter(|imei| !imei.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secondary_key_present() {
        let phone = Phone {
            imei: Some("356938035643809".to_string()),
            ..Default::default()
        };
        assert_eq!(phone.secondary_key(), Some("356938035643809"));
    }

    #[test]
    fn test_secondary_key_empty_is_none() {
        let phone = Phone {
            imei: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(phone.secondary_key(), None);
        assert_eq!(Phone::default().secondary_key(), None);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "name": "Galaxy",
            "shortName": "GS",
            "createdAt": "2024-03-01T10:15:00",
            "imei": "356938035643809",
            "hasIos": false
        }"#;
        let phone: Phone = serde_json::from_str(json).unwrap();
        assert_eq!(phone.short_name.as_deref(), Some("GS"));
        assert_eq!(phone.has_ios, Some(false));
        assert!(phone.id.is_none());
        assert_eq!(phone.version, 0);
    }
}
