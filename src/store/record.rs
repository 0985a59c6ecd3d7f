use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device_id: String,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

impl DeviceRecord {
    pub fn new(device_id: impl Into<String>, value: Value) -> Self {
        Self {
            device_id: device_id.into(),
            value,
            updated_at: Utc::now(),
        }
    }
}
