//! Docker Engine API Type Definitions
//!
//! Only the subset of `GET /volumes` needed for size collection is modelled.
//! Unknown fields are ignored, and `null` collections from the API are
//! treated as empty.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

pub const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
pub const COMPOSE_VOLUME_LABEL: &str = "com.docker.compose.volume";

/// A named volume as reported by the container runtime
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Volume {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Mountpoint")]
    pub mount_point: String,
    #[serde(rename = "Labels", default, deserialize_with = "null_as_default")]
    pub labels: HashMap<String, String>,
}

impl Volume {
    pub fn new(name: impl Into<String>, mount_point: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mount_point: mount_point.into(),
            labels: HashMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Label lookup where a missing key reads as the empty string
    pub fn label(&self, key: &str) -> &str {
        self.labels.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Response body of `GET /volumes`
#[derive(Debug, Default, Deserialize)]
pub struct VolumeListResponse {
    #[serde(rename = "Volumes", default, deserialize_with = "null_as_default")]
    pub volumes: Vec<Volume>,
    #[serde(rename = "Warnings", default, deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,
}

/// Error body returned by the Engine API on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
