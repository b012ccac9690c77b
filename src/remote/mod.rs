//! Remote store abstraction.
//!
//! This module defines the interface to the authoritative REST task store along
//! with its wire types and error handling. [`HttpRemote`] talks to a real server;
//! [`InMemoryRemote`] is an owned, injectable store with the same behavior.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::image::Image;
use crate::models::{Priority, Task, ValidationError};
use crate::stats::TaskStats;
use crate::utils::datetime::parse_timestamp;

pub mod http;
pub mod memory;

pub use http::HttpRemote;
pub use memory::InMemoryRemote;

/// Common error types for remote operations.
///
/// The sync engine treats every variant as "remote unavailable" for the record at hand.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Rejected before sending: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Remote store unavailable")]
    Unavailable,
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

/// Body of `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub tasks_count: usize,
}

/// A task as the remote store returns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTask {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteTask {
    /// The attached image, falling back to a legacy `photo` data URI.
    pub fn resolved_image(&self) -> Option<Image> {
        match &self.image {
            Some(image) => Some(image.clone().normalized()),
            None => self
                .photo
                .as_deref()
                .and_then(|photo| Image::from_data_uri(photo).ok()),
        }
    }

    /// Convert to a synced local task.
    ///
    /// Missing or unparsable remote timestamps fall back to `now`.
    pub fn to_task(&self, now: &str) -> Task {
        let created = self
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .and(self.created_at.clone())
            .unwrap_or_else(|| now.to_string());
        let updated = match (
            self.updated_at.as_deref().and_then(parse_timestamp),
            parse_timestamp(&created),
        ) {
            (Some(updated), Some(created_dt)) if updated >= created_dt => self.updated_at.clone(),
            (Some(_), None) => self.updated_at.clone(),
            _ => None,
        }
        .unwrap_or_else(|| created.clone());

        let mut task = Task {
            id: self.id.clone(),
            remote_id: Some(self.id.clone()),
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            priority: self.priority,
            image: self.resolved_image(),
            photo: None,
            created_at: created,
            updated_at: updated,
            synced: true,
        };
        task.refresh_photo();
        task
    }
}

/// Body of `POST /tasks` and `PUT /tasks/:id`.
///
/// Unset fields are omitted. `image: Some(None)` is sent as `null` and removes
/// the image on update.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTaskArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Option<Image>>,
    /// Legacy data URI form, used only when `image` is unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl RemoteTaskArgs {
    /// Arguments carrying the full current state of a task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            completed: Some(task.completed),
            priority: Some(task.priority),
            image: Some(task.image.clone()),
            photo: None,
        }
    }

    /// The image change carried by these arguments, resolving a legacy `photo`.
    ///
    /// `None` leaves the image alone, `Some(None)` removes it.
    ///
    /// # Errors
    /// Returns `UnsupportedImageType` if `photo` is not a base64 data URI
    pub fn image_change(&self) -> Result<Option<Option<Image>>, ValidationError> {
        match (&self.image, &self.photo) {
            (Some(image), _) => Ok(Some(image.clone().map(Image::normalized))),
            (None, Some(photo)) => Ok(Some(Some(Image::from_data_uri(photo)?))),
            (None, None) => Ok(None),
        }
    }

    /// Check the arguments the way the remote store would.
    ///
    /// # Arguments
    /// * `creating` - Whether a title is required
    pub fn validate(&self, creating: bool) -> Result<(), ValidationError> {
        match self.title.as_deref() {
            Some(title) if title.trim().is_empty() => return Err(ValidationError::MissingTitle),
            None if creating => return Err(ValidationError::MissingTitle),
            _ => {}
        }
        if let Some(Some(image)) = self.image_change()? {
            image.validate()?;
        }
        Ok(())
    }
}

/// Remote store trait that all remote implementations must implement.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns the remote type identifier (e.g., "http", "memory").
    fn remote_type(&self) -> &str;

    /// Reachability check.
    async fn health_check(&self) -> Result<HealthStatus, RemoteError>;

    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, RemoteError>;
    async fn create_task(&self, args: RemoteTaskArgs) -> Result<RemoteTask, RemoteError>;
    async fn update_task(&self, remote_id: &str, args: RemoteTaskArgs) -> Result<RemoteTask, RemoteError>;
    async fn delete_task(&self, remote_id: &str) -> Result<(), RemoteError>;
    async fn stats(&self) -> Result<TaskStats, RemoteError>;
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()).unwrap_or_default())
}
