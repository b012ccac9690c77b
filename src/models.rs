//! Domain models for task records.
//!
//! [`Task`] is the normalized form every layer above the entity tables works with.
//! [`NewTask`] and [`TaskPatch`] carry caller input for create and update.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::image::Image;

/// Errors raised synchronously for invalid caller input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Task title is required")]
    MissingTitle,

    #[error("Image is {size} bytes, larger than the {max} byte limit")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Unsupported image type: {0}")]
    UnsupportedImageType(String),

    #[error("Image data is not valid base64: {0}")]
    InvalidImageEncoding(String),

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),
}

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::InvalidPriority(other.to_string())),
        }
    }
}

/// A task record as surfaced by the local store and the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    /// Identifier the remote store confirmed for this record, if any
    pub remote_id: Option<String>,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
    pub image: Option<Image>,
    /// Ready-to-render data URI, always derived from `image`
    pub photo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub synced: bool,
}

impl Task {
    /// Whether the remote store has confirmed this record exists.
    pub fn has_remote_identity(&self) -> bool {
        self.remote_id.is_some()
    }

    /// Identifier to address this record on the remote store.
    pub fn remote_key(&self) -> &str {
        self.remote_id.as_deref().unwrap_or(&self.id)
    }

    /// Recompute `photo` from `image`.
    pub fn refresh_photo(&mut self) {
        self.photo = self.image.as_ref().map(Image::to_data_uri);
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    /// Explicit identifier; generated locally when absent
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
    pub image: Option<Image>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Check caller input and return it with the title trimmed.
    ///
    /// # Errors
    /// Returns `MissingTitle` for a blank title, or the image validation error.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.title = validate_title(&self.title)?;
        if let Some(image) = self.image.take() {
            let image = image.normalized();
            image.validate()?;
            self.image = Some(image);
        }
        Ok(self)
    }
}

/// Partial update for a task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    /// `Some(None)` removes the image
    pub image: Option<Option<Image>>,
}

impl TaskPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.image.is_none()
    }

    /// Check caller input and return it with the title trimmed.
    ///
    /// # Errors
    /// Returns `MissingTitle` when the patch blanks the title, or the image validation error.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        if let Some(title) = self.title.take() {
            self.title = Some(validate_title(&title)?);
        }
        self.image = match self.image.take() {
            Some(Some(image)) => {
                let image = image.normalized();
                image.validate()?;
                Some(Some(image))
            }
            other => other,
        };
        Ok(self)
    }

    /// Apply the patch to a task in place. Does not touch timestamps or sync state.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(image) = &self.image {
            task.image = image.clone();
        }
        task.refresh_photo();
    }
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: "1".to_string(),
            remote_id: Some("1".to_string()),
            title: "Buy milk".to_string(),
            description: String::new(),
            completed: false,
            priority: Priority::Medium,
            image: None,
            photo: None,
            created_at: "2025-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2025-01-01T00:00:00.000000Z".to_string(),
            synced: true,
        }
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
    }

    #[test]
    fn test_new_task_blank_title_rejected() {
        assert_eq!(NewTask::new("   ").validated(), Err(ValidationError::MissingTitle));
    }

    #[test]
    fn test_new_task_title_trimmed() {
        let task = NewTask::new("  Water plants ").validated().unwrap();
        assert_eq!(task.title, "Water plants");
    }

    #[test]
    fn test_patch_blank_title_rejected() {
        assert_eq!(TaskPatch::title("").validated(), Err(ValidationError::MissingTitle));
    }

    #[test]
    fn test_patch_apply_keeps_photo_consistent() {
        let mut task = sample_task();
        let image = Image::new("aGVsbG8=", "image/png");
        let patch = TaskPatch {
            image: Some(Some(image.clone())),
            ..Default::default()
        };
        patch.apply_to(&mut task);
        assert_eq!(task.photo.as_deref(), Some("data:image/png;base64,aGVsbG8="));

        let clear = TaskPatch {
            image: Some(None),
            ..Default::default()
        };
        clear.apply_to(&mut task);
        assert!(task.image.is_none());
        assert!(task.photo.is_none());
    }

    #[test]
    fn test_empty_patch() {
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch::completed(true).is_empty());
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let json = serde_json::to_value(sample_task()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("remoteId").is_some());
        assert_eq!(json["priority"], "medium");
    }
}
