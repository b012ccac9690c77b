//! Read-time repair of stored rows.
//!
//! Rows written by older versions may carry missing timestamps, out-of-range flags,
//! unknown priorities or half-written image columns. [`normalize`] maps any row to a
//! valid [`Task`] and reports whether something had to change, so the caller can write
//! the repaired form back.

use crate::entities::task;
use crate::image::{is_supported_type, Image};
use crate::models::{Priority, Task};
use crate::utils::datetime::parse_timestamp;
use crate::utils::id::generate_local_id;

/// Title given to rows that lost theirs
pub const UNTITLED: &str = "(untitled)";

/// A normalized row and whether it differed from what was stored
#[derive(Debug, Clone)]
pub struct Normalized {
    pub task: Task,
    pub repaired: bool,
}

/// Turn a stored row into a valid task.
///
/// # Arguments
/// * `model` - The row as read from the database
/// * `now` - Timestamp used when the row has no usable creation time
pub fn normalize(model: task::Model, now: &str) -> Normalized {
    let mut repaired = false;

    let id = if model.id.trim().is_empty() {
        repaired = true;
        generate_local_id()
    } else {
        model.id
    };

    let remote_id = match model.remote_id {
        Some(remote_id) if remote_id.trim().is_empty() => {
            repaired = true;
            None
        }
        other => other,
    };

    let title = if model.title.trim().is_empty() {
        repaired = true;
        UNTITLED.to_string()
    } else {
        model.title
    };

    let completed = match model.completed {
        Some(1) => true,
        Some(0) => false,
        _ => {
            repaired = true;
            false
        }
    };

    let priority = match model.priority.as_deref().map(str::parse::<Priority>) {
        Some(Ok(priority)) => {
            if model.priority.as_deref() != Some(priority.as_str()) {
                repaired = true;
            }
            priority
        }
        _ => {
            repaired = true;
            Priority::default()
        }
    };

    let created = model.created_at.as_deref().and_then(parse_timestamp);
    let created_at = match (created, model.created_at) {
        (Some(_), Some(raw)) => raw,
        _ => {
            repaired = true;
            now.to_string()
        }
    };
    let created = parse_timestamp(&created_at);

    let updated = model.updated_at.as_deref().and_then(parse_timestamp);
    let updated_at = match (updated, model.updated_at) {
        (Some(updated), Some(raw)) if created.map_or(true, |created| updated >= created) => raw,
        _ => {
            repaired = true;
            created_at.clone()
        }
    };

    let image = match (model.image_data, model.image_type) {
        (Some(data), Some(mime_type)) => {
            let image = Image::new(data.clone(), mime_type.clone());
            if !is_supported_type(&image.mime_type) {
                repaired = true;
                None
            } else {
                if image.data != data || image.mime_type != mime_type {
                    repaired = true;
                }
                Some(image)
            }
        }
        (None, None) => match model.photo.as_deref().map(Image::from_data_uri) {
            // Rows from before the image columns existed only carried the data URI
            Some(Ok(image)) if is_supported_type(&image.mime_type) => {
                repaired = true;
                Some(image)
            }
            Some(_) => {
                repaired = true;
                None
            }
            None => None,
        },
        _ => {
            repaired = true;
            None
        }
    };

    let mut task = Task {
        id,
        remote_id,
        title,
        description: model.description.unwrap_or_default(),
        completed,
        priority,
        image,
        photo: None,
        created_at,
        updated_at,
        synced: model.synced,
    };
    task.refresh_photo();
    if task.photo != model.photo {
        repaired = true;
    }

    Normalized { task, repaired }
}

/// Row form of a task.
impl From<&Task> for task::ActiveModel {
    fn from(task: &Task) -> Self {
        use sea_orm::ActiveValue::Set;

        task::ActiveModel {
            id: Set(task.id.clone()),
            remote_id: Set(task.remote_id.clone()),
            title: Set(task.title.clone()),
            description: Set(Some(task.description.clone())),
            completed: Set(Some(i32::from(task.completed))),
            priority: Set(Some(task.priority.as_str().to_string())),
            image_data: Set(task.image.as_ref().map(|image| image.data.clone())),
            image_type: Set(task.image.as_ref().map(|image| image.mime_type.clone())),
            photo: Set(task.photo.clone()),
            created_at: Set(Some(task.created_at.clone())),
            updated_at: Set(Some(task.updated_at.clone())),
            synced: Set(task.synced),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2025-06-01T12:00:00.000000Z";
    const EARLIER: &str = "2025-05-01T08:00:00.000000Z";

    fn clean_row() -> task::Model {
        task::Model {
            id: "local-1".to_string(),
            remote_id: None,
            title: "Buy milk".to_string(),
            description: Some("2 liters".to_string()),
            completed: Some(0),
            priority: Some("high".to_string()),
            image_data: None,
            image_type: None,
            photo: None,
            created_at: Some(EARLIER.to_string()),
            updated_at: Some(EARLIER.to_string()),
            synced: false,
        }
    }

    #[test]
    fn test_clean_row_is_untouched() {
        let normalized = normalize(clean_row(), NOW);
        assert!(!normalized.repaired);
        assert_eq!(normalized.task.priority, Priority::High);
        assert_eq!(normalized.task.created_at, EARLIER);
        assert_eq!(normalized.task.description, "2 liters");
    }

    #[test]
    fn test_missing_created_at_uses_now() {
        let row = task::Model {
            created_at: None,
            updated_at: None,
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        assert_eq!(normalized.task.created_at, NOW);
        assert_eq!(normalized.task.updated_at, NOW);
    }

    #[test]
    fn test_unparsable_created_at_uses_now() {
        let row = task::Model {
            created_at: Some("yesterday".to_string()),
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        assert_eq!(normalized.task.created_at, NOW);
    }

    #[test]
    fn test_missing_updated_at_copies_created_at() {
        let row = task::Model {
            updated_at: None,
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        assert_eq!(normalized.task.updated_at, EARLIER);
    }

    #[test]
    fn test_updated_before_created_is_clamped() {
        let row = task::Model {
            created_at: Some(NOW.to_string()),
            updated_at: Some(EARLIER.to_string()),
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        assert_eq!(normalized.task.updated_at, NOW);
    }

    #[test]
    fn test_out_of_range_completed_flag() {
        for value in [None, Some(2), Some(-1)] {
            let row = task::Model {
                completed: value,
                ..clean_row()
            };
            let normalized = normalize(row, NOW);
            assert!(normalized.repaired, "completed = {value:?}");
            assert!(!normalized.task.completed);
        }

        let done = normalize(
            task::Model {
                completed: Some(1),
                ..clean_row()
            },
            NOW,
        );
        assert!(!done.repaired);
        assert!(done.task.completed);
    }

    #[test]
    fn test_unknown_priority_becomes_medium() {
        let row = task::Model {
            priority: Some("urgent".to_string()),
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        assert_eq!(normalized.task.priority, Priority::Medium);
    }

    #[test]
    fn test_uppercase_priority_rewritten_canonical() {
        let row = task::Model {
            priority: Some("HIGH".to_string()),
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        assert_eq!(normalized.task.priority, Priority::High);
    }

    #[test]
    fn test_empty_id_is_synthesized() {
        let row = task::Model {
            id: String::new(),
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        assert!(normalized.task.id.starts_with(crate::constants::LOCAL_ID_PREFIX));
    }

    #[test]
    fn test_unsupported_image_type_dropped() {
        let row = task::Model {
            image_data: Some("aGVsbG8=".to_string()),
            image_type: Some("application/pdf".to_string()),
            photo: Some("data:application/pdf;base64,aGVsbG8=".to_string()),
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        assert!(normalized.task.image.is_none());
        assert!(normalized.task.photo.is_none());
    }

    #[test]
    fn test_prefixed_image_data_is_stripped() {
        let row = task::Model {
            image_data: Some("data:image/png;base64,aGVsbG8=".to_string()),
            image_type: Some("image/png".to_string()),
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        let image = normalized.task.image.unwrap();
        assert_eq!(image.data, "aGVsbG8=");
        assert_eq!(normalized.task.photo.as_deref(), Some("data:image/png;base64,aGVsbG8="));
    }

    #[test]
    fn test_legacy_photo_only_row_recovers_image() {
        let row = task::Model {
            photo: Some("data:image/jpeg;base64,/9j/4AAQ".to_string()),
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        let image = normalized.task.image.unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "/9j/4AAQ");
    }

    #[test]
    fn test_consistent_image_row_is_untouched() {
        let row = task::Model {
            image_data: Some("aGVsbG8=".to_string()),
            image_type: Some("image/png".to_string()),
            photo: Some("data:image/png;base64,aGVsbG8=".to_string()),
            ..clean_row()
        };
        assert!(!normalize(row, NOW).repaired);
    }

    #[test]
    fn test_blank_title_replaced() {
        let row = task::Model {
            title: "  ".to_string(),
            ..clean_row()
        };
        let normalized = normalize(row, NOW);
        assert!(normalized.repaired);
        assert_eq!(normalized.task.title, UNTITLED);
    }

    #[test]
    fn test_active_model_roundtrip_is_clean() {
        let task = normalize(clean_row(), NOW).task;
        let model = task::Model {
            id: task.id.clone(),
            remote_id: task.remote_id.clone(),
            title: task.title.clone(),
            description: Some(task.description.clone()),
            completed: Some(i32::from(task.completed)),
            priority: Some(task.priority.as_str().to_string()),
            image_data: None,
            image_type: None,
            photo: None,
            created_at: Some(task.created_at.clone()),
            updated_at: Some(task.updated_at.clone()),
            synced: task.synced,
        };
        let active = task::ActiveModel::from(&task);
        assert_eq!(active.title, sea_orm::ActiveValue::Set(model.title.clone()));
        assert!(!normalize(model, NOW).repaired);
    }
}
