//! Stored task rows.
//!
//! Columns that older client versions wrote inconsistently are nullable here so a
//! drifted row still decodes; `storage::normalize` turns a row into a valid `Task`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub remote_id: Option<String>,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// 0 or 1; anything else is treated as not completed
    pub completed: Option<i32>,
    pub priority: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_data: Option<String>,
    pub image_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub photo: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[sea_orm(indexed)]
    pub synced: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
