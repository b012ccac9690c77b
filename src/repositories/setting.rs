//! Settings repository for database operations.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait};

use crate::entities::setting;

/// Repository for persisted key/value settings.
pub struct SettingRepository;

impl SettingRepository {
    /// Get a setting value by key.
    pub async fn get<C>(conn: &C, key: &str) -> Result<Option<String>, DbErr>
    where
        C: ConnectionTrait,
    {
        Ok(setting::Entity::find_by_id(key.to_string())
            .one(conn)
            .await?
            .map(|s| s.value))
    }

    /// Insert or overwrite a setting.
    pub async fn set<C>(conn: &C, key: &str, value: &str) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        use sea_orm::sea_query::OnConflict;
        let model = setting::ActiveModel {
            key: sea_orm::ActiveValue::Set(key.to_string()),
            value: sea_orm::ActiveValue::Set(value.to_string()),
        };
        setting::Entity::insert(model)
            .on_conflict(
                OnConflict::column(setting::Column::Key)
                    .update_column(setting::Column::Value)
                    .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }
}
