use super::db::LocalStorage;
use super::error::StorageResult;
use crate::repositories::SettingRepository;

impl LocalStorage {
    pub async fn get_setting(&self, key: &str) -> StorageResult<Option<String>> {
        self.ensure_initialized()?;
        Ok(SettingRepository::get(&self.conn, key).await?)
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> StorageResult<()> {
        self.ensure_initialized()?;
        Ok(SettingRepository::set(&self.conn, key, value).await?)
    }
}
