pub mod setting;
pub mod task;
pub mod tombstone;

pub use setting::Entity as Setting;
pub use task::Entity as Task;
pub use tombstone::Entity as Tombstone;
