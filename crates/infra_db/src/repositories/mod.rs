//! Repository implementations
//!
//! Each repository owns the SQL for one group of tables and returns plain
//! row structs. Conversion to domain types happens in [`crate::adapters`].

pub mod directory;
pub mod fees;
pub mod notifications;
pub mod reminders;

pub use directory::DirectoryRepository;
pub use fees::FeeRepository;
pub use notifications::NotificationRepository;
pub use reminders::ReminderRuleRepository;
