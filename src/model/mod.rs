pub mod entry;
pub mod mapping;
pub mod week;
pub mod worklog;
