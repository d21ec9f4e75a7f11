pub mod decode;
pub mod model;
pub mod service;

pub use service::BackupService;
