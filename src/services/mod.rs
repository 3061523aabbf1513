pub mod file_service;
pub mod user_service;

pub use file_service::{CreateFileRequest, FileService, FileServiceError, UpdateFileRequest};
pub use user_service::{UserService, UserServiceError};
