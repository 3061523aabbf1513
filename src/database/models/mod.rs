pub mod file;
pub mod user;

pub use file::File;
pub use user::User;
