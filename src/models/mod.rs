pub mod file;
pub mod session;
pub mod user;

pub use file::{FileListResponse, StoredFile, UploadResponse};
pub use session::Session;
pub use user::{CreateUserRequest, LoginRequest, LoginResponse, StorageResponse, User, UserContext};
