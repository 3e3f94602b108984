pub mod jwt;
pub mod password;

pub use jwt::{Claims, SessionClaim, TokenService};
pub use password::PasswordService;
