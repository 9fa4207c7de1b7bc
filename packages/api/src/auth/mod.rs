//! Authentication: the session-backed identity guard and local accounts.

mod accounts;
mod password;
mod session;

pub use accounts::{current_user, login, register, LoginInput, RegisterInput};
pub use password::{hash_password, verify_password};
pub use session::{resolve, sign_in, sign_out, CurrentUser, Identity, SESSION_USER_ID_KEY};
