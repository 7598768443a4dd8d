//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists.

/// Create a user account.
#[derive(Clone, Debug)]
pub struct NewUserCmd {
    pub dpi: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role_id: i32,
}

impl NewUserCmd {
    #[must_use]
    pub fn new(
        dpi: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        role_id: i32,
    ) -> Self {
        Self {
            dpi: dpi.into(),
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role_id,
        }
    }
}
