use serde::{Deserialize, Serialize};

/// Console user performing an edit, recorded in audit stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    user_id: i64,
    login: String,
}

impl Actor {
    /// Creates an actor from the authenticated console user.
    #[must_use]
    pub fn new(user_id: i64, login: impl Into<String>) -> Self {
        Self {
            user_id,
            login: login.into(),
        }
    }

    /// Returns the numeric user identifier written to `createdBy`/`modifiedBy`.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Returns the login name for log output.
    #[must_use]
    pub fn login(&self) -> &str {
        self.login.as_str()
    }
}
