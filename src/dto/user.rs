use crate::domain;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// DTO for a user profile returned by the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TodoUser {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "sally@example.com")]
    pub email: String,
    #[schema(example = "Sally Sample")]
    pub display_name: String,
}

impl From<domain::user::TodoUser> for TodoUser {
    fn from(value: domain::user::TodoUser) -> Self {
        TodoUser {
            id: value.id,
            email: value.email,
            display_name: value.display_name,
        }
    }
}

/// DTO for signing up via the API
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{display_name} ({email})")]
#[cfg_attr(test, derive(Serialize, Clone))]
#[validate(schema(function = "passwords_match"))]
pub struct NewUser {
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "Sally Sample")]
    pub display_name: String,
    #[validate(email, length(max = 100))]
    #[schema(example = "sally@example.com")]
    pub email: String,
    #[validate(length(min = 8, max = 100))]
    pub password: String,
    pub confirm_password: String,
}

fn passwords_match(user: &NewUser) -> Result<(), ValidationError> {
    if user.password != user.confirm_password {
        return Err(ValidationError::new("passwords_must_match"));
    }

    Ok(())
}

/// DTO for the ID and session token handed out after a successful sign-up
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct InsertedUser {
    #[schema(example = 10)]
    pub id: i32,
    /// Bearer token for the freshly created user's session
    pub token: String,
}
