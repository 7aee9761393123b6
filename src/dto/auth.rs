use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for signing in with an email and password
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct SignInRequest {
    #[validate(email)]
    #[schema(example = "sally@example.com")]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// DTO for an established session after a successful sign-in
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct SessionResponse {
    /// Bearer token to send in the Authorization header on authenticated routes
    pub token: String,
    #[schema(example = 4)]
    pub user_id: i32,
}
