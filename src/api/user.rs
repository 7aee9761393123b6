use crate::api::session;
use crate::domain::user::driving_ports::CreateUserError;
use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity};
use crate::routing_utils::{
    BasicErrorResponse, GenericErrorResponse, Json, NotFoundResponse, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{get, post};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

/// Builds a router for all the user routes
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            post(
                |State(app_data): AppState, Json(new_user): Json<dto::user::NewUser>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    create_user(new_user, &app_data.auth.keys, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/me",
            get(
                |State(app_data): AppState, session: session::Session| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    get_own_profile(session.user_id, &mut ext_cxn, &user_service).await
                },
            ),
        )
}

#[derive(OpenApi)]
#[openapi(paths(create_user, get_own_profile))]
pub struct UsersApi;

/// Signs up a new user, handing back a session token for them
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = inline(dto::user::NewUser),
    responses(
        (status = 201, description = "User successfully created", body = dto::user::InsertedUser),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 409, response = dto::err_resps::BasicError409),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn create_user(
    new_user: dto::user::NewUser,
    token_keys: &session::TokenKeys,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<(StatusCode, Json<dto::user::InsertedUser>), ErrorResponse> {
    info!("Attempt to create user: {new_user}");
    new_user.validate().map_err(ValidationErrorResponse::from)?;

    let user_detect = persistence::db_user_driven_ports::DbDetectUser {};
    let user_write = persistence::db_user_driven_ports::DbWriteUsers {};

    let user_to_create = domain::user::CreateUser {
        display_name: new_user.display_name,
        email: new_user.email.to_lowercase(),
        password: new_user.password,
    };
    let creation_result = user_service
        .create_user(&user_to_create, &mut *ext_cxn, &user_write, &user_detect)
        .await;
    let new_user_id = match creation_result {
        Ok(id) => id,
        Err(CreateUserError::EmailInUse) => {
            return Err((
                StatusCode::CONFLICT,
                Json(BasicErrorResponse::new(
                    "email_in_use",
                    "A user with the provided email address already exists.",
                )),
            )
                .into());
        }
        Err(CreateUserError::PortError(port_err)) => {
            error!("User create failure: {port_err}");
            return Err(GenericErrorResponse(port_err).into());
        }
    };

    let token = session::mint_token(token_keys, new_user_id).map_err(GenericErrorResponse)?;
    Ok((
        StatusCode::CREATED,
        Json(dto::user::InsertedUser {
            id: new_user_id,
            token,
        }),
    ))
}

/// Retrieves the profile of the signed-in user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "The signed-in user's profile", body = dto::user::TodoUser),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_own_profile(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<Json<dto::user::TodoUser>, ErrorResponse> {
    let user_read = persistence::db_user_driven_ports::DbReadUsers {};

    let profile = user_service
        .user_by_id(user_id, &mut *ext_cxn, &user_read)
        .await
        .map_err(GenericErrorResponse)?;
    let Some(profile) = profile else {
        // The token outlived the account
        return Err(NotFoundResponse.into());
    };

    Ok(Json(profile.into()))
}
