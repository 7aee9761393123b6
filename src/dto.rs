pub mod auth;
pub mod task;
pub mod user;

use utoipa::OpenApi;

/// Reusable OpenAPI error response documentation for the handlers in [api][crate::api]
pub mod err_resps {
    use crate::routing_utils::BasicErrorResponse;
    use utoipa::ToResponse;

    #[derive(ToResponse)]
    #[response(
        description = "Submitted data was invalid",
        example = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": {
                "title": [
                    {
                        "code": "length",
                        "message": null,
                        "params": { "value": "", "min": 1 }
                    }
                ]
            }
        })
    )]
    pub struct BasicError400(#[to_schema] BasicErrorResponse);

    #[derive(ToResponse)]
    #[response(
        description = "A valid bearer token is required",
        example = json!({
            "error_code": "unauthenticated",
            "error_description": "A valid bearer token is required to access this resource.",
            "extra_info": null
        })
    )]
    pub struct BasicError401(#[to_schema] BasicErrorResponse);

    #[derive(ToResponse)]
    #[response(
        description = "Entity could not be found",
        example = json!({
            "error_code": "not_found",
            "error_description": "The requested entity could not be found.",
            "extra_info": null
        })
    )]
    pub struct BasicError404(#[to_schema] BasicErrorResponse);

    #[derive(ToResponse)]
    #[response(
        description = "The request conflicts with existing data",
        example = json!({
            "error_code": "email_in_use",
            "error_description": "A user with the provided email address already exists.",
            "extra_info": null
        })
    )]
    pub struct BasicError409(#[to_schema] BasicErrorResponse);

    #[derive(ToResponse)]
    #[response(
        description = "Something unexpected went wrong inside the server",
        example = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )]
    pub struct BasicError500(#[to_schema] BasicErrorResponse);
}

/// Registers the schemas and reusable responses shared across API modules
#[derive(OpenApi)]
#[openapi(components(
    schemas(
        crate::routing_utils::BasicErrorResponse,
        crate::routing_utils::ExtraInfo,
        crate::routing_utils::ValidationErrorSchema,
        auth::SignInRequest,
        auth::SessionResponse,
        task::TodoTask,
        task::NewTask,
        task::UpdateTask,
        task::SetTaskCompletion,
        task::InsertedTask,
        task::TaskStatusFilter,
        user::TodoUser,
        user::NewUser,
        user::InsertedUser,
    ),
    responses(
        err_resps::BasicError400,
        err_resps::BasicError401,
        err_resps::BasicError404,
        err_resps::BasicError409,
        err_resps::BasicError500,
    )
))]
pub struct OpenApiSchemas;
