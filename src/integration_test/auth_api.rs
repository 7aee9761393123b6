use super::test_util::{prepare_db_and_test, send_request, test_router};
use crate::api::test_util::deserialize_body;
use crate::dto;
use axum::http::{Method, StatusCode};
use serde_json::json;

async fn sign_up(router: axum::Router) -> dto::user::InsertedUser {
    let sign_up_response = send_request(
        router,
        Method::POST,
        "/users",
        None,
        Some(json!({
            "display_name": "Sally Sample",
            "email": "sally@example.com",
            "password": "correct horse battery staple",
            "confirm_password": "correct horse battery staple",
        })),
    )
    .await;
    assert_eq!(StatusCode::CREATED, sign_up_response.status());

    deserialize_body(sign_up_response.into_body()).await
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn can_sign_in_with_the_right_password() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);
        let created = sign_up(router.clone()).await;

        let sign_in_response = send_request(
            router.clone(),
            Method::POST,
            "/auth/sign-in",
            None,
            Some(json!({
                "email": "Sally@Example.com",
                "password": "correct horse battery staple",
            })),
        )
        .await;
        assert_eq!(StatusCode::OK, sign_in_response.status());
        let established_session: dto::auth::SessionResponse =
            deserialize_body(sign_in_response.into_body()).await;
        assert_eq!(created.id, established_session.user_id);

        // The token from sign-in should work on authenticated routes
        let profile_response = send_request(
            router,
            Method::GET,
            "/users/me",
            Some(&established_session.token),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, profile_response.status());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn wrong_password_gets_rejected() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);
        sign_up(router.clone()).await;

        let sign_in_response = send_request(
            router,
            Method::POST,
            "/auth/sign-in",
            None,
            Some(json!({
                "email": "sally@example.com",
                "password": "not the passphrase",
            })),
        )
        .await;

        assert_eq!(StatusCode::UNAUTHORIZED, sign_in_response.status());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn unknown_emails_get_the_same_rejection() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);

        let sign_in_response = send_request(
            router,
            Method::POST,
            "/auth/sign-in",
            None,
            Some(json!({
                "email": "nobody@example.com",
                "password": "correct horse battery staple",
            })),
        )
        .await;

        assert_eq!(StatusCode::UNAUTHORIZED, sign_in_response.status());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn github_sign_in_responds_unavailable_when_unconfigured() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);

        let redirect_response =
            send_request(router, Method::GET, "/auth/github", None, None).await;

        assert_eq!(StatusCode::SERVICE_UNAVAILABLE, redirect_response.status());
    });
}
