use super::test_util::{prepare_db_and_test, send_request, test_router};
use crate::api::test_util::deserialize_body;
use crate::dto;
use axum::http::{Method, StatusCode};
use serde_json::json;

fn sign_up_body() -> serde_json::Value {
    json!({
        "display_name": "Sally Sample",
        "email": "sally@example.com",
        "password": "correct horse battery staple",
        "confirm_password": "correct horse battery staple",
    })
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn can_sign_up_and_fetch_profile() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);

        let sign_up_response = send_request(
            router.clone(),
            Method::POST,
            "/users",
            None,
            Some(sign_up_body()),
        )
        .await;
        assert_eq!(StatusCode::CREATED, sign_up_response.status());
        let created: dto::user::InsertedUser =
            deserialize_body(sign_up_response.into_body()).await;

        let profile_response = send_request(
            router,
            Method::GET,
            "/users/me",
            Some(&created.token),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, profile_response.status());
        let profile: dto::user::TodoUser = deserialize_body(profile_response.into_body()).await;

        assert_eq!(created.id, profile.id);
        assert_eq!("sally@example.com", profile.email);
        assert_eq!("Sally Sample", profile.display_name);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn duplicate_emails_get_rejected() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);

        let first_response = send_request(
            router.clone(),
            Method::POST,
            "/users",
            None,
            Some(sign_up_body()),
        )
        .await;
        assert_eq!(StatusCode::CREATED, first_response.status());

        // Same email with different casing still counts as taken
        let second_sign_up = json!({
            "display_name": "Sally Again",
            "email": "Sally@Example.com",
            "password": "a different passphrase",
            "confirm_password": "a different passphrase",
        });
        let second_response =
            send_request(router, Method::POST, "/users", None, Some(second_sign_up)).await;

        assert_eq!(StatusCode::CONFLICT, second_response.status());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn profile_requires_a_token() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);

        let profile_response = send_request(router, Method::GET, "/users/me", None, None).await;

        assert_eq!(StatusCode::UNAUTHORIZED, profile_response.status());
    });
}
