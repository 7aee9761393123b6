use super::test_util::{prepare_db_and_test, send_request, test_router};
use crate::api::test_util::deserialize_body;
use crate::dto;
use axum::Router;
use axum::http::{Method, StatusCode};
use serde_json::json;

async fn sign_up_for_token(router: Router) -> String {
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
    let created: dto::user::InsertedUser = deserialize_body(sign_up_response.into_body()).await;

    created.token
}

async fn create_task(router: Router, token: &str, body: serde_json::Value) -> i32 {
    let create_response =
        send_request(router, Method::POST, "/todos", Some(token), Some(body)).await;
    assert_eq!(StatusCode::CREATED, create_response.status());
    let created: dto::task::InsertedTask = deserialize_body(create_response.into_body()).await;

    created.id
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn tasks_can_be_created_and_nested() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);
        let token = sign_up_for_token(router.clone()).await;

        let parent_id = create_task(
            router.clone(),
            &token,
            json!({
                "title": "Water the plants",
                "priority": 2,
            }),
        )
        .await;
        let child_id = create_task(
            router.clone(),
            &token,
            json!({
                "title": "Refill the watering can",
                "parent_id": parent_id,
            }),
        )
        .await;

        let list_response =
            send_request(router.clone(), Method::GET, "/todos", Some(&token), None).await;
        assert_eq!(StatusCode::OK, list_response.status());
        let tasks: Vec<dto::task::TodoTask> = deserialize_body(list_response.into_body()).await;

        assert_eq!(1, tasks.len());
        assert_eq!(parent_id, tasks[0].id);
        assert_eq!(1, tasks[0].children.len());
        assert_eq!(child_id, tasks[0].children[0].id);

        let get_response = send_request(
            router,
            Method::GET,
            format!("/todos/{child_id}").as_str(),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, get_response.status());
        let child_task: dto::task::TodoTask = deserialize_body(get_response.into_body()).await;
        assert_eq!(Some(parent_id), child_task.parent_id);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn completion_moves_a_task_between_filters() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);
        let token = sign_up_for_token(router.clone()).await;

        let task_id = create_task(
            router.clone(),
            &token,
            json!({ "title": "Water the plants" }),
        )
        .await;

        let completion_response = send_request(
            router.clone(),
            Method::PATCH,
            format!("/todos/{task_id}/complete").as_str(),
            Some(&token),
            Some(json!({ "is_complete": true })),
        )
        .await;
        assert_eq!(StatusCode::OK, completion_response.status());

        let upcoming_response = send_request(
            router.clone(),
            Method::GET,
            "/todos?filter=upcoming",
            Some(&token),
            None,
        )
        .await;
        let upcoming: Vec<dto::task::TodoTask> =
            deserialize_body(upcoming_response.into_body()).await;
        assert!(upcoming.is_empty());

        let completed_response = send_request(
            router,
            Method::GET,
            "/todos?filter=completed",
            Some(&token),
            None,
        )
        .await;
        let completed: Vec<dto::task::TodoTask> =
            deserialize_body(completed_response.into_body()).await;
        assert_eq!(1, completed.len());
        assert_eq!(task_id, completed[0].id);
        assert!(completed[0].is_complete);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn updates_replace_a_tasks_content() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);
        let token = sign_up_for_token(router.clone()).await;

        let task_id = create_task(
            router.clone(),
            &token,
            json!({ "title": "Water the plants" }),
        )
        .await;

        let update_response = send_request(
            router.clone(),
            Method::PATCH,
            format!("/todos/{task_id}").as_str(),
            Some(&token),
            Some(json!({
                "title": "Water the balcony plants",
                "description": "The succulents can wait",
                "is_complete": false,
                "due_date": "2024-06-20",
                "priority": 3,
                "parent_id": null,
            })),
        )
        .await;
        assert_eq!(StatusCode::OK, update_response.status());

        let get_response = send_request(
            router,
            Method::GET,
            format!("/todos/{task_id}").as_str(),
            Some(&token),
            None,
        )
        .await;
        let updated_task: dto::task::TodoTask = deserialize_body(get_response.into_body()).await;

        assert_eq!("Water the balcony plants", updated_task.title);
        assert_eq!(Some(3), updated_task.priority);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn deleting_a_task_takes_its_children_with_it() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);
        let token = sign_up_for_token(router.clone()).await;

        let parent_id = create_task(
            router.clone(),
            &token,
            json!({ "title": "Water the plants" }),
        )
        .await;
        let child_id = create_task(
            router.clone(),
            &token,
            json!({
                "title": "Refill the watering can",
                "parent_id": parent_id,
            }),
        )
        .await;

        let delete_response = send_request(
            router.clone(),
            Method::DELETE,
            format!("/todos/{parent_id}").as_str(),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(StatusCode::NO_CONTENT, delete_response.status());

        let get_child_response = send_request(
            router,
            Method::GET,
            format!("/todos/{child_id}").as_str(),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, get_child_response.status());
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn users_cannot_see_each_others_tasks() {
    prepare_db_and_test(|db| async move {
        let router = test_router(db);
        let first_token = sign_up_for_token(router.clone()).await;

        let second_sign_up = send_request(
            router.clone(),
            Method::POST,
            "/users",
            None,
            Some(json!({
                "display_name": "Johnny Appleseed",
                "email": "johnny@example.com",
                "password": "another fine passphrase",
                "confirm_password": "another fine passphrase",
            })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, second_sign_up.status());
        let second_user: dto::user::InsertedUser =
            deserialize_body(second_sign_up.into_body()).await;

        let task_id = create_task(
            router.clone(),
            &first_token,
            json!({ "title": "Water the plants" }),
        )
        .await;

        let cross_user_response = send_request(
            router,
            Method::GET,
            format!("/todos/{task_id}").as_str(),
            Some(&second_user.token),
            None,
        )
        .await;

        assert_eq!(StatusCode::NOT_FOUND, cross_user_response.status());
    });
}
