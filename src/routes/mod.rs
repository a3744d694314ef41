pub mod games;
pub mod health;
pub mod leaderboard;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/games", get(games::list_games).post(games::create_game))
        .route(
            "/games/{id}",
            get(games::get_game)
                .put(games::replace_game)
                .patch(games::update_game)
                .delete(games::delete_game),
        )
        .route(
            "/leaderboard",
            get(leaderboard::list_entries).post(leaderboard::create_entry),
        )
        .route(
            "/leaderboard/{id}",
            get(leaderboard::get_entry)
                .put(leaderboard::replace_entry)
                .patch(leaderboard::update_entry)
                .delete(leaderboard::delete_entry),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let state = Arc::new(AppState::new(Arc::new(MemoryStore::new())));
        create_routes().with_state(state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Sends `body` verbatim and returns the response text undecoded
    async fn send_text(
        app: &Router,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }

        let response = app
            .clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn create_game(app: &Router, name: &str) -> Value {
        let (status, game) = send(
            app,
            Method::POST,
            "/games",
            Some(json!({
                "name": name,
                "grid": [["A", "B"], ["C", "D"]],
                "solutionWords": ["AB", "CD"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        game
    }

    async fn create_entry(app: &Router, player: &str, score: i64, game_id: &Value) -> Value {
        let (status, entry) = send(
            app,
            Method::POST,
            "/leaderboard",
            Some(json!({"playerName": player, "score": score, "game": game_id})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", entry);
        entry
    }

    fn ids(list: &Value) -> Vec<Value> {
        list.as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].clone())
            .collect()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_game_round_trips_through_create_and_retrieve() {
        let app = test_app();
        let created = create_game(&app, "Puzzle 1").await;

        let uri = format!("/games/{}", created["id"].as_str().unwrap());
        let (status, fetched) = send(&app, Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
        assert_eq!(fetched["name"], "Puzzle 1");
        assert_eq!(fetched["grid"], json!([["A", "B"], ["C", "D"]]));
        assert_eq!(fetched["solutionWords"], json!(["AB", "CD"]));
        assert!(fetched["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_game_documents_round_trip_byte_for_byte() {
        let app = test_app();
        let grid = r#"{"z":["A"],"a":["B"]}"#;
        let words = "[18446744073709551617, 1.10]";
        let body = format!(r#"{{"name": "raw", "grid": {}, "solutionWords": {}}}"#, grid, words);

        let (status, created) =
            send_text(&app, Method::POST, "/games", Some("application/json"), body).await;
        assert_eq!(status, StatusCode::CREATED);

        let id = serde_json::from_str::<Value>(&created).unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();
        let (status, fetched) = send_text(
            &app,
            Method::GET,
            &format!("/games/{}", id),
            None,
            String::new(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(fetched.contains(&format!(r#""grid":{}"#, grid)), "{}", fetched);
        assert!(fetched.contains(&format!(r#""solutionWords":{}"#, words)), "{}", fetched);

        let (_, listed) = send_text(&app, Method::GET, "/games", None, String::new()).await;
        assert!(listed.contains(words), "{}", listed);
    }

    #[tokio::test]
    async fn test_body_without_json_content_type_is_unsupported() {
        let app = test_app();
        let (status, body) = send_text(
            &app,
            Method::POST,
            "/games",
            None,
            r#"{"grid": [], "solutionWords": []}"#.to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"]["code"], "unsupported_media_type");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected_as_too_large() {
        let app = test_app();
        let padding = " ".repeat(3 * 1024 * 1024);
        let (status, _) = send_text(
            &app,
            Method::POST,
            "/games",
            Some("application/json"),
            format!(r#"{{"grid": []{}, "solutionWords": []}}"#, padding),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_game_without_name_is_stored_with_null_name() {
        let app = test_app();
        let (status, game) = send(
            &app,
            Method::POST,
            "/games",
            Some(json!({"grid": [], "solutionWords": []})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(game["name"], Value::Null);
    }

    #[tokio::test]
    async fn test_game_without_grid_is_rejected() {
        let app = test_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/games",
            Some(json!({"name": "no grid", "solutionWords": ["A"]})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["fields"]["grid"], "This field is required.");

        let (_, list) = send(&app, Method::GET, "/games", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/games")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::POST, "/games", Some(json!(["grid"]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_games_list_newest_first() {
        let app = test_app();
        let first = create_game(&app, "first").await;
        let second = create_game(&app, "second").await;
        let third = create_game(&app, "third").await;

        let (status, list) = send(&app, Method::GET, "/games", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            ids(&list),
            vec![third["id"].clone(), second["id"].clone(), first["id"].clone()]
        );
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_ids_are_not_found() {
        let app = test_app();
        let missing = format!("/games/{}", uuid::Uuid::new_v4());

        for (method, uri) in [
            (Method::GET, missing.as_str()),
            (Method::DELETE, missing.as_str()),
            (Method::GET, "/games/not-a-uuid"),
            (Method::GET, "/leaderboard/999"),
            (Method::DELETE, "/leaderboard/abc"),
        ] {
            let (status, body) = send(&app, method.clone(), uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
            assert_eq!(body["error"]["code"], "not_found");
        }

        let (status, _) = send(
            &app,
            Method::PATCH,
            &missing,
            Some(json!({"name": "renamed"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_game_put_and_patch() {
        let app = test_app();
        let game = create_game(&app, "Puzzle 1").await;
        let uri = format!("/games/{}", game["id"].as_str().unwrap());

        // PUT without solutionWords fails and changes nothing
        let (status, body) = send(&app, Method::PUT, &uri, Some(json!({"grid": [["Z"]]}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["fields"]["solutionWords"],
            "This field is required."
        );

        let (status, replaced) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({"grid": [["Z"]], "solutionWords": ["Z"], "createdAt": "ignored"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(replaced["grid"], json!([["Z"]]));
        assert_eq!(replaced["name"], "Puzzle 1");
        assert_eq!(replaced["createdAt"], game["createdAt"]);

        let (status, patched) = send(&app, Method::PATCH, &uri, Some(json!({"name": null}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["name"], Value::Null);
        assert_eq!(patched["solutionWords"], json!(["Z"]));
        assert_eq!(patched["id"], game["id"]);
    }

    #[tokio::test]
    async fn test_leaderboard_lists_highest_score_first() {
        let app = test_app();
        let game = create_game(&app, "Puzzle 1").await;

        let low = create_entry(&app, "Bob", 10, &game["id"]).await;
        let ann = create_entry(&app, "Ann", 42, &game["id"]).await;
        let mid = create_entry(&app, "Cy", 20, &game["id"]).await;

        let (status, list) = send(&app, Method::GET, "/leaderboard", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&list), vec![ann["id"].clone(), mid["id"].clone(), low["id"].clone()]);
        assert_eq!(list[0]["playerName"], "Ann");
        assert_eq!(list[0]["game"], game["id"]);
    }

    #[tokio::test]
    async fn test_whole_number_float_score_is_accepted() {
        let app = test_app();
        let game = create_game(&app, "Puzzle 1").await;

        let (status, entry) = send(
            &app,
            Method::POST,
            "/leaderboard",
            Some(json!({"playerName": "Ann", "score": 42.0, "game": game["id"]})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["score"], 42);
    }

    #[tokio::test]
    async fn test_entry_for_unknown_game_is_rejected_and_not_persisted() {
        let app = test_app();
        let ghost = json!(uuid::Uuid::new_v4().to_string());

        let (status, body) = send(
            &app,
            Method::POST,
            "/leaderboard",
            Some(json!({"playerName": "Ann", "score": 42, "game": ghost})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["fields"]["game"]
            .as_str()
            .unwrap()
            .contains("object does not exist"));

        let (_, list) = send(&app, Method::GET, "/leaderboard", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_entry_patch_and_put() {
        let app = test_app();
        let game = create_game(&app, "Puzzle 1").await;
        let other = create_game(&app, "Puzzle 2").await;
        let entry = create_entry(&app, "Ann", 42, &game["id"]).await;
        let uri = format!("/leaderboard/{}", entry["id"]);

        let (status, patched) = send(&app, Method::PATCH, &uri, Some(json!({"score": "50"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["score"], 50);
        assert_eq!(patched["playerName"], "Ann");

        let (status, _) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(json!({"game": uuid::Uuid::new_v4().to_string()})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::PUT, &uri, Some(json!({"score": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["fields"]["playerName"], "This field is required.");

        let (status, replaced) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({"playerName": "Ann B", "score": 7, "game": other["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(replaced["game"], other["id"]);
        assert_eq!(replaced["createdAt"], entry["createdAt"]);
    }

    #[tokio::test]
    async fn test_deleting_game_cascades_to_its_entries() {
        let app = test_app();
        let doomed = create_game(&app, "doomed").await;
        let kept = create_game(&app, "kept").await;

        create_entry(&app, "Ann", 42, &doomed["id"]).await;
        create_entry(&app, "Bob", 30, &doomed["id"]).await;
        let survivor = create_entry(&app, "Cy", 10, &kept["id"]).await;

        let (_, before) = send(&app, Method::GET, "/leaderboard", None).await;
        assert_eq!(before.as_array().unwrap().len(), 3);

        let uri = format!("/games/{}", doomed["id"].as_str().unwrap());
        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (_, after) = send(&app, Method::GET, "/leaderboard", None).await;
        assert_eq!(ids(&after), vec![survivor["id"].clone()]);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let app = test_app();
        let game = create_game(&app, "Puzzle 1").await;
        let entry = create_entry(&app, "Ann", 42, &game["id"]).await;
        let uri = format!("/leaderboard/{}", entry["id"]);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // The game itself is untouched
        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/games/{}", game["id"].as_str().unwrap()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
