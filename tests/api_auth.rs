//! Integration tests per registrazione, login e profilo utente

mod common;

#[cfg(test)]
mod auth_tests {
    use super::common::*;
    use axum_test::http::header;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    // ============================================================
    // Test per POST /api/users/register
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_success(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);

        let response = server
            .post("/api/users/register")
            .json(&json!({
                "username": "eve_99",
                "email": "eve@example.com",
                "password": "correct-horse"
            }))
            .await;

        response.assert_status(axum_test::http::StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["username"], "eve_99");
        assert!(body.get("password").is_none(), "La password non deve mai uscire");
        assert!(body.get("email").is_none(), "L'email è visibile solo in /me");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_duplicate_username(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);

        let response = server
            .post("/api/users/register")
            .json(&json!({
                "username": "alice",
                "email": "another@example.com",
                "password": "correct-horse"
            }))
            .await;

        response.assert_status(axum_test::http::StatusCode::CONFLICT);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_invalid_payload(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);

        let cases = [
            json!({"username": "ab", "email": "ab@example.com", "password": "correct-horse"}),
            json!({"username": "bad name", "email": "x@example.com", "password": "correct-horse"}),
            json!({"username": "frank", "email": "not-an-email", "password": "correct-horse"}),
            json!({"username": "frank", "email": "frank@example.com", "password": "short"}),
        ];
        for body in cases {
            let response = server.post("/api/users/register").json(&body).await;
            response.assert_status_bad_request();
        }
        Ok(())
    }

    // ============================================================
    // Test per POST /api/users/login
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_after_register(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);

        server
            .post("/api/users/register")
            .json(&json!({
                "username": "frank",
                "email": "frank@example.com",
                "password": "correct-horse"
            }))
            .await
            .assert_status(axum_test::http::StatusCode::CREATED);

        // login con username
        let response = server
            .post("/api/users/login")
            .json(&json!({"username": "frank", "password": "correct-horse"}))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let token = body["token"].as_str().expect("token nel body").to_string();
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["user"]["username"], "frank");

        let auth = response.header(header::AUTHORIZATION);
        assert_eq!(auth.to_str().unwrap(), format!("Bearer {}", token));
        let cookie = response.header(header::SET_COOKIE);
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with(&format!("token={}", token)));
        assert!(cookie.contains("HttpOnly"));

        // login con email
        server
            .post("/api/users/login")
            .json(&json!({"username": "frank@example.com", "password": "correct-horse"}))
            .await
            .assert_status_ok();

        // il token emesso funziona sulle rotte protette
        let me = server
            .get("/api/users/me")
            .add_header(header::AUTHORIZATION, format!("Bearer {}", token))
            .await;
        me.assert_status_ok();
        assert_eq!(me.json::<Value>()["email"], "frank@example.com");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_wrong_credentials(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);

        server
            .post("/api/users/register")
            .json(&json!({
                "username": "grace",
                "email": "grace@example.com",
                "password": "correct-horse"
            }))
            .await;

        server
            .post("/api/users/login")
            .json(&json!({"username": "grace", "password": "wrong-horse"}))
            .await
            .assert_status_unauthorized();

        server
            .post("/api/users/login")
            .json(&json!({"username": "nobody", "password": "correct-horse"}))
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    // ============================================================
    // Test per le rotte protette
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_protected_route_requires_token(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);

        server.get("/api/users/me").await.assert_status_unauthorized();

        server
            .get("/api/users/me")
            .add_header(header::AUTHORIZATION, "Bearer invalid_token_here")
            .await
            .assert_status_unauthorized();

        let forged = create_test_jwt(1, "alice", "another-secret");
        server
            .get("/api/users/me")
            .add_header(header::AUTHORIZATION, format!("Bearer {}", forged))
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_token_accepted_from_cookie(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let token = create_test_jwt(2, "bob", JWT_SECRET);

        let response = server
            .get("/api/users/me")
            .add_header(header::COOKIE, format!("token={}", token))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["username"], "bob");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_update_me(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(1, "alice");

        let response = server
            .patch("/api/users/me")
            .add_header(name.clone(), value.clone())
            .json(&json!({"display_name": "Alice L.", "bio": "Loves Rust"}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["display_name"], "Alice L.");
        assert_eq!(body["bio"], "Loves Rust");

        server
            .patch("/api/users/me")
            .add_header(name, value)
            .json(&json!({"avatar_url": "not a url"}))
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_delete_my_account(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool.clone());
        let (name, value) = auth_header(1, "alice");

        server
            .delete("/api/users/me")
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(axum_test::http::StatusCode::NO_CONTENT);

        // il token non è più valido e i quiz di alice sono stati rimossi
        server
            .get("/api/users/me")
            .add_header(name, value)
            .await
            .assert_status_unauthorized();

        let quizzes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE creator_id = 1")
            .fetch_one(&pool)
            .await?;
        assert_eq!(quizzes, 0);
        Ok(())
    }

    // ============================================================
    // Test per ricerca e profili pubblici
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_search_users(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(1, "alice");

        let response = server
            .get("/api/users/search")
            .add_query_param("search", "ch")
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status_ok();
        let users: Vec<Value> = response.json();
        let names: Vec<&str> = users.iter().filter_map(|u| u["username"].as_str()).collect();
        assert_eq!(names, vec!["charlie"]);

        // l'utente corrente è escluso dalla ricerca
        let response = server
            .get("/api/users/search")
            .add_query_param("search", "ali")
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status_ok();
        assert!(response.json::<Vec<Value>>().is_empty());

        server
            .get("/api/users/search")
            .add_query_param("search", "  ")
            .add_header(name, value)
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_get_user_by_id(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(1, "alice");

        let response = server
            .get("/api/users/2")
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["username"], "bob");

        server
            .get("/api/users/999")
            .add_header(name, value)
            .await
            .assert_status_not_found();
        Ok(())
    }
}
