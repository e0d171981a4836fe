//! Integration tests per amicizie e richieste di amicizia

mod common;

#[cfg(test)]
mod friend_tests {
    use super::common::*;
    use axum_test::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships")))]
    async fn test_send_friend_request(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, token) = auth_header(1, "alice");

        let response = server
            .post("/api/friends/requests")
            .add_header(name.clone(), token.clone())
            .json(&json!({"user_id": 4}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let friendship: Value = response.json();
        assert_eq!(friendship["requester_id"], 1);
        assert_eq!(friendship["addressee_id"], 4);
        assert_eq!(friendship["status"], "pending");

        let outgoing: Vec<Value> = server
            .get("/api/friends/requests/outgoing")
            .add_header(name, token)
            .await
            .json();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0]["username"], "dave");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships")))]
    async fn test_send_friend_request_rejections(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, token) = auth_header(1, "alice");

        // a se stessi
        server
            .post("/api/friends/requests")
            .add_header(name.clone(), token.clone())
            .json(&json!({"user_id": 1}))
            .await
            .assert_status_bad_request();

        // utente inesistente
        server
            .post("/api/friends/requests")
            .add_header(name.clone(), token.clone())
            .json(&json!({"user_id": 999}))
            .await
            .assert_status_not_found();

        // già amici
        server
            .post("/api/friends/requests")
            .add_header(name.clone(), token.clone())
            .json(&json!({"user_id": 2}))
            .await
            .assert_status(StatusCode::CONFLICT);

        // richiesta già pendente nella direzione opposta
        server
            .post("/api/friends/requests")
            .add_header(name, token)
            .json(&json!({"user_id": 3}))
            .await
            .assert_status(StatusCode::CONFLICT);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships")))]
    async fn test_list_friends_and_incoming(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, token) = auth_header(1, "alice");

        let friends: Vec<Value> = server
            .get("/api/friends")
            .add_header(name.clone(), token.clone())
            .await
            .json();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0]["username"], "bob");
        assert_eq!(friends[0]["status"], "accepted");

        let incoming: Vec<Value> = server
            .get("/api/friends/requests/incoming")
            .add_header(name, token)
            .await
            .json();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0]["friendship_id"], 2);
        assert_eq!(incoming[0]["username"], "charlie");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships")))]
    async fn test_accept_friend_request(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (alice, alice_token) = auth_header(1, "alice");
        let (charlie, charlie_token) = auth_header(3, "charlie");

        // solo il destinatario può rispondere
        server
            .post("/api/friends/requests/2")
            .add_header(charlie.clone(), charlie_token.clone())
            .json(&json!({"action": "accept"}))
            .await
            .assert_status_forbidden();

        let response = server
            .post("/api/friends/requests/2")
            .add_header(alice.clone(), alice_token.clone())
            .json(&json!({"action": "accept"}))
            .await;
        response.assert_status_ok();
        let friendship: Value = response.json();
        assert_eq!(friendship["status"], "accepted");

        // una richiesta già accettata non si ripete
        server
            .post("/api/friends/requests/2")
            .add_header(alice, alice_token)
            .json(&json!({"action": "reject"}))
            .await
            .assert_status(StatusCode::CONFLICT);

        let friends: Vec<Value> = server
            .get("/api/friends")
            .add_header(charlie, charlie_token)
            .await
            .json();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0]["username"], "alice");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships")))]
    async fn test_reject_friend_request(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool.clone());
        let (name, token) = auth_header(1, "alice");

        server
            .post("/api/friends/requests/2")
            .add_header(name.clone(), token.clone())
            .json(&json!({"action": "reject"}))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM friendships WHERE friendship_id = 2")
            .fetch_one(&pool)
            .await?;
        assert_eq!(remaining, 0);

        server
            .post("/api/friends/requests/2")
            .add_header(name, token)
            .json(&json!({"action": "accept"}))
            .await
            .assert_status_not_found();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships")))]
    async fn test_remove_friend(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (bob, bob_token) = auth_header(2, "bob");

        // rimozione dal lato del destinatario
        server
            .delete("/api/friends/1")
            .add_header(bob.clone(), bob_token.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .delete("/api/friends/1")
            .add_header(bob.clone(), bob_token.clone())
            .await
            .assert_status_not_found();

        let friends: Vec<Value> = server
            .get("/api/friends")
            .add_header(bob, bob_token)
            .await
            .json();
        assert!(friends.is_empty());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships")))]
    async fn test_requester_can_cancel_pending_request(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (charlie, charlie_token) = auth_header(3, "charlie");
        let (alice, alice_token) = auth_header(1, "alice");

        server
            .delete("/api/friends/1")
            .add_header(charlie, charlie_token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let incoming: Vec<Value> = server
            .get("/api/friends/requests/incoming")
            .add_header(alice, alice_token)
            .await
            .json();
        assert!(incoming.is_empty());
        Ok(())
    }
}
