//! Integration tests per chat dirette, chat di stanza e messaggi

mod common;

#[cfg(test)]
mod chat_tests {
    use super::common::*;
    use axum_test::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    #[sqlx::test(fixtures(
        path = "../fixtures",
        scripts("users", "quizzes", "friendships", "chats", "rooms")
    ))]
    async fn test_list_chats(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, token) = auth_header(1, "alice");

        let chats: Vec<Value> = server
            .get("/api/chats")
            .add_header(name, token)
            .await
            .json();
        assert_eq!(chats.len(), 2);

        let direct = chats.iter().find(|c| c["chat_id"] == 1).unwrap();
        assert_eq!(direct["kind"], "direct");
        assert_eq!(direct["member_ids"], json!([1, 2]));

        let room = chats.iter().find(|c| c["chat_id"] == 10).unwrap();
        assert_eq!(room["kind"], "room");
        assert_eq!(room["room_id"], 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships", "chats")))]
    async fn test_get_messages_newest_first(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, token) = auth_header(2, "bob");

        let messages: Vec<Value> = server
            .get("/api/chats/1/messages")
            .add_header(name.clone(), token.clone())
            .await
            .json();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["message_id"], 2);
        assert_eq!(messages[1]["content"], "Ready for the quiz?");

        let older: Vec<Value> = server
            .get("/api/chats/1/messages")
            .add_query_param("before_date", "2025-01-03T09:02:00Z")
            .add_header(name, token)
            .await
            .json();
        assert_eq!(older.len(), 1);
        assert_eq!(older[0]["message_id"], 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships", "chats")))]
    async fn test_messages_require_membership(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, token) = auth_header(3, "charlie");

        server
            .get("/api/chats/1/messages")
            .add_header(name.clone(), token.clone())
            .await
            .assert_status_forbidden();

        server
            .post("/api/chats/1/messages")
            .add_header(name.clone(), token.clone())
            .json(&json!({"content": "let me in"}))
            .await
            .assert_status_forbidden();

        server
            .get("/api/chats/999/messages")
            .add_header(name, token)
            .await
            .assert_status_not_found();

        server
            .get("/api/chats/1/messages")
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships", "chats")))]
    async fn test_send_message(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, token) = auth_header(1, "alice");

        let response = server
            .post("/api/chats/1/messages")
            .add_header(name.clone(), token.clone())
            .json(&json!({"content": "Starting in 5"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let message: Value = response.json();
        assert_eq!(message["chat_id"], 1);
        assert_eq!(message["sender_id"], 1);
        assert_eq!(message["content"], "Starting in 5");

        let messages: Vec<Value> = server
            .get("/api/chats/1/messages")
            .add_header(name, token)
            .await
            .json();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["content"], "Starting in 5");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships", "chats")))]
    async fn test_send_invalid_message(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, token) = auth_header(1, "alice");

        for content in [String::new(), "   ".to_string(), "x".repeat(2001)] {
            server
                .post("/api/chats/1/messages")
                .add_header(name.clone(), token.clone())
                .json(&json!({"content": content}))
                .await
                .assert_status_bad_request();
        }
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships", "chats")))]
    async fn test_send_message_after_unfriend_forbidden(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool.clone());
        let (name, token) = auth_header(1, "alice");

        server
            .delete("/api/friends/2")
            .add_header(name.clone(), token.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        // la chat resta leggibile ma non si può più scrivere
        server
            .get("/api/chats/1/messages")
            .add_header(name.clone(), token.clone())
            .await
            .assert_status_ok();

        let response = server
            .post("/api/chats/1/messages")
            .add_header(name, token)
            .json(&json!({"content": "still there?"}))
            .await;
        response.assert_status_forbidden();

        let (name, token) = auth_header(2, "bob");
        server
            .post("/api/chats/1/messages")
            .add_header(name, token)
            .json(&json!({"content": "hello?"}))
            .await
            .assert_status_forbidden();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE chat_id = 1")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 2);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships", "chats")))]
    async fn test_open_direct_chat(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, token) = auth_header(2, "bob");

        // la chat esistente viene riutilizzata
        let chat: Value = server
            .post("/api/chats/direct/1")
            .add_header(name.clone(), token.clone())
            .await
            .json();
        assert_eq!(chat["chat_id"], 1);

        // non amici
        server
            .post("/api/chats/direct/4")
            .add_header(name.clone(), token.clone())
            .await
            .assert_status_forbidden();

        server
            .post("/api/chats/direct/2")
            .add_header(name.clone(), token.clone())
            .await
            .assert_status_bad_request();

        server
            .post("/api/chats/direct/999")
            .add_header(name, token)
            .await
            .assert_status_not_found();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "friendships")))]
    async fn test_open_direct_chat_creates_once(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (alice, alice_token) = auth_header(1, "alice");
        let (bob, bob_token) = auth_header(2, "bob");

        let first: Value = server
            .post("/api/chats/direct/2")
            .add_header(alice, alice_token)
            .await
            .json();
        assert_eq!(first["kind"], "direct");
        assert_eq!(first["member_ids"], json!([1, 2]));

        let second: Value = server
            .post("/api/chats/direct/1")
            .add_header(bob, bob_token)
            .await
            .json();
        assert_eq!(second["chat_id"], first["chat_id"]);
        Ok(())
    }
}
