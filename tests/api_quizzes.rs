//! Integration tests per gli endpoints dei quiz

mod common;

#[cfg(test)]
mod quiz_tests {
    use super::common::*;
    use axum_test::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    fn sample_quiz() -> Value {
        json!({
            "title": "Capitals",
            "description": "European capitals",
            "category": "geography",
            "questions": [
                {
                    "text": "Capital of Italy?",
                    "options": [
                        {"text": "Rome", "is_correct": true},
                        {"text": "Milan"}
                    ]
                },
                {
                    "text": "Capital of France?",
                    "options": [
                        {"text": "Lyon"},
                        {"text": "Paris", "is_correct": true},
                        {"text": "Nice"}
                    ]
                }
            ]
        })
    }

    // ============================================================
    // Test per GET /api/quizzes
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_list_public_quizzes(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(3, "charlie");

        let response = server.get("/api/quizzes").add_header(name, value).await;
        response.assert_status_ok();

        let quizzes: Vec<Value> = response.json();
        assert_eq!(quizzes.len(), 1, "Il quiz privato di bob non deve comparire");
        assert_eq!(quizzes[0]["quiz_id"], 1);
        assert_eq!(quizzes[0]["question_count"], 3);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_list_quizzes_with_filters(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(3, "charlie");

        let by_category: Vec<Value> = server
            .get("/api/quizzes")
            .add_query_param("category", "programming")
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(by_category.len(), 1);

        let other_category: Vec<Value> = server
            .get("/api/quizzes")
            .add_query_param("category", "trivia")
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert!(other_category.is_empty());

        let by_title: Vec<Value> = server
            .get("/api/quizzes")
            .add_query_param("search", "basics")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(by_title.len(), 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_list_my_quizzes(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(2, "bob");

        let quizzes: Vec<Value> = server.get("/api/quizzes/mine").add_header(name, value).await.json();
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0]["quiz_id"], 2);
        assert_eq!(quizzes[0]["is_public"], false);
        Ok(())
    }

    // ============================================================
    // Test per GET /api/quizzes/{quiz_id}
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_get_quiz_hides_answers_from_players(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(2, "bob");

        let response = server.get("/api/quizzes/1").add_header(name, value).await;
        response.assert_status_ok();
        let quiz: Value = response.json();
        let questions = quiz["questions"].as_array().unwrap();
        assert_eq!(questions.len(), 3);
        for question in questions {
            for option in question["options"].as_array().unwrap() {
                assert!(option.get("is_correct").is_none(), "is_correct non deve trapelare");
            }
        }
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_get_quiz_reveals_answers_to_creator(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(1, "alice");

        let quiz: Value = server.get("/api/quizzes/1").add_header(name, value).await.json();
        let first_options = quiz["questions"][0]["options"].as_array().unwrap();
        assert_eq!(first_options[0]["is_correct"], true);
        assert_eq!(first_options[1]["is_correct"], false);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_private_quiz_visible_only_to_creator(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);

        let (name, value) = auth_header(1, "alice");
        server
            .get("/api/quizzes/2")
            .add_header(name, value)
            .await
            .assert_status_not_found();

        let (name, value) = auth_header(2, "bob");
        server.get("/api/quizzes/2").add_header(name, value).await.assert_status_ok();
        Ok(())
    }

    // ============================================================
    // Test per POST /api/quizzes
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_create_quiz_success(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool.clone());
        let (name, value) = auth_header(3, "charlie");

        let response = server
            .post("/api/quizzes")
            .add_header(name.clone(), value.clone())
            .json(&sample_quiz())
            .await;
        response.assert_status(StatusCode::CREATED);

        let quiz: Value = response.json();
        assert_eq!(quiz["creator_id"], 3);
        assert_eq!(quiz["question_count"], 2);
        assert_eq!(quiz["is_public"], true);
        let questions = quiz["questions"].as_array().unwrap();
        assert_eq!(questions[0]["position"], 0);
        assert_eq!(questions[1]["position"], 1);
        assert_eq!(questions[1]["options"][1]["is_correct"], true);

        // primo quiz creato: traguardo quiz_creator
        let achievements: Vec<Value> = server
            .get("/api/users/3/achievements")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(achievements.len(), 1);
        assert_eq!(achievements[0]["kind"], "quiz_creator");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_create_quiz_invalid(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool.clone());
        let (name, value) = auth_header(3, "charlie");

        let mut no_questions = sample_quiz();
        no_questions["questions"] = json!([]);

        let mut no_correct = sample_quiz();
        no_correct["questions"][0]["options"] = json!([{"text": "a"}, {"text": "b"}]);

        let mut one_option = sample_quiz();
        one_option["questions"][0]["options"] = json!([{"text": "a", "is_correct": true}]);

        let mut empty_title = sample_quiz();
        empty_title["title"] = json!("");

        for body in [no_questions, no_correct, one_option, empty_title] {
            server
                .post("/api/quizzes")
                .add_header(name.clone(), value.clone())
                .json(&body)
                .await
                .assert_status_bad_request();
        }

        // nessuna scrittura parziale
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 2);
        Ok(())
    }

    // ============================================================
    // Test per PATCH / DELETE /api/quizzes/{quiz_id}
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_update_quiz_by_creator(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(1, "alice");

        let response = server
            .patch("/api/quizzes/1")
            .add_header(name, value)
            .json(&json!({
                "title": "Rust Basics v2",
                "questions": [
                    {"text": "Is Rust memory safe?", "options": [
                        {"text": "Yes", "is_correct": true},
                        {"text": "No"}
                    ]}
                ]
            }))
            .await;
        response.assert_status_ok();

        let quiz: Value = response.json();
        assert_eq!(quiz["title"], "Rust Basics v2");
        assert_eq!(quiz["category"], "programming");
        assert_eq!(quiz["questions"].as_array().unwrap().len(), 1);
        assert_eq!(quiz["question_count"], 1);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_update_and_delete_forbidden_for_others(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(2, "bob");

        server
            .patch("/api/quizzes/1")
            .add_header(name.clone(), value.clone())
            .json(&json!({"title": "Hijacked"}))
            .await
            .assert_status_forbidden();

        server
            .delete("/api/quizzes/1")
            .add_header(name, value)
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_empty_update_rejected(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool);
        let (name, value) = auth_header(1, "alice");

        server
            .patch("/api/quizzes/1")
            .add_header(name, value)
            .json(&json!({}))
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes", "rooms")))]
    async fn test_questions_locked_while_room_active(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool.clone());
        let (name, value) = auth_header(1, "alice");
        let new_questions = json!({
            "questions": [
                {"text": "Is Rust memory safe?", "options": [
                    {"text": "Yes", "is_correct": true},
                    {"text": "No"}
                ]}
            ]
        });

        // room 1 è ancora in attesa sul quiz 1
        let response = server
            .patch("/api/quizzes/1")
            .add_header(name.clone(), value.clone())
            .json(&new_questions)
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "Quiz is in use by an active room");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = 1")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 3);

        // i soli metadati restano modificabili
        let quiz: Value = server
            .patch("/api/quizzes/1")
            .add_header(name.clone(), value.clone())
            .json(&json!({"title": "Rust Basics v2"}))
            .await
            .json();
        assert_eq!(quiz["title"], "Rust Basics v2");
        assert_eq!(quiz["question_count"], 3);

        // conclusa la stanza le domande si possono sostituire
        sqlx::query("UPDATE rooms SET status = 'completed' WHERE room_id = 1")
            .execute(&pool)
            .await?;
        server
            .patch("/api/quizzes/1")
            .add_header(name, value)
            .json(&new_questions)
            .await
            .assert_status_ok();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "quizzes")))]
    async fn test_delete_quiz(pool: SqlitePool) -> sqlx::Result<()> {
        let (_state, server) = setup(pool.clone());
        let (name, value) = auth_header(1, "alice");

        server
            .delete("/api/quizzes/1")
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get("/api/quizzes/1")
            .add_header(name, value)
            .await
            .assert_status_not_found();

        let options: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM answer_options o JOIN questions q ON q.question_id = o.question_id WHERE q.quiz_id = 1",
        )
        .fetch_one(&pool)
        .await?;
        assert_eq!(options, 0);
        Ok(())
    }
}
