//! Submission services - Invio e consultazione dei tentativi sui quiz

use crate::core::{AppError, AppState};
use crate::dtos::{AchievementDTO, NewSubmissionDTO, SubmissionDTO, SubmitQuizDTO};
use crate::entities::{AchievementKind, User};
use crate::repositories::{Create, Read};
use crate::scoring::grade_submission;
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, quiz_id = %body.quiz_id))]
pub async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<SubmitQuizDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Submitting quiz answers");
    // 1. Caricare il quiz con domande e opzioni (i quiz privati altrui risultano inesistenti)
    // 2. Correggere le risposte
    // 3. Salvare submission e risposte nella stessa transazione
    // 4. Assegnare i traguardi e riportare nella risposta solo quelli nuovi
    let quiz = state
        .quiz
        .read_with_questions(body.quiz_id)
        .await?
        .filter(|q| q.quiz.is_visible_to(current_user.user_id))
        .ok_or_else(|| {
            warn!("Quiz not found or not visible");
            AppError::not_found("Quiz not found")
        })?;

    if quiz.questions.is_empty() {
        return Err(AppError::bad_request("Quiz has no questions"));
    }

    let grade = grade_submission(&quiz, &body.answers)?;
    let new_submission = NewSubmissionDTO {
        user_id: current_user.user_id,
        quiz_id: body.quiz_id,
        correct_answers: grade.correct_answers,
        total_questions: grade.total_questions,
        score: grade.correct_answers,
        percentage: grade.percentage,
        answers: grade.answers,
    };
    let submission = state.submission.create(&new_submission).await?;

    let mut earned = Vec::new();
    if let Some(a) = state
        .achievement
        .award(current_user.user_id, AchievementKind::FirstQuizCompleted)
        .await?
    {
        earned.push(AchievementDTO::from(a));
    }
    if grade.correct_answers == grade.total_questions {
        if let Some(a) = state
            .achievement
            .award(current_user.user_id, AchievementKind::PerfectScore)
            .await?
        {
            earned.push(AchievementDTO::from(a));
        }
    }

    info!(
        "Submission {} scored {}/{}",
        submission.submission_id, submission.correct_answers, submission.total_questions
    );

    let mut dto = SubmissionDTO::from(submission);
    dto.answers = new_submission.answers;
    dto.new_achievements = earned;
    Ok((StatusCode::CREATED, Json(dto)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_my_submissions(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<SubmissionDTO>>, AppError> {
    let submissions = state.submission.find_many_by_user(current_user.user_id).await?;
    Ok(Json(submissions.into_iter().map(SubmissionDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, submission_id = %submission_id))]
pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(submission_id): Path<i32>,
) -> Result<Json<SubmissionDTO>, AppError> {
    // Visibile a chi l'ha inviata e al creatore del quiz
    let submission = state
        .submission
        .read(&submission_id)
        .await?
        .ok_or_else(|| AppError::not_found("Submission not found"))?;

    if submission.user_id != current_user.user_id {
        let is_creator = state
            .quiz
            .read(&submission.quiz_id)
            .await?
            .is_some_and(|q| q.creator_id == current_user.user_id);
        if !is_creator {
            warn!("Access to submission denied");
            return Err(AppError::forbidden("You cannot view this submission"));
        }
    }

    let answers = state.submission.find_answers(submission_id).await?;
    Ok(Json(SubmissionDTO::from(submission).with_answers(answers)))
}
