//! Scoring - Correzione delle risposte e calcolo delle classifiche
//!
//! Funzioni pure, senza accesso al database: le usano sia le submission
//! dei quiz sia le stanze multiplayer.

use crate::core::AppError;
use crate::dtos::{AnswerDTO, AnswerResultDTO, LeaderboardEntryDTO};
use crate::entities::{ParticipantWithUser, QuestionWithOptions, QuizWithQuestions};
use std::collections::{BTreeSet, HashMap};

/// Punti assegnati per ogni risposta corretta in una stanza
pub const POINTS_PER_CORRECT_ANSWER: i32 = 10;

/// Una domanda è corretta se e solo se l'insieme delle opzioni scelte
/// coincide con l'insieme delle opzioni corrette
pub fn grade_question(question: &QuestionWithOptions, selected_option_ids: &[i32]) -> bool {
    let selected: BTreeSet<i32> = selected_option_ids.iter().copied().collect();
    let correct: BTreeSet<i32> = question.correct_option_ids().into_iter().collect();
    !correct.is_empty() && selected == correct
}

/// Percentuale arrotondata a due decimali
pub fn percentage(correct: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = 100.0 * f64::from(correct) / f64::from(total);
    (raw * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub correct_answers: i32,
    pub total_questions: i32,
    pub percentage: f64,
    /// una riga per ogni domanda del quiz, in ordine
    pub answers: Vec<AnswerResultDTO>,
}

/// Corregge un tentativo completo. Le domande senza risposta contano come
/// sbagliate; domande sconosciute o ripetute rendono la richiesta invalida.
pub fn grade_submission(quiz: &QuizWithQuestions, answers: &[AnswerDTO]) -> Result<Grade, AppError> {
    let mut by_question: HashMap<i32, &AnswerDTO> = HashMap::with_capacity(answers.len());
    for answer in answers {
        if !quiz
            .questions
            .iter()
            .any(|q| q.question.question_id == answer.question_id)
        {
            return Err(AppError::bad_request("Answer refers to a question outside this quiz")
                .with_details(format!("question_id {}", answer.question_id)));
        }
        if by_question.insert(answer.question_id, answer).is_some() {
            return Err(AppError::bad_request("Question answered more than once")
                .with_details(format!("question_id {}", answer.question_id)));
        }
    }

    let answers: Vec<AnswerResultDTO> = quiz
        .questions
        .iter()
        .map(|question| {
            let selected = by_question
                .get(&question.question.question_id)
                .map(|a| a.selected_option_ids.clone())
                .unwrap_or_default();
            AnswerResultDTO {
                question_id: question.question.question_id,
                is_correct: grade_question(question, &selected),
                selected_option_ids: selected,
            }
        })
        .collect();

    let correct_answers = answers.iter().filter(|a| a.is_correct).count() as i32;
    let total_questions = quiz.questions.len() as i32;
    Ok(Grade {
        correct_answers,
        total_questions,
        percentage: percentage(correct_answers, total_questions),
        answers,
    })
}

/// Classifica con ranking "competition" (1, 1, 3): a parità di punteggio e
/// risposte corrette la posizione è condivisa. I partecipanti devono essere
/// già ordinati per punteggio, risposte corrette e ingresso.
pub fn rank_leaderboard(participants: Vec<ParticipantWithUser>) -> Vec<LeaderboardEntryDTO> {
    let mut board: Vec<LeaderboardEntryDTO> = Vec::with_capacity(participants.len());
    for (position, p) in participants.into_iter().enumerate() {
        let rank = match board.last() {
            Some(prev) if prev.score == p.score && prev.correct_answers == p.correct_answers => prev.rank,
            _ => position as u32 + 1,
        };
        board.push(LeaderboardEntryDTO {
            rank,
            user_id: p.user_id,
            username: p.username,
            score: p.score,
            correct_answers: p.correct_answers,
        });
    }
    board
}

/// Vincitori di una stanza: chi è primo con punteggio positivo
pub fn champions(board: &[LeaderboardEntryDTO]) -> Vec<i32> {
    board
        .iter()
        .filter(|e| e.rank == 1 && e.score > 0)
        .map(|e| e.user_id)
        .collect()
}
