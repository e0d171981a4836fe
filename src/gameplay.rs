//! Gameplay - Motore delle stanze multiplayer
//!
//! Tutte le operazioni sulle stanze passano da qui, sia dalle route REST sia
//! dagli eventi WebSocket. Lo stato autorevole è nel database: le transizioni
//! sono compare-and-set e la domanda corrente è tenuta dal server. Dopo ogni
//! cambiamento l'evento corrispondente viene pubblicato sul canale della stanza.

use crate::core::{AppError, AppState};
use crate::dtos::{
    AdvanceDTO, AnswerOutcomeDTO, CreateRoomDTO, CurrentQuestionDTO, LeaderboardEntryDTO,
    NewRoomDTO, ParticipantDTO, QuestionDTO, RoomAnswerDTO, RoomDTO, RoomDetailsDTO, ServerEvent,
    room::DEFAULT_MAX_PARTICIPANTS,
};
use crate::entities::{AchievementKind, QuizWithQuestions, Room, RoomStatus};
use crate::repositories::{Create, JoinOutcome, Read, RecordOutcome};
use crate::scoring::{self, POINTS_PER_CORRECT_ANSWER};
use crate::ws::usermap::InternalSignal;
use crate::ws::utils::broadcast_to_room;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_ATTEMPTS: usize = 5;

fn generate_room_code() -> String {
    Uuid::new_v4().simple().to_string()[..ROOM_CODE_LEN].to_uppercase()
}

async fn load_room(state: &AppState, room_id: i32) -> Result<Room, AppError> {
    state.room.read(&room_id).await?.ok_or_else(|| {
        warn!("Room {} not found", room_id);
        AppError::not_found("Room not found")
    })
}

async fn load_quiz(state: &AppState, quiz_id: i32) -> Result<QuizWithQuestions, AppError> {
    state
        .quiz
        .read_with_questions(quiz_id)
        .await?
        .ok_or_else(|| AppError::not_found("Quiz not found"))
}

fn ensure_host(room: &Room, user_id: i32) -> Result<(), AppError> {
    if room.is_host(user_id) {
        Ok(())
    } else {
        warn!("User {} is not the host of room {}", user_id, room.room_id);
        Err(AppError::forbidden("Only the host can control the game"))
    }
}

fn ensure_in_progress(room: &Room) -> Result<(), AppError> {
    if room.status == RoomStatus::InProgress {
        Ok(())
    } else {
        Err(AppError::conflict("Room is not in progress"))
    }
}

/// Domanda corrente della stanza, senza i flag di correttezza
fn current_question_dto(room: &Room, quiz: &QuizWithQuestions) -> Result<CurrentQuestionDTO, AppError> {
    let index = room
        .current_question
        .ok_or_else(|| AppError::conflict("Room has no current question"))?;
    let question = usize::try_from(index)
        .ok()
        .and_then(|i| quiz.questions.get(i))
        .ok_or_else(|| AppError::conflict("Room has no current question"))?;

    Ok(CurrentQuestionDTO {
        room_id: room.room_id,
        index,
        total_questions: quiz.questions.len() as i32,
        time_limit_secs: room.time_limit_secs,
        started_at: room.question_started_at,
        question: QuestionDTO::from_question(question.clone(), false),
    })
}

async fn build_leaderboard(state: &AppState, room_id: i32) -> Result<Vec<LeaderboardEntryDTO>, AppError> {
    let participants = state.participant.find_many_with_users(room_id).await?;
    Ok(scoring::rank_leaderboard(participants))
}

async fn build_details(state: &AppState, room: Room) -> Result<RoomDetailsDTO, AppError> {
    let participants = state.participant.find_many_with_users(room.room_id).await?;
    let chat_id = state.chat.find_by_room(room.room_id).await?.map(|c| c.chat_id);
    let total_questions = state.quiz.count_questions(room.quiz_id).await? as i32;

    Ok(RoomDetailsDTO {
        room: RoomDTO::from(room),
        chat_id,
        total_questions,
        participants: participants.into_iter().map(ParticipantDTO::from).collect(),
    })
}

#[instrument(skip(state))]
pub async fn room_details(state: &AppState, room_id: i32) -> Result<RoomDetailsDTO, AppError> {
    let room = load_room(state, room_id).await?;
    build_details(state, room).await
}

#[instrument(skip(state))]
pub async fn list_waiting_rooms(state: &AppState) -> Result<Vec<RoomDTO>, AppError> {
    let rooms = state.room.find_many_waiting().await?;
    Ok(rooms.into_iter().map(RoomDTO::from).collect())
}

/// Crea una stanza su un quiz visibile all'host; l'host è il primo partecipante
#[instrument(skip(state, dto), fields(quiz_id = dto.quiz_id))]
pub async fn create_room(
    state: &AppState,
    host_id: i32,
    dto: CreateRoomDTO,
) -> Result<RoomDetailsDTO, AppError> {
    // 1. Validare il DTO
    dto.validate()?;

    // 2. Il quiz deve esistere, essere visibile all'host e avere almeno una domanda
    let quiz = state
        .quiz
        .read(&dto.quiz_id)
        .await?
        .filter(|q| q.is_visible_to(host_id))
        .ok_or_else(|| AppError::not_found("Quiz not found"))?;
    if state.quiz.count_questions(quiz.quiz_id).await? == 0 {
        return Err(AppError::bad_request("Quiz has no questions"));
    }

    // 3. Inserire la stanza, ritentando se il codice generato è già in uso
    let mut created = None;
    for _ in 0..ROOM_CODE_ATTEMPTS {
        let new_room = NewRoomDTO {
            code: generate_room_code(),
            quiz_id: quiz.quiz_id,
            host_id,
            max_participants: dto.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
            time_limit_secs: dto.time_limit_secs.or(quiz.time_limit_secs),
        };
        match state.room.create(&new_room).await {
            Ok(room) => {
                created = Some(room);
                break;
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!("Room code collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
    let room = created.ok_or_else(|| AppError::conflict("Could not allocate a room code"))?;

    // 4. La connessione WebSocket dell'host inizia ad ascoltare la stanza
    state
        .users_online
        .send_if_online(host_id, InternalSignal::SubscribeRoom(room.room_id));

    info!("Room {} ({}) created by user {}", room.room_id, room.code, host_id);
    build_details(state, room).await
}

/// Ingresso in una stanza in attesa. Idempotente per chi è già dentro.
#[instrument(skip(state))]
pub async fn join_room(state: &AppState, user_id: i32, room_id: i32) -> Result<RoomDetailsDTO, AppError> {
    let room = load_room(state, room_id).await?;

    match state.participant.join_if_capacity(room_id, user_id).await? {
        JoinOutcome::Joined => {
            state
                .users_online
                .send_if_online(user_id, InternalSignal::SubscribeRoom(room_id));
            if let Some(participant) = state.participant.read_with_user(room_id, user_id).await? {
                broadcast_to_room(
                    state,
                    room_id,
                    ServerEvent::ParticipantJoined {
                        room_id,
                        participant: ParticipantDTO::from(participant),
                    },
                );
            }
            info!("User {} joined room {}", user_id, room_id);
        }
        JoinOutcome::AlreadyJoined => {
            debug!("User {} already in room {}", user_id, room_id);
            if room.status.is_live() {
                state
                    .users_online
                    .send_if_online(user_id, InternalSignal::SubscribeRoom(room_id));
            }
        }
        JoinOutcome::Rejected => {
            let current = load_room(state, room_id).await?;
            if current.status != RoomStatus::Waiting {
                warn!("Join rejected: room {} is {:?}", room_id, current.status);
                return Err(AppError::conflict("Room is not accepting new players"));
            }
            warn!("Join rejected: room {} is full", room_id);
            return Err(AppError::conflict("Room is full")
                .with_details(format!("max {} participants", current.max_participants)));
        }
    }

    room_details(state, room_id).await
}

#[instrument(skip(state))]
pub async fn join_room_by_code(state: &AppState, user_id: i32, code: &str) -> Result<RoomDetailsDTO, AppError> {
    let room = state
        .room
        .find_by_code(&code.trim().to_uppercase())
        .await?
        .ok_or_else(|| AppError::not_found("Room not found"))?;
    join_room(state, user_id, room.room_id).await
}

/// Uscita dalla stanza. L'host non può uscire: elimina la stanza in attesa
/// oppure termina la partita.
#[instrument(skip(state))]
pub async fn leave_room(state: &AppState, user_id: i32, room_id: i32) -> Result<(), AppError> {
    let room = load_room(state, room_id).await?;
    if room.is_host(user_id) {
        return Err(AppError::bad_request("The host cannot leave the room")
            .with_details("Delete the room or end the game instead"));
    }
    if room.status == RoomStatus::Completed {
        return Err(AppError::conflict("Room is already completed"));
    }

    if !state.participant.leave(room_id, user_id).await? {
        return Err(AppError::not_found("You are not in this room"));
    }

    state
        .users_online
        .send_if_online(user_id, InternalSignal::UnsubscribeRoom(room_id));
    broadcast_to_room(state, room_id, ServerEvent::ParticipantLeft { room_id, user_id });
    info!("User {} left room {}", user_id, room_id);
    Ok(())
}

/// waiting -> in_progress, pubblica `game-started` e la prima domanda
#[instrument(skip(state))]
pub async fn start_game(state: &AppState, user_id: i32, room_id: i32) -> Result<CurrentQuestionDTO, AppError> {
    let room = load_room(state, room_id).await?;
    ensure_host(&room, user_id)?;
    if !room.status.can_transition_to(RoomStatus::InProgress) {
        return Err(AppError::conflict("Room has already started"));
    }
    let quiz = load_quiz(state, room.quiz_id).await?;
    if quiz.questions.is_empty() {
        return Err(AppError::bad_request("Quiz has no questions"));
    }

    if !state.room.start(room_id).await? {
        warn!("Start rejected: room {} is {:?}", room_id, room.status);
        return Err(AppError::conflict("Room has already started"));
    }

    let room = load_room(state, room_id).await?;
    let question = current_question_dto(&room, &quiz)?;
    broadcast_to_room(
        state,
        room_id,
        ServerEvent::GameStarted {
            room_id,
            total_questions: question.total_questions,
        },
    );
    broadcast_to_room(state, room_id, ServerEvent::Question(question.clone()));

    info!("Game started in room {}", room_id);
    Ok(question)
}

/// Passa alla domanda successiva; dopo l'ultima la partita si conclude
#[instrument(skip(state))]
pub async fn next_question(state: &AppState, user_id: i32, room_id: i32) -> Result<AdvanceDTO, AppError> {
    let room = load_room(state, room_id).await?;
    ensure_host(&room, user_id)?;
    ensure_in_progress(&room)?;
    let quiz = load_quiz(state, room.quiz_id).await?;

    let index = room.current_question.unwrap_or(0);
    if (index + 1) as usize >= quiz.questions.len() {
        debug!("Last question reached, ending game");
        let leaderboard = finish_game(state, room_id).await?;
        return Ok(AdvanceDTO::Ended { leaderboard });
    }

    if !state.room.advance(room_id, index).await? {
        return Err(AppError::conflict("Question was already advanced"));
    }

    let room = load_room(state, room_id).await?;
    let question = current_question_dto(&room, &quiz)?;
    broadcast_to_room(state, room_id, ServerEvent::Question(question.clone()));

    info!("Room {} moved to question {}", room_id, question.index);
    Ok(AdvanceDTO::Question(question))
}

/// Conclusione anticipata da parte dell'host
#[instrument(skip(state))]
pub async fn end_game(state: &AppState, user_id: i32, room_id: i32) -> Result<Vec<LeaderboardEntryDTO>, AppError> {
    let room = load_room(state, room_id).await?;
    ensure_host(&room, user_id)?;
    if !room.status.can_transition_to(RoomStatus::Completed) {
        return Err(AppError::conflict("Room is not in progress"));
    }
    finish_game(state, room_id).await
}

/// in_progress -> completed: classifica finale, traguardi, `game-ended`,
/// poi il canale della stanza viene chiuso
async fn finish_game(state: &AppState, room_id: i32) -> Result<Vec<LeaderboardEntryDTO>, AppError> {
    if !state.room.complete(room_id).await? {
        return Err(AppError::conflict("Room is not in progress"));
    }

    let leaderboard = build_leaderboard(state, room_id).await?;
    let champions = scoring::champions(&leaderboard);
    for champion in &champions {
        state.achievement.award(*champion, AchievementKind::RoomChampion).await?;
    }

    broadcast_to_room(
        state,
        room_id,
        ServerEvent::GameEnded {
            room_id,
            leaderboard: leaderboard.clone(),
            champions,
        },
    );
    state.rooms_online.close(room_id);

    info!("Game ended in room {}", room_id);
    Ok(leaderboard)
}

/// Risposta alla domanda corrente: una sola per domanda, entro il tempo limite
#[instrument(skip(state, dto), fields(question_id = dto.question_id))]
pub async fn submit_answer(
    state: &AppState,
    user_id: i32,
    room_id: i32,
    dto: RoomAnswerDTO,
) -> Result<AnswerOutcomeDTO, AppError> {
    // 1. La stanza deve essere in corso e l'utente un partecipante
    let room = load_room(state, room_id).await?;
    ensure_in_progress(&room)?;
    if state.participant.read(&(room_id, user_id)).await?.is_none() {
        return Err(AppError::forbidden("You are not a participant of this room"));
    }

    // 2. La risposta deve riferirsi alla domanda corrente, entro il tempo limite
    let quiz = load_quiz(state, room.quiz_id).await?;
    let current = current_question_dto(&room, &quiz)?;
    if current.question.question_id != dto.question_id {
        warn!(
            "Answer for question {} while current is {}",
            dto.question_id, current.question.question_id
        );
        return Err(AppError::bad_request("Answer does not match the current question"));
    }
    if room.question_expired(Utc::now()) {
        return Err(AppError::conflict("Time is up for this question"));
    }

    // 3. Correggere e registrare la risposta (una sola volta per domanda)
    let question = quiz
        .questions
        .iter()
        .find(|q| q.question.question_id == dto.question_id)
        .ok_or_else(|| AppError::bad_request("Answer does not match the current question"))?;
    let is_correct = scoring::grade_question(question, &dto.selected_option_ids);
    let points = if is_correct { POINTS_PER_CORRECT_ANSWER } else { 0 };

    // l'inserimento vale solo se la stanza è ancora sulla stessa domanda
    let participant = match state
        .participant
        .record_answer(
            room_id,
            user_id,
            current.index,
            dto.question_id,
            &dto.selected_option_ids,
            is_correct,
            points,
        )
        .await?
    {
        RecordOutcome::Recorded(participant) => participant,
        RecordOutcome::AlreadyAnswered => return Err(AppError::conflict("Question already answered")),
        RecordOutcome::QuestionClosed => {
            warn!("Question {} closed before the answer was stored", dto.question_id);
            return Err(AppError::conflict("Question is no longer open"));
        }
    };

    // 4. Pubblicare la classifica aggiornata
    let leaderboard = build_leaderboard(state, room_id).await?;
    broadcast_to_room(state, room_id, ServerEvent::LeaderboardUpdate { room_id, leaderboard });

    debug!("User {} answered question {}: {}", user_id, dto.question_id, is_correct);
    Ok(AnswerOutcomeDTO {
        room_id,
        question_id: dto.question_id,
        is_correct,
        points_awarded: points,
        score: participant.score,
        correct_option_ids: question.correct_option_ids(),
    })
}

#[instrument(skip(state))]
pub async fn leaderboard(state: &AppState, room_id: i32) -> Result<Vec<LeaderboardEntryDTO>, AppError> {
    load_room(state, room_id).await?;
    build_leaderboard(state, room_id).await
}

/// Domanda corrente, visibile solo ai partecipanti di una stanza in corso
#[instrument(skip(state))]
pub async fn current_question(state: &AppState, user_id: i32, room_id: i32) -> Result<CurrentQuestionDTO, AppError> {
    let room = load_room(state, room_id).await?;
    if state.participant.read(&(room_id, user_id)).await?.is_none() {
        return Err(AppError::forbidden("You are not a participant of this room"));
    }
    ensure_in_progress(&room)?;
    let quiz = load_quiz(state, room.quiz_id).await?;
    current_question_dto(&room, &quiz)
}

/// L'host elimina una stanza ancora in attesa
#[instrument(skip(state))]
pub async fn delete_room(state: &AppState, user_id: i32, room_id: i32) -> Result<(), AppError> {
    let room = load_room(state, room_id).await?;
    ensure_host(&room, user_id)?;

    if !state.room.delete_if_waiting(room_id).await? {
        return Err(AppError::conflict("Only a waiting room can be deleted"));
    }

    broadcast_to_room(state, room_id, ServerEvent::RoomClosed { room_id });
    state.rooms_online.close(room_id);
    info!("Room {} deleted by host", room_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_shape() {
        let code = generate_room_code();
        assert_eq!(code.len(), ROOM_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
