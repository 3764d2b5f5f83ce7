//! Participant-list rules. Pure functions over an [`Event`]: they compute the
//! new list (or refuse) and never touch storage, so callers decide how the
//! result is persisted.

use uuid::Uuid;

use super::repo_types::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParticipationError {
    #[error("You are already participating in this event")]
    AlreadyParticipant,
    #[error("This event is full")]
    EventFull,
    #[error("You are not participating in this event")]
    NotParticipant,
    #[error("The creator cannot leave their own event")]
    CreatorCannotLeave,
    #[error("Only the creator may modify this event")]
    Forbidden,
}

/// Participant list after `user_id` joins; appended at the end.
pub fn join(event: &Event, user_id: Uuid) -> Result<Vec<Uuid>, ParticipationError> {
    if event.has_participant(user_id) {
        return Err(ParticipationError::AlreadyParticipant);
    }
    if event.is_full() {
        return Err(ParticipationError::EventFull);
    }
    let mut participants = Vec::with_capacity(event.participants.len() + 1);
    participants.extend_from_slice(&event.participants);
    participants.push(user_id);
    Ok(participants)
}

/// Participant list after `user_id` leaves; relative order of the rest kept.
pub fn leave(event: &Event, user_id: Uuid) -> Result<Vec<Uuid>, ParticipationError> {
    if !event.has_participant(user_id) {
        return Err(ParticipationError::NotParticipant);
    }
    if event.creator_id == user_id {
        return Err(ParticipationError::CreatorCannotLeave);
    }
    Ok(event
        .participants
        .iter()
        .copied()
        .filter(|id| *id != user_id)
        .collect())
}

pub fn authorize_mutation(event: &Event, user_id: Uuid) -> Result<(), ParticipationError> {
    if event.creator_id != user_id {
        return Err(ParticipationError::Forbidden);
    }
    Ok(())
}
