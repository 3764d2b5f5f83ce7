use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Event record in the database.
///
/// `participants` is ordered by join time and always contains `creator_id`.
/// `version` is bumped on every write and guards conditional updates.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: OffsetDateTime,
    pub location: String,
    pub max_participants: i32,
    pub participants: Vec<Uuid>,
    pub creator_id: Uuid,
    pub version: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Event {
    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants.max(0) as usize
    }

    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }
}
