use std::collections::HashMap;

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventFilter, EventStore, Page, StoreError, StoreResult, UserStore};
use crate::{
    events::repo_types::Event,
    users::repo_types::{User, UserSummary},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
}

/// Both stores over a single lock, so cross-table writes stay atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

fn email_taken(tables: &Tables, email: &str, except: Uuid) -> bool {
    tables
        .users
        .values()
        .any(|u| u.email == email && u.id != except)
}

fn sorted_by_date(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    events
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if email_taken(&tables, &user.email, user.id) {
            return Err(StoreError::Conflict("This email is already in use".into()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user: &User) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Ok(None);
        }
        if email_taken(&tables, &user.email, user.id) {
            return Err(StoreError::Conflict("This email is already in use".into()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.events.retain(|_, e| e.creator_id != id);
        let now = OffsetDateTime::now_utc();
        for event in tables.events.values_mut() {
            if event.has_participant(id) {
                event.participants.retain(|p| *p != id);
                event.version += 1;
                event.updated_at = now;
            }
        }
        Ok(true)
    }

    async fn summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).map(UserSummary::from))
            .collect())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert(&self, event: Event) -> StoreResult<Event> {
        self.tables
            .write()
            .await
            .events
            .insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn list(&self, filter: &EventFilter) -> StoreResult<Page<Event>> {
        let tables = self.tables.read().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let matching: Vec<Event> = tables
            .events
            .values()
            .filter(|e| match &needle {
                None => true,
                Some(n) => {
                    e.title.to_lowercase().contains(n.as_str())
                        || e
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(n.as_str()))
                }
            })
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let items = sorted_by_date(matching)
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Event>> {
        let tables = self.tables.read().await;
        let mine = tables
            .events
            .values()
            .filter(|e| e.creator_id == user_id || e.has_participant(user_id))
            .cloned()
            .collect();
        Ok(sorted_by_date(mine))
    }

    async fn save(&self, event: &Event) -> StoreResult<Option<Event>> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.events.get_mut(&event.id) else {
            return Ok(None);
        };
        if stored.version != event.version {
            return Ok(None);
        }
        *stored = Event {
            version: event.version + 1,
            created_at: stored.created_at,
            creator_id: stored.creator_id,
            ..event.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.events.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn user(email: &str) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            name: "Tester".into(),
            email: email.into(),
            password_hash: "x".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn event(creator: Uuid, title: &str, days: i64) -> Event {
        let now = OffsetDateTime::now_utc();
        Event {
            id: Uuid::new_v4(),
            title: title.into(),
            description: Some("A description long enough".into()),
            date: now + Duration::days(days),
            location: "Nantes".into(),
            max_participants: 5,
            participants: vec![creator],
            creator_id: creator,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        UserStore::insert(&store, user("a@b.io")).await.unwrap();
        let err = UserStore::insert(&store, user("a@b.io")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn stale_save_is_refused() {
        let store = MemoryStore::new();
        let creator = Uuid::new_v4();
        let ev = EventStore::insert(&store, event(creator, "Picnic", 3)).await.unwrap();

        let mut first = ev.clone();
        first.participants.push(Uuid::new_v4());
        let saved = store.save(&first).await.unwrap().expect("fresh write");
        assert_eq!(saved.version, 1);

        let mut second = ev.clone();
        second.participants.push(Uuid::new_v4());
        assert!(store.save(&second).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        let creator = Uuid::new_v4();
        EventStore::insert(&store, event(creator, "Late jazz night", 9)).await.unwrap();
        EventStore::insert(&store, event(creator, "Early Jazz brunch", 2)).await.unwrap();
        EventStore::insert(&store, event(creator, "Chess club", 5)).await.unwrap();

        let page = store
            .list(&EventFilter { search: Some("JAZZ".into()), limit: 10, offset: 0 })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].title, "Early Jazz brunch");

        let page = store
            .list(&EventFilter { search: None, limit: 1, offset: 1 })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Chess club");
    }

    #[tokio::test]
    async fn deleting_user_cleans_events() {
        let store = MemoryStore::new();
        let owner = UserStore::insert(&store, user("owner@x.io")).await.unwrap();
        let guest = UserStore::insert(&store, user("guest@x.io")).await.unwrap();

        let owned = EventStore::insert(&store, event(owner.id, "Owned", 3)).await.unwrap();
        let mut joined = event(guest.id, "Joined", 4);
        joined.participants.push(owner.id);
        let joined = EventStore::insert(&store, joined).await.unwrap();

        assert!(UserStore::delete(&store, owner.id).await.unwrap());
        assert!(EventStore::find_by_id(&store, owned.id).await.unwrap().is_none());
        let joined = EventStore::find_by_id(&store, joined.id).await.unwrap().unwrap();
        assert_eq!(joined.participants, vec![guest.id]);
    }
}
