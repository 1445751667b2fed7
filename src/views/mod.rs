//! Модели экранов выдачи, карточки номера и формы номера. Хранят то, что
//! показывает страница, и ходят в [`RoomsApi`](crate::client::RoomsApi);
//! разметка остаётся за тем, кто их отображает.

pub mod detail;
pub mod form;
pub mod listing;

use std::fmt::Display;

/// Состояние асинхронной загрузки данных экрана.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Error(String),
    Success(T),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl<T> LoadState<T> {
    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => LoadState::Success(data),
            Err(e) => LoadState::Error(e.to_string()),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// Текст для экрана, пока данных нет: `Loading` или `Error: ...`.
    pub fn status_text(&self) -> Option<String> {
        match self {
            LoadState::Loading => Some("Loading".to_string()),
            LoadState::Error(message) => Some(format!("Error: {}", message)),
            LoadState::Idle | LoadState::Success(_) => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use crate::client::{ClientError, RoomsApi};
    use crate::models::{NewRoom, Room, RoomPatch};
    use crate::search_client::RoomSearch;
    use chrono::Utc;
    use std::sync::Mutex;

    /// [`RoomsApi`] в памяти; запоминает каждый вызов.
    #[derive(Default)]
    pub struct FakeApi {
        pub rooms: Mutex<Vec<Room>>,
        pub calls: Mutex<Vec<String>>,
    }

    fn not_found(id: i32) -> ClientError {
        ClientError::Api { status: 404, message: format!("Room {} not found", id) }
    }

    impl FakeApi {
        pub fn with_rooms(rooms: Vec<Room>) -> Self {
            Self { rooms: Mutex::new(rooms), calls: Mutex::default() }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    pub fn room(id: i32) -> Room {
        Room {
            id,
            name: format!("Room {}", id),
            description: "A quiet room with a view of the old town square".repeat(3),
            address: "5 Market St".into(),
            guest_capacity: 2,
            num_of_beds: 1,
            price_per_night: 80.0,
            internet: true,
            breakfast: true,
            airconditioned: false,
            pets_allowed: false,
            room_cleaning: false,
            ratings: 4.256,
            num_of_reviews: 9,
            category: crate::models::Category::Twins,
            creator_id: None,
            created_at: Utc::now(),
            images: vec![],
        }
    }

    impl RoomsApi for FakeApi {
        async fn get_all_rooms(&self, search: &RoomSearch) -> Result<(i64, Vec<Room>), ClientError> {
            self.record(format!("getAllRooms?{}", search.cache_key()));
            let rooms = self.rooms.lock().unwrap();
            let matching: Vec<Room> = rooms
                .iter()
                .filter(|r| search.category.map_or(true, |c| r.category == c))
                .cloned()
                .collect();
            let page = search.page();
            let items = matching
                .iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .cloned()
                .collect();
            Ok((matching.len() as i64, items))
        }

        async fn get_single_room(&self, id: i32) -> Result<Room, ClientError> {
            self.record(format!("getSingleRoom {}", id));
            let rooms = self.rooms.lock().unwrap();
            rooms.iter().find(|r| r.id == id).cloned().ok_or_else(|| not_found(id))
        }

        async fn post_new_room(&self, input: &NewRoom) -> Result<Room, ClientError> {
            self.record("postNewRoom");
            let mut rooms = self.rooms.lock().unwrap();
            let mut created = room(rooms.iter().map(|r| r.id).max().unwrap_or(0) + 1);
            created.name = input.name.clone();
            created.breakfast = input.breakfast;
            created.internet = input.internet;
            created.pets_allowed = input.pets_allowed;
            created.room_cleaning = input.room_cleaning;
            created.airconditioned = input.airconditioned;
            rooms.push(created.clone());
            Ok(created)
        }

        async fn put_update_room(&self, patch: &RoomPatch) -> Result<Room, ClientError> {
            self.record(format!("putUpdateRoom {}", patch.id));
            let mut rooms = self.rooms.lock().unwrap();
            let room = rooms.iter_mut().find(|r| r.id == patch.id).ok_or_else(|| not_found(patch.id))?;
            if let Some(name) = &patch.name {
                room.name = name.clone();
            }
            if let Some(breakfast) = patch.breakfast {
                room.breakfast = breakfast;
            }
            Ok(room.clone())
        }

        async fn delete_single_room(&self, id: i32) -> Result<Room, ClientError> {
            self.record(format!("deleteSingleRoom {}", id));
            let mut rooms = self.rooms.lock().unwrap();
            let index = rooms.iter().position(|r| r.id == id).ok_or_else(|| not_found(id))?;
            Ok(rooms.remove(index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_by_state() {
        assert_eq!(LoadState::<()>::Idle.status_text(), None);
        assert_eq!(LoadState::<()>::Loading.status_text().as_deref(), Some("Loading"));
        assert!(LoadState::<()>::Loading.is_loading());
        assert!(!LoadState::<()>::default().is_loading());
        assert_eq!(
            LoadState::<()>::from_result(Err::<(), _>("boom")).status_text().as_deref(),
            Some("Error: boom")
        );
        assert_eq!(LoadState::from_result(Ok::<_, String>(3)).data(), Some(&3));
    }
}
