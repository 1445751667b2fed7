use crate::client::RoomsApi;
use crate::models::Room;
use crate::search_client::{Page, RoomSearch, DEFAULT_PER_PAGE};
use crate::views::LoadState;

pub const EMPTY_LISTING: &str = "No stays match your search.";
const EXCERPT_CHARS: usize = 100;

/// Карточка номера в сетке выдачи.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomCard {
    pub id: i32,
    pub href: String,
    pub name: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub rating: f64,
    pub num_of_reviews: i32,
    pub badges: Vec<&'static str>,
}

impl From<&Room> for RoomCard {
    fn from(room: &Room) -> Self {
        let excerpt: String = room.description.chars().take(EXCERPT_CHARS).collect();
        RoomCard {
            id: room.id,
            href: format!("/rooms/{}", room.id),
            name: room.name.clone(),
            excerpt: format!("{}...", excerpt),
            image_url: room.images.first().map(|image| image.url.clone()),
            rating: room.ratings,
            num_of_reviews: room.num_of_reviews,
            badges: room.features().iter().map(|f| f.label()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub rooms_per_page: u32,
    pub room_count: i64,
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Pagination {
    pub fn new(page: Page, room_count: i64) -> Self {
        Pagination {
            page: page.number,
            rooms_per_page: page.per_page,
            room_count,
            total_pages: page.total_pages(room_count),
            has_prev: page.has_prev(),
            has_next: page.has_next(room_count),
        }
    }
}

/// Экран «All Stays»: форма поиска, сетка карточек и пагинация.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub search: RoomSearch,
    pub state: LoadState<(i64, Vec<Room>)>,
}

impl Default for ListingPage {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

impl ListingPage {
    pub fn new(rooms_per_page: u32) -> Self {
        ListingPage {
            search: RoomSearch {
                page: Some(1),
                per_page: Some(rooms_per_page),
                ..Default::default()
            },
            state: LoadState::Idle,
        }
    }

    pub async fn load<A: RoomsApi>(&mut self, api: &A) {
        self.state = LoadState::Loading;
        self.state = LoadState::from_result(api.get_all_rooms(&self.search).await);
    }

    /// Новый поиск всегда начинается с первой страницы.
    pub async fn search<A: RoomsApi>(&mut self, api: &A, filters: RoomSearch) {
        self.search = RoomSearch {
            per_page: self.search.per_page,
            ..filters
        }
        .with_page(1);
        self.load(api).await;
    }

    pub async fn clear_filters<A: RoomsApi>(&mut self, api: &A) {
        self.search = self.search.cleared();
        self.load(api).await;
    }

    pub async fn next_page<A: RoomsApi>(&mut self, api: &A) -> bool {
        match self.pagination() {
            Some(pagination) if pagination.has_next => {
                self.search = self.search.clone().with_page(pagination.page + 1);
                self.load(api).await;
                true
            }
            _ => false,
        }
    }

    pub async fn prev_page<A: RoomsApi>(&mut self, api: &A) -> bool {
        let page = self.search.page();
        if !page.has_prev() {
            return false;
        }
        self.search = self.search.clone().with_page(page.number - 1);
        self.load(api).await;
        true
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.state
            .data()
            .map(|(count, _)| Pagination::new(self.search.page(), *count))
    }

    pub fn cards(&self) -> Vec<RoomCard> {
        self.state
            .data()
            .map(|(_, rooms)| rooms.iter().map(RoomCard::from).collect())
            .unwrap_or_default()
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        match self.state.data() {
            Some((_, rooms)) if rooms.is_empty() => Some(EMPTY_LISTING),
            _ => None,
        }
    }
}
