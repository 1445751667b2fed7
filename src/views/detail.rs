use chrono::NaiveDate;

use crate::client::RoomsApi;
use crate::models::room::{parse_room_id, INVALID_ID};
use crate::models::{Feature, Room};
use crate::views::LoadState;

pub const PLACEHOLDER_IMAGE: &str = "/placeholder.jpeg";

/// Стоимость проживания за выбранный диапазон дат.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReservationQuote {
    pub nights: i64,
    pub total: f64,
}

impl ReservationQuote {
    pub fn new(start: NaiveDate, end: NaiveDate, price_per_night: f64) -> Self {
        let nights = (end - start).num_days().abs();
        ReservationQuote {
            nights,
            total: nights as f64 * price_per_night,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomDetails {
    pub room: Room,
}

impl RoomDetails {
    /// «★ 4.50 | 12 reviews | 1 Harbour St»
    pub fn header_line(&self) -> String {
        format!(
            "\u{2605} {:.2} | {} reviews | {}",
            self.room.ratings, self.room.num_of_reviews, self.room.address
        )
    }

    pub fn hosted_by(&self) -> Option<String> {
        self.room.creator_id.map(|id| format!("Hosted by {}", id))
    }

    /// Все удобства с отметкой, есть ли они в номере.
    pub fn features(&self) -> Vec<(&'static str, bool)> {
        Feature::ALL
            .into_iter()
            .map(|feature| (feature.label(), self.room.has(feature)))
            .collect()
    }

    pub fn category_label(&self) -> &'static str {
        self.room.category.title()
    }

    pub fn uses_carousel(&self) -> bool {
        self.room.images.len() > 1
    }

    pub fn hero_image(&self) -> &str {
        self.room
            .images
            .first()
            .map(|image| image.url.as_str())
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    pub fn quote(&self, start: NaiveDate, end: NaiveDate) -> ReservationQuote {
        ReservationQuote::new(start, end, self.room.price_per_night)
    }
}

/// Экран `/rooms/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomDetailPage {
    /// Идентификатор не число: запрос не отправлялся.
    InvalidId,
    Room { id: i32, state: LoadState<RoomDetails> },
}

impl RoomDetailPage {
    pub async fn open<A: RoomsApi>(api: &A, raw_id: Option<&str>) -> Self {
        let Some(id) = parse_room_id(raw_id) else {
            return RoomDetailPage::InvalidId;
        };

        let state = LoadState::from_result(
            api.get_single_room(id)
                .await
                .map(|room| RoomDetails { room }),
        );
        RoomDetailPage::Room { id, state }
    }

    pub fn details(&self) -> Option<&RoomDetails> {
        match self {
            RoomDetailPage::Room { state, .. } => state.data(),
            RoomDetailPage::InvalidId => None,
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            RoomDetailPage::InvalidId => Some(INVALID_ID.to_string()),
            RoomDetailPage::Room { state, .. } => state.status_text(),
        }
    }
}
