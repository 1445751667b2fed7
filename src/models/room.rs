use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::coerce;

/// Тип кровати в номере.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "room_category", rename_all = "UPPERCASE")]
pub enum Category {
    King,
    Twins,
    Single,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Single, Category::Twins, Category::King];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::King => "KING",
            Category::Twins => "TWINS",
            Category::Single => "SINGLE",
        }
    }

    /// `KING` -> `King`
    pub fn title(&self) -> &'static str {
        match self {
            Category::King => "King",
            Category::Twins => "Twins",
            Category::Single => "Single",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KING" => Ok(Category::King),
            "TWINS" => Ok(Category::Twins),
            "SINGLE" => Ok(Category::Single),
            other => Err(format!("unknown category `{}`", other)),
        }
    }
}

/// Удобства номера; они же теги фильтра выдачи.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    Internet,
    Breakfast,
    PetsAllowed,
    RoomCleaning,
    Airconditioned,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Breakfast,
        Feature::Internet,
        Feature::PetsAllowed,
        Feature::RoomCleaning,
        Feature::Airconditioned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Internet => "internet",
            Feature::Breakfast => "breakfast",
            Feature::PetsAllowed => "petsAllowed",
            Feature::RoomCleaning => "roomCleaning",
            Feature::Airconditioned => "airconditioned",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Feature::Internet => "internet",
            Feature::Breakfast => "breakfast",
            Feature::PetsAllowed => "pets_allowed",
            Feature::RoomCleaning => "room_cleaning",
            Feature::Airconditioned => "airconditioned",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Feature::Internet => "Internet",
            Feature::Breakfast => "Breakfast",
            Feature::PetsAllowed => "Pets Allowed",
            Feature::RoomCleaning => "Room Cleaning",
            Feature::Airconditioned => "Air Conditioned",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown feature `{}`", s))
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomImage {
    pub id: i32,
    pub url: String,
    pub public_id: String,
    pub room_id: i32,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub address: String,
    pub guest_capacity: i32,
    pub num_of_beds: i32,
    pub price_per_night: f64,
    pub internet: bool,
    pub breakfast: bool,
    pub airconditioned: bool,
    pub pets_allowed: bool,
    pub room_cleaning: bool,
    pub ratings: f64,
    pub num_of_reviews: i32,
    pub category: Category,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub images: Vec<RoomImage>,
}

impl Room {
    pub fn has(&self, feature: Feature) -> bool {
        match feature {
            Feature::Internet => self.internet,
            Feature::Breakfast => self.breakfast,
            Feature::PetsAllowed => self.pets_allowed,
            Feature::RoomCleaning => self.room_cleaning,
            Feature::Airconditioned => self.airconditioned,
        }
    }

    pub fn features(&self) -> Vec<Feature> {
        Feature::ALL.into_iter().filter(|f| self.has(*f)).collect()
    }
}

/// Колонки `rooms` в порядке полей [`Room`].
pub const ROOM_COLUMNS: &str = "id, name, description, address, guest_capacity, num_of_beds, \
     price_per_night, internet, breakfast, airconditioned, pets_allowed, room_cleaning, \
     ratings, num_of_reviews, category, creator_id, created_at";

/// `NaN` и бесконечность в базе превращаются в `null` при сериализации.
pub fn finite(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new("finite"));
    }
    Ok(())
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    #[validate(custom(function = "not_blank"))]
    pub url: String,
    #[validate(custom(function = "not_blank"))]
    pub public_id: String,
}

/// Тело `postNewRoom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    #[validate(custom(function = "not_blank"))]
    pub address: String,
    #[serde(deserialize_with = "coerce::number")]
    #[validate(range(min = 0))]
    pub guest_capacity: i32,
    #[serde(deserialize_with = "coerce::number")]
    #[validate(range(min = 0))]
    pub num_of_beds: i32,
    #[serde(default, deserialize_with = "coerce::optional_number")]
    #[validate(range(min = 0.0), custom(function = "finite"))]
    pub price_per_night: Option<f64>,
    #[serde(deserialize_with = "coerce::flag")]
    pub internet: bool,
    #[serde(deserialize_with = "coerce::flag")]
    pub breakfast: bool,
    #[serde(deserialize_with = "coerce::flag")]
    pub airconditioned: bool,
    #[serde(deserialize_with = "coerce::flag")]
    pub pets_allowed: bool,
    #[serde(deserialize_with = "coerce::flag")]
    pub room_cleaning: bool,
    #[serde(default, deserialize_with = "coerce::optional_number")]
    #[validate(range(min = 0.0, max = 5.0), custom(function = "finite"))]
    pub ratings: Option<f64>,
    #[serde(default, deserialize_with = "coerce::optional_number")]
    #[validate(range(min = 0))]
    pub num_of_reviews: Option<i32>,
    pub category: Category,
    #[serde(default)]
    #[validate(nested)]
    pub images: Vec<ImageInput>,
}

/// Тело `putUpdateRoom`: `id` и только изменяемые поля.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomPatch {
    #[serde(deserialize_with = "coerce::number")]
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank"))]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub guest_capacity: Option<i32>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub num_of_beds: Option<i32>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0), custom(function = "finite"))]
    pub price_per_night: Option<f64>,
    #[serde(default, deserialize_with = "coerce::optional_flag", skip_serializing_if = "Option::is_none")]
    pub internet: Option<bool>,
    #[serde(default, deserialize_with = "coerce::optional_flag", skip_serializing_if = "Option::is_none")]
    pub breakfast: Option<bool>,
    #[serde(default, deserialize_with = "coerce::optional_flag", skip_serializing_if = "Option::is_none")]
    pub airconditioned: Option<bool>,
    #[serde(default, deserialize_with = "coerce::optional_flag", skip_serializing_if = "Option::is_none")]
    pub pets_allowed: Option<bool>,
    #[serde(default, deserialize_with = "coerce::optional_flag", skip_serializing_if = "Option::is_none")]
    pub room_cleaning: Option<bool>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 5.0), custom(function = "finite"))]
    pub ratings: Option<f64>,
    #[serde(default, deserialize_with = "coerce::optional_number", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub num_of_reviews: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[validate(nested)]
    pub images: Vec<ImageInput>,
}

impl RoomPatch {
    /// `true`, если меняется хотя бы одна колонка `rooms`.
    pub fn touches_row(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.address.is_some()
            || self.guest_capacity.is_some()
            || self.num_of_beds.is_some()
            || self.price_per_night.is_some()
            || self.internet.is_some()
            || self.breakfast.is_some()
            || self.airconditioned.is_some()
            || self.pets_allowed.is_some()
            || self.room_cleaning.is_some()
            || self.ratings.is_some()
            || self.num_of_reviews.is_some()
            || self.category.is_some()
    }
}

pub const INVALID_ID: &str = "Please provide a valid id.";

/// Идентификатор из адреса: только целое положительное число.
pub fn parse_room_id(raw: Option<&str>) -> Option<i32> {
    raw.map(str::trim)
        .and_then(|id| id.parse::<i32>().ok())
        .filter(|id| *id > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomId {
    #[serde(deserialize_with = "coerce::number")]
    pub id: i32,
}
