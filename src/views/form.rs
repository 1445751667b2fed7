use std::collections::BTreeSet;
use std::str::FromStr;

use validator::Validate;

use crate::client::RoomsApi;
use crate::coerce::flag_from_str;
use crate::error::MISSING_FIELDS;
use crate::models::{Category, ImageInput, NewRoom, Room, RoomPatch};

/// Поля формы номера в том виде, в каком их присылает HTML-форма.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomForm {
    pub id: Option<i32>,
    pub name: String,
    pub description: String,
    pub address: String,
    pub guest_capacity: String,
    pub num_of_beds: String,
    pub price_per_night: String,
    pub category: String,
    pub internet: String,
    pub breakfast: String,
    pub airconditioned: String,
    pub pets_allowed: String,
    pub room_cleaning: String,
    pub images: Vec<ImageInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub fields: BTreeSet<String>,
}

impl FormErrors {
    pub fn banner(&self) -> &'static str {
        MISSING_FIELDS
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    fn add(&mut self, field: &str) {
        self.fields.insert(field.to_string());
    }
}

fn required_text(value: &str, field: &str, errors: &mut FormErrors) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field);
    }
    value.to_string()
}

fn required_parse<T: FromStr + Default>(value: &str, field: &str, errors: &mut FormErrors) -> T {
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            errors.add(field);
            T::default()
        }
    }
}

impl RoomForm {
    /// Форма редактирования, заполненная текущими значениями номера.
    pub fn from_room(room: &Room) -> Self {
        RoomForm {
            id: Some(room.id),
            name: room.name.clone(),
            description: room.description.clone(),
            address: room.address.clone(),
            guest_capacity: room.guest_capacity.to_string(),
            num_of_beds: room.num_of_beds.to_string(),
            price_per_night: room.price_per_night.to_string(),
            category: room.category.to_string(),
            internet: room.internet.to_string(),
            breakfast: room.breakfast.to_string(),
            airconditioned: room.airconditioned.to_string(),
            pets_allowed: room.pets_allowed.to_string(),
            room_cleaning: room.room_cleaning.to_string(),
            images: Vec::new(),
        }
    }

    pub fn to_new_room(&self) -> Result<NewRoom, FormErrors> {
        let mut errors = FormErrors::default();

        let name = required_text(&self.name, "name", &mut errors);
        let description = required_text(&self.description, "description", &mut errors);
        let address = required_text(&self.address, "address", &mut errors);
        let guest_capacity = required_parse(&self.guest_capacity, "guest_capacity", &mut errors);
        let num_of_beds = required_parse(&self.num_of_beds, "num_of_beds", &mut errors);
        let price_per_night: f64 = required_parse(&self.price_per_night, "price_per_night", &mut errors);
        let category = match self.category.trim().to_uppercase().parse::<Category>() {
            Ok(category) => Some(category),
            Err(_) => {
                errors.add("category");
                None
            }
        };

        let Some(category) = category.filter(|_| errors.fields.is_empty()) else {
            return Err(errors);
        };

        let room = NewRoom {
            name,
            description,
            address,
            guest_capacity,
            num_of_beds,
            price_per_night: Some(price_per_night),
            internet: flag_from_str(&self.internet),
            breakfast: flag_from_str(&self.breakfast),
            airconditioned: flag_from_str(&self.airconditioned),
            pets_allowed: flag_from_str(&self.pets_allowed),
            room_cleaning: flag_from_str(&self.room_cleaning),
            ratings: None,
            num_of_reviews: None,
            category,
            images: self.images.clone(),
        };

        if let Err(invalid) = room.validate() {
            for field in invalid.errors().keys() {
                errors.add(field);
            }
            return Err(errors);
        }
        Ok(room)
    }

    /// Правка отправляет форму целиком; картинки только добавляются.
    pub fn to_patch(&self, id: i32) -> Result<RoomPatch, FormErrors> {
        let room = self.to_new_room()?;
        Ok(RoomPatch {
            id,
            name: Some(room.name),
            description: Some(room.description),
            address: Some(room.address),
            guest_capacity: Some(room.guest_capacity),
            num_of_beds: Some(room.num_of_beds),
            price_per_night: room.price_per_night,
            internet: Some(room.internet),
            breakfast: Some(room.breakfast),
            airconditioned: Some(room.airconditioned),
            pets_allowed: Some(room.pets_allowed),
            room_cleaning: Some(room.room_cleaning),
            ratings: None,
            num_of_reviews: None,
            category: Some(room.category),
            images: room.images,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FormStatus {
    #[default]
    Idle,
    Submitting,
    Failed(String),
    Saved(i32),
}

/// Экраны `/rooms/new` и `/rooms/{id}/edit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomFormPage {
    pub form: RoomForm,
    pub status: FormStatus,
    pub errors: Option<FormErrors>,
}

impl RoomFormPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(room: &Room) -> Self {
        RoomFormPage {
            form: RoomForm::from_room(room),
            ..Default::default()
        }
    }

    fn reject(&mut self, errors: FormErrors) {
        self.status = FormStatus::Failed(errors.banner().to_string());
        self.errors = Some(errors);
    }

    pub async fn submit<A: RoomsApi>(&mut self, api: &A) {
        self.errors = None;

        let saved = match self.form.id {
            Some(id) => match self.form.to_patch(id) {
                Ok(patch) => {
                    self.status = FormStatus::Submitting;
                    api.put_update_room(&patch).await
                }
                Err(errors) => return self.reject(errors),
            },
            None => match self.form.to_new_room() {
                Ok(room) => {
                    self.status = FormStatus::Submitting;
                    api.post_new_room(&room).await
                }
                Err(errors) => return self.reject(errors),
            },
        };

        self.status = match saved {
            Ok(room) => {
                tracing::info!("room {} saved", room.id);
                FormStatus::Saved(room.id)
            }
            Err(e) => FormStatus::Failed(e.to_string()),
        };
    }

    /// Куда перейти после сохранения.
    pub fn redirect(&self) -> Option<String> {
        match self.status {
            FormStatus::Saved(id) => Some(format!("/rooms/{}", id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::fake::{room, FakeApi};
    use proptest::prelude::*;

    fn filled() -> RoomForm {
        RoomForm {
            name: "Sea view".into(),
            description: "Bright room facing the bay".into(),
            address: "1 Harbour St".into(),
            guest_capacity: "2".into(),
            num_of_beds: " 1 ".into(),
            price_per_night: "80.5".into(),
            category: "king".into(),
            internet: "true".into(),
            breakfast: "false".into(),
            ..Default::default()
        }
    }

    #[test]
    fn filled_form_becomes_new_room() {
        let room = filled().to_new_room().unwrap();
        assert_eq!(room.num_of_beds, 1);
        assert_eq!(room.price_per_night, Some(80.5));
        assert_eq!(room.category, Category::King);
        assert!(room.internet);
        assert!(!room.breakfast && !room.room_cleaning);
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let form = RoomForm {
            name: "  ".into(),
            guest_capacity: "two".into(),
            category: "QUEEN".into(),
            ..filled()
        };
        let errors = form.to_new_room().unwrap_err();

        assert_eq!(errors.banner(), "Some of the required fields are missing");
        assert!(errors.has("name"));
        assert!(errors.has("guest_capacity"));
        assert!(errors.has("category"));
        assert!(!errors.has("address"));
    }

    #[test]
    fn negative_numbers_fail_validation() {
        let form = RoomForm { price_per_night: "-3".into(), ..filled() };
        let errors = form.to_new_room().unwrap_err();
        assert_eq!(errors.fields.iter().collect::<Vec<_>>(), vec!["price_per_night"]);
    }

    #[test]
    fn non_finite_price_is_a_field_error() {
        for price in ["NaN", "inf", "-infinity"] {
            let form = RoomForm { price_per_night: price.into(), ..filled() };
            let errors = form.to_new_room().unwrap_err();
            assert!(errors.has("price_per_night"), "{}", price);
        }
    }

    #[test]
    fn edit_form_round_trips_the_room() {
        let original = room(7);
        let form = RoomForm::from_room(&original);
        assert_eq!(form.breakfast, "true");
        assert_eq!(form.category, "TWINS");

        let patch = form.to_patch(7).unwrap();
        assert_eq!(patch.id, 7);
        assert_eq!(patch.name.as_deref(), Some("Room 7"));
        assert_eq!(patch.price_per_night, Some(80.0));
        assert_eq!(patch.pets_allowed, Some(false));
        assert!(patch.touches_row());
    }

    proptest! {
        #[test]
        fn stored_flags_follow_submitted_strings(
            flags in prop::collection::vec(
                prop::sample::select(vec!["true", "false", "", "on", "TRUE", "1"]),
                5,
            )
        ) {
            let form = RoomForm {
                internet: flags[0].into(),
                breakfast: flags[1].into(),
                airconditioned: flags[2].into(),
                pets_allowed: flags[3].into(),
                room_cleaning: flags[4].into(),
                ..filled()
            };
            let room = form.to_new_room().unwrap();
            prop_assert_eq!(
                [room.internet, room.breakfast, room.airconditioned, room.pets_allowed, room.room_cleaning],
                [flags[0] == "true", flags[1] == "true", flags[2] == "true", flags[3] == "true", flags[4] == "true"]
            );
        }
    }

    #[tokio::test]
    async fn create_saves_and_redirects() {
        let api = FakeApi::with_rooms(vec![room(1)]);
        let mut page = RoomFormPage::new();
        page.form = RoomForm { pets_allowed: "true".into(), ..filled() };

        page.submit(&api).await;

        assert_eq!(page.status, FormStatus::Saved(2));
        assert_eq!(page.redirect().as_deref(), Some("/rooms/2"));
        let stored = api.get_single_room(2).await.unwrap();
        assert!(stored.pets_allowed && stored.internet && !stored.breakfast);
    }

    #[tokio::test]
    async fn invalid_form_is_not_sent() {
        let api = FakeApi::default();
        let mut page = RoomFormPage { form: RoomForm::default(), ..Default::default() };

        page.submit(&api).await;

        assert_eq!(page.status, FormStatus::Failed(MISSING_FIELDS.to_string()));
        assert!(page.errors.as_ref().is_some_and(|e| e.has("address")));
        assert_eq!(page.redirect(), None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn edit_updates_existing_room() {
        let api = FakeApi::with_rooms(vec![room(3)]);
        let mut page = RoomFormPage::edit(&room(3));
        page.form.name = "Renamed".into();
        page.form.breakfast = "false".into();

        page.submit(&api).await;

        assert_eq!(page.status, FormStatus::Saved(3));
        let stored = api.get_single_room(3).await.unwrap();
        assert_eq!(stored.name, "Renamed");
        assert!(!stored.breakfast);
        assert_eq!(api.calls()[0], "putUpdateRoom 3");
    }

    #[tokio::test]
    async fn api_failure_keeps_the_form() {
        let api = FakeApi::default();
        let mut page = RoomFormPage::edit(&room(9));

        page.submit(&api).await;

        assert_eq!(page.status, FormStatus::Failed("Room 9 not found".into()));
        assert_eq!(page.form.name, "Room 9");
        assert_eq!(page.redirect(), None);
    }
}
