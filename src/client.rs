//! Типизированный клиент RPC-поверхности `/api`.

use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::future::Future;
use thiserror::Error;

use crate::models::{NewRoom, Room, RoomPatch};
use crate::search_client::RoomSearch;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

/// Операции над номерами, которые использует UI.
pub trait RoomsApi {
    fn get_all_rooms(
        &self,
        search: &RoomSearch,
    ) -> impl Future<Output = Result<(i64, Vec<Room>), ClientError>> + Send;

    fn get_single_room(&self, id: i32) -> impl Future<Output = Result<Room, ClientError>> + Send;

    fn post_new_room(&self, input: &NewRoom) -> impl Future<Output = Result<Room, ClientError>> + Send;

    fn put_update_room(&self, patch: &RoomPatch) -> impl Future<Output = Result<Room, ClientError>> + Send;

    fn delete_single_room(&self, id: i32) -> impl Future<Output = Result<Room, ClientError>> + Send;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RpcClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Клиент, который отправляет токен сессии как `Bearer`.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, procedure: &str) -> String {
        format!("{}/api/{}", self.base_url, procedure)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        Err(ClientError::Api { status: status.as_u16(), message })
    }
}

impl RoomsApi for RpcClient {
    async fn get_all_rooms(&self, search: &RoomSearch) -> Result<(i64, Vec<Room>), ClientError> {
        self.call(self.http.get(self.url("room.getAllRooms")).query(search))
            .await
    }

    async fn get_single_room(&self, id: i32) -> Result<Room, ClientError> {
        self.call(self.http.get(self.url("room.getSingleRoom")).query(&[("id", id)]))
            .await
    }

    async fn post_new_room(&self, input: &NewRoom) -> Result<Room, ClientError> {
        self.call(self.http.post(self.url("postNewRoom")).json(input))
            .await
    }

    async fn put_update_room(&self, patch: &RoomPatch) -> Result<Room, ClientError> {
        self.call(self.http.post(self.url("putUpdateRoom")).json(patch))
            .await
    }

    async fn delete_single_room(&self, id: i32) -> Result<Room, ClientError> {
        self.call(self.http.post(self.url("deleteSingleRoom")).json(&json!({ "id": id })))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{room::tests::fake_new_room, Category};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn room_json(id: i32) -> serde_json::Value {
        json!({
            "id": id,
            "name": "Loft",
            "description": "Top floor",
            "address": "2 Mill Lane",
            "guestCapacity": 2,
            "numOfBeds": 1,
            "pricePerNight": 95.0,
            "internet": true,
            "breakfast": false,
            "airconditioned": false,
            "petsAllowed": false,
            "roomCleaning": true,
            "ratings": 4.5,
            "numOfReviews": 12,
            "category": "KING",
            "creatorId": null,
            "createdAt": "2024-05-01T10:00:00Z",
            "images": [{"id": 1, "url": "https://img/1.jpg", "publicId": "rooms/1", "roomId": id}]
        })
    }

    #[tokio::test]
    async fn listing_sends_filters_as_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/room.getAllRooms"))
            .and(query_param("category", "KING"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([6, [room_json(3)]])))
            .expect(1)
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri());
        let search = RoomSearch { category: Some(Category::King), page: Some(2), ..Default::default() };
        let (count, rooms) = client.get_all_rooms(&search).await.unwrap();

        assert_eq!(count, 6);
        assert_eq!(rooms[0].id, 3);
        assert_eq!(rooms[0].images[0].public_id, "rooms/1");
    }

    #[tokio::test]
    async fn mutations_carry_the_session_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/deleteSingleRoom"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({"id": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(room_json(3)))
            .expect(1)
            .mount(&server)
            .await;

        let client = RpcClient::new(format!("{}/", server.uri())).with_token("secret");
        let deleted = client.delete_single_room(3).await.unwrap();
        assert_eq!(deleted.id, 3);
    }

    #[tokio::test]
    async fn api_errors_keep_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/postNewRoom"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"success": false, "error": "UNAUTHORIZED"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/room.getSingleRoom"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri());

        let err = client.post_new_room(&fake_new_room()).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "UNAUTHORIZED");

        let err = client.get_single_room(99).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not Found");
    }
}
