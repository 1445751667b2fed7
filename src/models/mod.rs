pub mod room;
pub mod user;

pub use room::{Category, Feature, ImageInput, NewRoom, Room, RoomId, RoomImage, RoomPatch};
pub use user::{NewUser, User};
