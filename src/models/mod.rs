pub mod chat;
pub mod room;
pub mod user;

pub use chat::{ChatAuthor, ChatMessage};
pub use room::RoomName;
pub use user::{
    AccessTokenResponse, CheckEmailRequest, CheckEmailResponse, Claims, ErrorBody, LoginRequest,
    MediaTokenResponse, RegisterRequest, User,
};
