pub mod api;
pub mod auth;
pub mod call;
pub mod chat;
pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod routing;
pub mod rtm;
pub mod state;
pub mod transport;
pub mod views;
pub mod whiteboard;

pub use config::Config;
pub use error::{ClientError, Result};
pub use state::AppState;
