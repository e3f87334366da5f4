//! Page view-models. Each holds the form and status state of one screen and
//! drives navigation through the shared [`crate::routing::Navigator`].

pub mod header;
pub mod home;
pub mod login;
pub mod register;
pub mod room;

pub use header::{Header, NavItem, NavOutcome, NAV_ITEMS};
pub use home::{HomeModal, HomeView, JoinForm};
pub use login::{LoginStep, LoginView};
pub use register::RegisterView;
pub use room::{RoomPage, RoomPageState};
