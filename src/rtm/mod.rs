pub mod buffer;
pub mod channel;
pub mod messages;
pub mod multiplexer;

pub use buffer::{BufferCursor, EventBuffer};
pub use channel::{RtmLogin, SignalingConnector, WsSignaling};
pub use messages::{event_types, RaiseHandEvent, ReactionEvent, RtmEvent, WhiteboardEvent};
pub use multiplexer::{RtmBuffers, RtmMultiplexer};
