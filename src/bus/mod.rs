//! # Communication Bus
//!
//! Asynchronous message routing between registered components: targeted
//! delivery, timed request/response correlation, and per-category broadcast.

pub mod errors;
pub mod message;
pub mod router;

pub use errors::{BusError, BusResult};
pub use message::{
    ComponentMessage, BROADCAST_OF_HEADER, BROADCAST_TARGET, ERROR_MESSAGE_TYPE,
    UNAVAILABLE_MESSAGE_TYPE,
};
pub use router::{handler_fn, BusStats, CommunicationBus, MessageEndpoint, MessageHandler};
