//! Terminal-side client for the campus chat endpoint.
//!
//! [`ChatSession`] is a pure state machine over the conversation; the
//! [`ChatTransport`] feeds it from the network. Rendering helpers live in
//! [`display`] and [`typing`].

pub mod display;
pub mod error;
pub mod message;
pub mod session;
pub mod transport;
pub mod typing;

pub use error::ClientError;
pub use message::{Message, Role};
pub use session::{ChatSession, Phase};
pub use transport::ChatTransport;
pub use typing::{TYPING_DELAY, TypingProjection};
