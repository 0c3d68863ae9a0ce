//! Wire types shared by the chat endpoint and its clients.
//!
//! Streaming answers travel as newline-delimited JSON frames
//! ([`StreamFrame`]); [`FrameDecoder`] reassembles them from arbitrary
//! network chunks. Non-streaming answers use [`ChatAnswer`] or [`ErrorBody`].

mod decoder;
mod dto;
mod frame;

pub use decoder::FrameDecoder;
pub use dto::{ChatAnswer, ChatRequest, ErrorBody};
pub use frame::{NO_IMAGE, StreamFrame};

/// Path of the chat route, relative to the server root.
pub const CHAT_PATH: &str = "/api/chat";

/// Content type of a streamed answer.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";
