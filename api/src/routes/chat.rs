pub mod chat_route;
pub mod chat_stream;
