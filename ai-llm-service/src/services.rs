pub mod gemini_service;
pub mod sse;
