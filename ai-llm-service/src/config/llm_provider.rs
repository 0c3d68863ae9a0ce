/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// Only Google Gemini is wired today. Adding another hosted provider means
/// extending this enum and adding a service under `services/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Google Generative Language API (Gemini).
    Gemini,
}
