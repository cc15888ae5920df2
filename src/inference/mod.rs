pub mod gemini;
pub mod provider;

pub use gemini::GeminiClient;
pub use provider::{
    CannedProvider, Citation, Completion, CompletionProvider, CompletionRequest, InferenceError,
};
