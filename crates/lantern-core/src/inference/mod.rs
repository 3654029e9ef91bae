//! Inference engine interface and the generation error taxonomy.

mod adapter;
mod error;

pub use adapter::{
    AdapterCapabilities, GenerationParams, InferenceAdapter, ModelStatus, TokenChunk, TokenStream,
};
pub use error::{AdapterError, ErrorInfo, FailurePhase, GenerationError, InferenceErrorCode};
