// embeddings/ — Word embedding sources.
//
// Provides:
// - Hosted embedding API client with blind fixed-interval pacing
// - Local BERT inference with leading-token-excluded mean reduction
// - Model file download + SHA256 digest check

pub mod download;
pub mod engine;
pub mod pacing;
pub mod remote;

/// Maps one word to one embedding vector.
///
/// Sources take `&mut self` because pacing state advances with every call.
pub trait EmbeddingSource {
    /// Component type as produced by the source: `f32` for local inference,
    /// `f64` for the JSON numbers the hosted API returns. Written with its
    /// shortest round-trip `Debug` form, so neither is widened nor narrowed.
    type Component: Copy + std::fmt::Debug;

    fn embed(&mut self, word: &str) -> anyhow::Result<Vec<Self::Component>>;

    /// Short identifier for logs (engine or model name).
    fn name(&self) -> &str;
}
