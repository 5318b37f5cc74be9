pub mod chunking;
pub mod embeddings;
pub mod index;
pub mod pipeline;
pub mod synthesis;
