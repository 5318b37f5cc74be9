use crate::error::{AppError, AppResult};
use crate::retrieval::embeddings::EmbeddingProvider;
use crate::session::SessionStore;

/// Orchestrates query embedding, index search, and context assembly.
///
/// Retrieval is all-or-nothing per call: no retries, no partial context.
/// The embedder handed in here must be the same identity that built the
/// active index.
pub struct RetrievalPipeline<'a> {
    embedder: &'a dyn EmbeddingProvider,
    top_k: usize,
}

impl<'a> RetrievalPipeline<'a> {
    pub fn new(embedder: &'a dyn EmbeddingProvider, top_k: usize) -> Self {
        Self { embedder, top_k }
    }

    /// Embed the query, search the active index, and join the retrieved
    /// chunk texts with blank lines into one context string.
    pub async fn retrieve(&self, session: &SessionStore, query_text: &str) -> AppResult<String> {
        let index = session.get().ok_or(AppError::NoIndex)?;

        let query = query_text.trim();
        if query.is_empty() {
            return Err(AppError::InvalidQuery);
        }

        let query_vector = self.embedder.embed(query).await?;
        let results = index.search(&query_vector, self.top_k);

        // Empty only when top_k is zero; the index itself can never be
        // empty past build.
        let context = results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(context)
    }
}
