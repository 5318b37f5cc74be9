use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::retrieval::pipeline::RetrievalPipeline;
use crate::retrieval::synthesis::AnswerSynthesizer;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    answer: String,
}

/// POST /ask
///
/// Retrieves the top-k chunks for the query from the session's active
/// index, assembles them into a context string, and synthesizes a
/// context-only answer.
pub async fn ask_question(
    state: web::Data<AppState>,
    body: web::Json<AskRequest>,
) -> AppResult<HttpResponse> {
    // Check the session before the query so the "upload first" message
    // wins when both are missing.
    if state.session.get().is_none() {
        return Err(AppError::NoIndex);
    }

    let query = body.query.as_deref().unwrap_or("").trim().to_string();
    if query.is_empty() {
        return Err(AppError::InvalidQuery);
    }

    let pipeline = RetrievalPipeline::new(state.embeddings.as_ref(), state.config.top_k);
    let context = pipeline.retrieve(&state.session, &query).await?;

    let synthesizer = AnswerSynthesizer::new(state.generator.as_ref());
    let answer = synthesizer.synthesize(&context, &query).await?;

    info!("Answered query ({} chars of context)", context.len());

    Ok(HttpResponse::Ok().json(AskResponse { answer }))
}
