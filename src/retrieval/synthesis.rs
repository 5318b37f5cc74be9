use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::error::{AppError, AppResult};

const PROMPT_TEMPLATE: &str = r#"You are a precise, helpful document analyst.
Use ONLY the context below to answer the question.
If the answer is not present in the context, say:
"I don't have enough information in the document to answer that."

Context:
{context}

Question: {question}

Answer:"#;

/// Prompt-to-completion capability behind a narrow interface.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}

/// Chat-completion backend speaking the OpenAI wire format (Groq by
/// default). Decoding is pinned to temperature zero so identical prompts
/// produce reproducible answers.
pub struct GroqClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl GenerationProvider for GroqClient {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        debug!("Requesting completion from {}", self.model);

        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Generation(anyhow::anyhow!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(anyhow::anyhow!(
                "backend returned {status}: {body}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Generation(anyhow::anyhow!("malformed response: {e}")))?;

        let answer = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                AppError::Generation(anyhow::anyhow!("response missing message content"))
            })?;

        Ok(answer.to_string())
    }
}

/// Builds the grounded prompt and invokes the generation capability.
///
/// The completion comes back unmodified: no post-processing, no citation
/// extraction, and failures surface as `Generation` without retry.
pub struct AnswerSynthesizer<'a> {
    generator: &'a dyn GenerationProvider,
}

impl<'a> AnswerSynthesizer<'a> {
    pub fn new(generator: &'a dyn GenerationProvider) -> Self {
        Self { generator }
    }

    pub async fn synthesize(&self, context: &str, question: &str) -> AppResult<String> {
        let prompt = render_prompt(context, question);
        self.generator.complete(&prompt).await
    }
}

fn render_prompt(context: &str, question: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}
