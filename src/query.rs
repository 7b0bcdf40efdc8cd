//! Retrieval-augmented answering.
//!
//! Embeds the question with the collection's embedding model, retrieves
//! the top-k nearest chunks, assembles them into a bounded context
//! block, and asks the completion model to answer from that context
//! only. An empty collection produces an empty context block; the
//! prompt still carries the instruction and the question, and the model
//! is expected to say it cannot answer.

use anyhow::{bail, Result};

use crate::completion::CompletionClient;
use crate::embedding::Embedder;
use crate::models::RetrievedChunk;
use crate::store::CollectionHandle;

/// Fixed instruction prepended to every prompt.
const PROMPT_INSTRUCTION: &str = "Answer the question using *only* the context below. \
If the context is irrelevant, say so politely.";

/// Answer `question` from passages retrieved out of `handle`'s
/// collection. `top_k` bounds the context; fewer available chunks is
/// fine. Completion errors surface to the caller unretried.
pub async fn answer(
    handle: &CollectionHandle,
    question: &str,
    embedder: &dyn Embedder,
    completion: &dyn CompletionClient,
    top_k: usize,
) -> Result<String> {
    if embedder.model_name() != handle.model() {
        bail!(
            "collection '{}' expects embedding model '{}', not '{}'",
            handle.name(),
            handle.model(),
            embedder.model_name()
        );
    }

    let query_vec = embedder
        .embed(&[question.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("embedding request failed: empty response for question"))?;

    let retrieved = handle.similarity_search(&query_vec, top_k).await?;
    let context = assemble_context(&retrieved);
    let prompt = build_prompt(&context, question);

    completion.complete(&prompt).await
}

/// Join retrieved chunk texts with a blank line, in the order the
/// search returned them (search-provided ranking, not re-sorted).
pub fn assemble_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fixed instruction + context block + the literal question.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "{}\n\nContext:\n{}\n\nQuestion: {}",
        PROMPT_INSTRUCTION, context, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(text: &str, page: u32, score: f64) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            page_number: page,
            score,
        }
    }

    #[test]
    fn test_context_preserves_search_order() {
        let chunks = vec![
            retrieved("second-best match", 2, 0.8),
            retrieved("best match", 1, 0.9),
        ];
        // Order in, order out: the ranking is the search's business.
        let context = assemble_context(&chunks);
        assert_eq!(context, "second-best match\n\nbest match");
    }

    #[test]
    fn test_context_empty_for_no_chunks() {
        assert_eq!(assemble_context(&[]), "");
    }

    #[test]
    fn test_prompt_contains_question_verbatim() {
        let question = "What does the document say?";
        let prompt = build_prompt("some context", question);
        assert!(prompt.contains(question));
        assert!(prompt.contains("Context:\nsome context"));
        assert!(prompt.contains("*only* the context"));
    }

    #[test]
    fn test_prompt_with_empty_context_keeps_instruction_and_question() {
        let prompt = build_prompt("", "Anything here?");
        assert!(prompt.starts_with(PROMPT_INSTRUCTION));
        assert!(prompt.ends_with("Question: Anything here?"));
    }
}
