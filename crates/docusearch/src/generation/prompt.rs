//! Prompt templates for grounded answers with `[Source N]` citations

use crate::types::Chunk;

use super::INSUFFICIENT_CONTEXT_ANSWER;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Numbered context block; `[Source N]` is the N-th retrieved chunk
    pub fn build_context(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| format!("[Source {}]: {}", i + 1, chunk.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the full RAG prompt
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are an expert research assistant analyzing academic documents. Answer using ONLY the provided context.

INSTRUCTIONS:
1. Read ALL the provided sources carefully before answering
2. Answer the question thoroughly using information from the context
3. Cite specific sources using the [Source N] format when making claims
4. If multiple sources contain relevant information, synthesize them
5. If the context lacks sufficient information, explicitly state: "{insufficient}"
6. Be specific and include relevant facts, numbers and examples from the sources
7. Do not make assumptions or add information that is not present in the context

CONTEXT FROM DOCUMENTS:
{context}

USER QUESTION: {question}

DETAILED ANSWER:"#,
            insufficient = INSUFFICIENT_CONTEXT_ANSWER.trim_end_matches('.'),
            context = context,
            question = question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkSource;

    fn chunk(text: &str) -> Chunk {
        Chunk::new(text.to_string(), ChunkSource::pdf("paper.pdf", 1), 0)
    }

    #[test]
    fn test_context_is_numbered_in_rank_order() {
        let context = PromptBuilder::build_context(&[chunk("first"), chunk("second")]);
        assert_eq!(context, "[Source 1]: first\n\n[Source 2]: second");
    }

    #[test]
    fn test_prompt_contains_contract() {
        let prompt = PromptBuilder::build_rag_prompt("What is BERT?", "[Source 1]: BERT is...");
        assert!(prompt.contains("[Source N]"));
        assert!(prompt.contains("ONLY the provided context"));
        assert!(prompt.contains("do not contain enough information"));
        assert!(prompt.contains("USER QUESTION: What is BERT?"));
        assert!(prompt.contains("[Source 1]: BERT is..."));
    }
}
