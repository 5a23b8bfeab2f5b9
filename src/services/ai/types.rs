use serde::{Deserialize, Serialize};

use super::embedding::SearchResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
}

impl ChatUsage {
    pub fn new(input_tokens: i64, output_tokens: i64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// Raw completion returned by a language model.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub question: String,
    pub answer: String,
    /// Chunks handed to the model, best first.
    pub context: Vec<SearchResult>,
    pub usage: Option<ChatUsage>,
}
