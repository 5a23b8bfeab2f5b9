//! Overlapping text chunking on top of `text-splitter`

use text_splitter::{Characters, ChunkConfig, MarkdownSplitter};
use tokenizers::Tokenizer;

use crate::error::{AppResult, ResultExt};
use crate::services::{ChunkSizer, VectorConfig};

// pdf_oxide hands back markdown, so split on markdown structure first
enum Splitter {
    Characters(MarkdownSplitter<Characters>),
    Tokens(MarkdownSplitter<Tokenizer>),
}

pub struct Chunker {
    splitter: Splitter,
}

impl Chunker {
    pub fn new(config: &VectorConfig) -> AppResult<Self> {
        let chunk_config = ChunkConfig::new(config.chunk_size)
            .with_overlap(config.chunk_overlap)
            .config_err("invalid chunk overlap")?;

        let splitter = match config.chunk_sizer {
            ChunkSizer::Characters => Splitter::Characters(MarkdownSplitter::new(chunk_config)),
            ChunkSizer::Tokens => {
                let tokenizer = Tokenizer::from_pretrained(&config.embedding_model, None)
                    .config_err("failed to load tokenizer")?;
                Splitter::Tokens(MarkdownSplitter::new(chunk_config.with_sizer(tokenizer)))
            }
        };

        Ok(Self { splitter })
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        match &self.splitter {
            Splitter::Characters(splitter) => splitter.chunks(text).map(str::to_string).collect(),
            Splitter::Tokens(splitter) => splitter.chunks(text).map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn config(size: usize, overlap: usize) -> VectorConfig {
        VectorConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            ..VectorConfig::default()
        }
    }

    #[test]
    fn chunks_respect_size_and_cover_text() {
        let chunker = Chunker::new(&config(80, 20)).unwrap();
        let text = "Tide tables list high and low water for each day. ".repeat(12);

        let chunks = chunker.split(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 80, "chunk too long: {chunk:?}");
            assert!(!chunk.trim().is_empty());
        }
        assert!(chunks[0].starts_with("Tide tables"));
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let chunker = Chunker::new(&config(60, 30)).unwrap();
        let words: Vec<String> = (0..60).map(|i| format!("w{i}")).collect();
        let text = words.join(" ");

        let chunks = chunker.split(&text);
        assert!(chunks.len() > 2);
        let last_word_of_first = chunks[0].split_whitespace().last().unwrap();
        assert!(
            chunks[1].contains(last_word_of_first),
            "expected {last_word_of_first} in {:?}",
            chunks[1]
        );
    }

    #[test]
    fn splitting_is_deterministic() {
        let chunker = Chunker::new(&config(100, 10)).unwrap();
        let text = "# Keeper log\n\nLamp lit at dusk.\n\nShip sighted at dawn. ".repeat(8);
        assert_eq!(chunker.split(&text), chunker.split(&text));
    }

    #[test]
    fn overlap_larger_than_size_is_rejected() {
        let err = Chunker::new(&config(50, 60)).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }
}
