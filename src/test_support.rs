//! Shared fixtures for unit tests: a deterministic embedder, a scripted
//! language model, a tiny PDF writer and a throwaway HTTP server.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crate::error::{AppError, AppResult};
use crate::services::{
    DocumentChunk, Embedder, Generation, LanguageModel, VectorConfig, VectorStore,
};

pub const SAMPLE_PAGES: &[&[&str]] = &[
    &[
        "Harbor lighthouse operations manual",
        "The keeper inspects the lamp every evening before sunset.",
    ],
    &[
        "Fog signals sound every thirty seconds during low visibility.",
        "Keep the horn compressor oiled and check the air pressure daily.",
    ],
    &["Visitors may climb the tower on Saturdays between noon and four."],
];

/// Bag-of-words vectors hashed into `dimension` buckets, L2 normalised.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) as usize % self.dimension;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            vector[0] = 1.0;
        } else {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf29ce484222325u64, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "test/hash-embedder"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}

/// Language model that answers from a script and records every prompt.
pub struct ScriptedModel {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn reply(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> String {
        "scripted/test".to_string()
    }

    async fn generate(&self, prompt: &str) -> AppResult<Generation> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(Generation {
                text: text.clone(),
                usage: None,
            }),
            Err(message) => Err(AppError::AiService(message.clone())),
        }
    }

    async fn health_check(&self) -> AppResult<()> {
        match &self.reply {
            Ok(_) => Ok(()),
            Err(message) => Err(AppError::AiService(message.clone())),
        }
    }
}

pub fn sample_chunks() -> Vec<DocumentChunk> {
    let mut chunks = Vec::new();
    for (page_idx, lines) in SAMPLE_PAGES.iter().enumerate() {
        for (line_idx, line) in lines.iter().enumerate() {
            chunks.push(DocumentChunk {
                chunk_id: chunks.len() as i64,
                source: "manual.pdf".to_string(),
                page_number: page_idx as i32 + 1,
                chunk_index: line_idx as i32,
                text: line.to_string(),
            });
        }
    }
    chunks
}

pub fn small_chunk_config() -> VectorConfig {
    VectorConfig {
        chunk_size: 120,
        chunk_overlap: 20,
        ..VectorConfig::default()
    }
}

pub fn test_vector_config(dir: &Path) -> VectorConfig {
    VectorConfig {
        lancedb_path: dir.join("vectorstore").to_string_lossy().to_string(),
        table_name: "test_chunks".to_string(),
        embed_batch_size: 2,
        ..VectorConfig::default()
    }
}

pub async fn temp_store(dir: &Path) -> VectorStore {
    VectorStore::open_or_create(test_vector_config(dir), Arc::new(HashEmbedder::new(64)))
        .await
        .unwrap()
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_mock_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// Write a minimal PDF 1.4 file, one text line per entry, Helvetica 12pt.
pub fn write_sample_pdf(path: &Path, pages: &[&[&str]]) -> io::Result<()> {
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            (0..pages.len())
                .map(|i| format!("{} 0 R", 4 + 2 * i))
                .collect::<Vec<_>>()
                .join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    for (i, lines) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + 2 * i
        ));

        let mut content = String::from("BT\n/F1 12 Tf\n72 720 Td\n");
        for (j, line) in lines.iter().enumerate() {
            if j > 0 {
                content.push_str("0 -16 Td\n");
            }
            content.push_str(&format!("({}) Tj\n", escape_pdf_string(line)));
        }
        content.push_str("ET");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    fs::write(path, out)
}

fn escape_pdf_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '(' | ')') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
