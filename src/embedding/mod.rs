//! 임베딩 모듈 - 로컬 fastembed 모델을 통한 텍스트 벡터화
//!
//! 텍스트를 고정 차원 벡터로 변환하는 프로바이더입니다.
//! 지식 베이스 질문과 질의 키워드가 같은 모델로 임베딩되어야
//! 유사도 점수가 의미를 가집니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = LocalEmbedding::new("all-MiniLM-L6-v2", cache_dir)?;
//! let embedding = embedder.embed("matemática").await?;
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{InitOptions, TextEmbedding};

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
/// 같은 입력에는 같은 벡터를 돌려준다고 가정합니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Local fastembed model
// ============================================================================

/// 기본 모델 (sentence-transformers all-MiniLM-L6-v2, 384차원)
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// fastembed 로컬 임베딩 구현체
///
/// fastembed의 `embed()`가 `&mut self`를 요구하므로 Mutex로 감싸고,
/// CPU 연산은 `spawn_blocking`에서 실행합니다.
pub struct LocalEmbedding {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for LocalEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEmbedding")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl LocalEmbedding {
    /// 모델 로드 (캐시에 없으면 첫 사용 시 다운로드)
    ///
    /// # Arguments
    /// * `model_name` - 모델 이름 (예: "all-MiniLM-L6-v2")
    /// * `cache_dir` - 모델 캐시 디렉토리
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self> {
        let model_enum = parse_model_name(model_name)?;

        std::fs::create_dir_all(&cache_dir).context("Failed to create model cache directory")?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(true);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| anyhow::anyhow!("Model initialization failed: {}", e))?;

        // 테스트 문자열로 차원 확인
        let dimension = model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| anyhow::anyhow!("Failed to probe dimensions: {}", e))?
            .first()
            .map(|v| v.len())
            .ok_or_else(|| anyhow::anyhow!("Model returned no embedding"))?;

        tracing::info!(
            "Loaded embedding model {} (dimension: {})",
            model_name,
            dimension
        );

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: model_name.to_string(),
            dimension,
        })
    }

    fn embed_blocking(model: &Mutex<TextEmbedding>, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut model = model
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        model
            .embed(texts, None)
            .map_err(|e| anyhow::anyhow!("Embedding generation failed: {}", e))
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();

        let mut embeddings =
            tokio::task::spawn_blocking(move || Self::embed_blocking(&model, vec![text]))
                .await
                .context("Embedding task failed")??;

        embeddings
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        let expected = texts.len();

        let embeddings = tokio::task::spawn_blocking(move || Self::embed_blocking(&model, texts))
            .await
            .context("Embedding task failed")??;

        if embeddings.len() != expected {
            anyhow::bail!(
                "Embedding batch size mismatch: expected {}, got {}",
                expected,
                embeddings.len()
            );
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// 모델 이름 → fastembed 열거형
fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l6-v2-q" | "allminiml6v2q" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q),
        "paraphrase-multilingual-minilm-l12-v2" | "paraphrasemlminilml12v2" => {
            Ok(fastembed::EmbeddingModel::ParaphraseMLMiniLML12V2)
        }
        "multilingual-e5-small" | "multilinguale5small" => {
            Ok(fastembed::EmbeddingModel::MultilingualE5Small)
        }
        "bge-small-en-v1.5" | "bgesmallenv15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        _ => anyhow::bail!(
            "Unknown model: {}. Supported models: all-MiniLM-L6-v2, \
             paraphrase-multilingual-MiniLM-L12-v2, multilingual-e5-small, bge-small-en-v1.5 \
             (add -q suffix to all-MiniLM-L6-v2 for quantized)",
            name
        ),
    }
}

// ============================================================================
// Factory Function
// ============================================================================

/// 설정으로부터 임베딩 프로바이더 생성
pub fn create_embedder(model_name: &str, cache_dir: PathBuf) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder = LocalEmbedding::new(model_name, cache_dir)
        .with_context(|| format!("Failed to load embedding model '{}'", model_name))?;
    Ok(Arc::new(embedder))
}

// ============================================================================
// Test Support
// ============================================================================

/// 단어 → 벡터 고정 테이블 프로바이더 (테스트용)
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use anyhow::Result;
    use async_trait::async_trait;

    use super::EmbeddingProvider;

    pub(crate) struct TableEmbedding {
        pub vectors: HashMap<String, Vec<f32>>,
        pub fallback: Vec<f32>,
        pub fail_on: Option<String>,
    }

    impl TableEmbedding {
        pub fn new(entries: &[(&str, Vec<f32>)], fallback: Vec<f32>) -> Self {
            Self {
                vectors: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                fallback,
                fail_on: None,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TableEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.fail_on.as_deref() == Some(text) {
                anyhow::bail!("provider unavailable for '{}'", text);
            }
            Ok(self
                .vectors
                .get(text)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()))
        }

        fn dimension(&self) -> usize {
            self.fallback.len()
        }

        fn name(&self) -> &str {
            "table"
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::testing::TableEmbedding;
    use super::*;

    #[test]
    fn test_parse_model_name() {
        assert!(parse_model_name("all-MiniLM-L6-v2").is_ok());
        assert!(parse_model_name("ALL-MINILM-L6-V2-Q").is_ok());
        assert!(parse_model_name("multilingual-e5-small").is_ok());
    }

    #[test]
    fn test_invalid_model_name() {
        let err = parse_model_name("nonexistent-model").err();
        assert!(err
            .map(|e| e.to_string().contains("Unknown model"))
            .unwrap_or(false));
    }

    #[tokio::test]
    async fn test_default_embed_batch_is_sequential_embed() {
        let provider = TableEmbedding::new(&[("um", vec![1.0, 0.0]), ("dois", vec![0.0, 1.0])], vec![0.5, 0.5]);
        let texts = vec!["um".to_string(), "dois".to_string(), "tres".to_string()];

        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch, vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]]);
    }

    #[tokio::test]
    async fn test_embed_batch_propagates_failure() {
        let mut provider = TableEmbedding::new(&[], vec![1.0]);
        provider.fail_on = Some("quebra".to_string());
        let texts = vec!["ok".to_string(), "quebra".to_string()];

        assert!(provider.embed_batch(&texts).await.is_err());
    }

    // 모델 다운로드 필요 - --ignored로 실행
    #[tokio::test]
    #[ignore = "requires model download"]
    async fn test_local_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let model = LocalEmbedding::new(DEFAULT_MODEL, dir.path().to_path_buf()).unwrap();
        assert_eq!(model.dimension(), 384);

        let embedding = model.embed("matemática").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
