//! Knowledge Loader - JSON 질문/답변 파일 로드 및 임베딩
//!
//! 디렉토리 구조:
//! ```text
//! <base>/slot1/versionamento1/*.json
//! <base>/slot2/versionamento1/*.json
//! ...
//! ```
//! 각 파일은 `[{"pergunta": "...", "resposta": "..."}]` 배열입니다.
//! 슬롯 순서 → 파일 이름 순서로 읽어 로드 순서를 고정합니다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::embedding::EmbeddingProvider;

use super::entry::{KnowledgeBase, KnowledgeEntry, QaRecord};

/// 기본 슬롯 개수
pub const DEFAULT_SLOT_COUNT: usize = 4;

/// 기본 버전 디렉토리 이름
pub const DEFAULT_VERSION_DIR: &str = "versionamento1";

// ============================================================================
// Layout
// ============================================================================

/// 지식 베이스 디렉토리 구조
#[derive(Debug, Clone)]
pub struct BaseLayout {
    pub root: PathBuf,
    pub slot_count: usize,
    pub version_dir: String,
}

impl BaseLayout {
    /// 기본 구조 (4 슬롯, versionamento1)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            slot_count: DEFAULT_SLOT_COUNT,
            version_dir: DEFAULT_VERSION_DIR.to_string(),
        }
    }

    /// 슬롯 디렉토리 경로 (1-based)
    pub fn slot_dir(&self, slot: usize) -> PathBuf {
        self.root
            .join(format!("slot{}", slot))
            .join(&self.version_dir)
    }
}

/// 한 파일에서 읽은 레코드
#[derive(Debug, Clone)]
pub struct RecordFile {
    pub slot: usize,
    pub path: PathBuf,
    pub records: Vec<QaRecord>,
}

// ============================================================================
// Reading
// ============================================================================

/// 슬롯의 JSON 파일 목록 (파일 이름 순)
fn slot_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        tracing::debug!("Slot directory not found: {}", dir.display());
        return Vec::new();
    }

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!("Failed to read directory entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect()
}

/// JSON 레코드 파일 읽기
pub fn read_records(path: &Path) -> Result<Vec<QaRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// 전체 레코드 파일 읽기 (로드 순서)
///
/// 읽기/파싱에 실패한 파일은 경고 후 건너뜁니다.
pub fn read_all(layout: &BaseLayout) -> Vec<RecordFile> {
    let mut files = Vec::new();

    for slot in 1..=layout.slot_count {
        for path in slot_files(&layout.slot_dir(slot)) {
            match read_records(&path) {
                Ok(records) => files.push(RecordFile {
                    slot,
                    path,
                    records,
                }),
                Err(e) => tracing::warn!("Skipping knowledge file: {:#}", e),
            }
        }
    }

    files
}

// ============================================================================
// Loading
// ============================================================================

/// 지식 베이스 로드 (질문별 임베딩 계산)
///
/// # Arguments
/// * `layout` - 디렉토리 구조
/// * `embedder` - 질문 임베딩 프로바이더
///
/// # Returns
/// 로드 순서를 유지한 불변 지식 베이스
pub async fn load_base(layout: &BaseLayout, embedder: &dyn EmbeddingProvider) -> Result<KnowledgeBase> {
    let mut entries = Vec::new();

    for file in read_all(layout) {
        if file.records.is_empty() {
            continue;
        }

        let questions: Vec<String> = file.records.iter().map(|r| r.pergunta.clone()).collect();
        let embeddings = embedder
            .embed_batch(&questions)
            .await
            .with_context(|| format!("Failed to embed questions of {}", file.path.display()))?;

        if embeddings.len() != file.records.len() {
            anyhow::bail!(
                "Embedding count mismatch for {}: expected {}, got {}",
                file.path.display(),
                file.records.len(),
                embeddings.len()
            );
        }

        tracing::debug!(
            "Loaded {} questions from slot {} ({})",
            file.records.len(),
            file.slot,
            file.path.display()
        );

        entries.extend(
            file.records
                .into_iter()
                .zip(embeddings)
                .map(|(record, embedding)| KnowledgeEntry {
                    question: record.pergunta,
                    answer: record.resposta,
                    embedding,
                }),
        );
    }

    let base = KnowledgeBase::new(entries).context("Invalid knowledge base")?;
    tracing::info!("Knowledge base loaded: {} questions", base.len());

    Ok(base)
}

// ============================================================================
// Tests
// ============================================================================
