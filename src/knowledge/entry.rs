//! Knowledge Entry - 질문/답변 + 질문 임베딩
//!
//! 시작 시 한 번 로드된 뒤 읽기 전용으로 공유됩니다.

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Types
// ============================================================================

/// 저장된 질문/답변 레코드 (JSON 파일 형식)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QaRecord {
    #[serde(default)]
    pub pergunta: String,
    #[serde(default)]
    pub resposta: String,
}

/// 지식 베이스 엔트리
#[derive(Debug, Clone)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
    /// 질문 임베딩
    pub embedding: Vec<f32>,
}

/// 지식 베이스 구성 오류
#[derive(Debug, Error, PartialEq)]
pub enum KnowledgeError {
    #[error("entry {index} has an empty embedding")]
    EmptyEmbedding { index: usize },

    #[error("entry {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}

// ============================================================================
// KnowledgeBase
// ============================================================================

/// 불변 지식 베이스
///
/// 로드 순서를 그대로 유지합니다 (동점 처리가 이 순서에 의존).
/// 모든 엔트리의 임베딩 차원은 같습니다.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    dimension: Option<usize>,
}

impl KnowledgeBase {
    /// 엔트리 목록으로 생성 (차원 검증)
    pub fn new(entries: Vec<KnowledgeEntry>) -> Result<Self, KnowledgeError> {
        let mut dimension = None;

        for (index, entry) in entries.iter().enumerate() {
            let found = entry.embedding.len();
            if found == 0 {
                return Err(KnowledgeError::EmptyEmbedding { index });
            }
            match dimension {
                None => dimension = Some(found),
                Some(expected) if expected != found => {
                    return Err(KnowledgeError::DimensionMismatch {
                        index,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }
        }

        Ok(Self { entries, dimension })
    }

    /// 빈 지식 베이스
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 임베딩 차원 (비어 있으면 None)
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(embedding: Vec<f32>) -> KnowledgeEntry {
        KnowledgeEntry {
            question: "q".to_string(),
            answer: "a".to_string(),
            embedding,
        }
    }

    #[test]
    fn test_uniform_dimension() {
        let base = KnowledgeBase::new(vec![entry(vec![1.0, 0.0]), entry(vec![0.0, 1.0])]).unwrap();
        assert_eq!(base.len(), 2);
        assert_eq!(base.dimension(), Some(2));
    }

    #[test]
    fn test_mixed_dimension_rejected() {
        let result = KnowledgeBase::new(vec![entry(vec![1.0, 0.0]), entry(vec![1.0])]);
        assert_eq!(
            result.err(),
            Some(KnowledgeError::DimensionMismatch {
                index: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_empty_embedding_rejected() {
        let result = KnowledgeBase::new(vec![entry(vec![])]);
        assert_eq!(result.err(), Some(KnowledgeError::EmptyEmbedding { index: 0 }));
    }

    #[test]
    fn test_empty_base() {
        let base = KnowledgeBase::empty();
        assert!(base.is_empty());
        assert_eq!(base.dimension(), None);
    }

    #[test]
    fn test_record_missing_fields_default() {
        let record: QaRecord = serde_json::from_str(r#"{"pergunta": "Oi?"}"#).unwrap();
        assert_eq!(record.pergunta, "Oi?");
        assert_eq!(record.resposta, "");
    }
}
