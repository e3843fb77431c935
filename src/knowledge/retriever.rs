//! Knowledge Retriever - 키워드 벡터 평균 코사인 유사도 선형 검색
//!
//! 모든 엔트리에 대해 키워드별 코사인 유사도의 평균을 구하고
//! 가장 높은 점수의 답변을 고릅니다. 인덱스 없이 전체를 스캔합니다.

use super::entry::KnowledgeEntry;

/// 답변을 찾지 못했을 때의 응답
pub const NO_ANSWER: &str = "Desculpe, não encontrei uma resposta para isso.";

/// 초기 최고 점수 (코사인 유사도 하한)
pub const NO_SCORE: f32 = -1.0;

// ============================================================================
// Types
// ============================================================================

/// 검색 결과
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    pub answer: String,
    /// 평균 유사도 (-1.0 ~ 1.0), 답변 없음이면 -1.0
    pub score: f32,
    /// 선택된 엔트리 위치 (로드 순서 기준)
    pub index: Option<usize>,
}

impl Retrieval {
    /// 답변 없음 결과
    pub fn not_found() -> Self {
        Self {
            answer: NO_ANSWER.to_string(),
            score: NO_SCORE,
            index: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.index.is_some()
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 유사도 계산
///
/// 결과는 -1.0 ~ 1.0 범위입니다. 영벡터가 끼면 0.0입니다.
///
/// # Panics
/// 두 벡터의 길이가 다르면 패닉 (설정 오류)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(
        a.len(),
        b.len(),
        "embedding dimension mismatch: {} vs {}",
        a.len(),
        b.len()
    );

    if a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// 엔트리 점수 (키워드 벡터별 코사인 유사도 평균)
pub fn average_similarity(keyword_vectors: &[Vec<f32>], embedding: &[f32]) -> f32 {
    if keyword_vectors.is_empty() {
        return NO_SCORE;
    }

    let total: f32 = keyword_vectors
        .iter()
        .map(|v| cosine_similarity(v, embedding))
        .sum();

    total / keyword_vectors.len() as f32
}

// ============================================================================
// Retrieval
// ============================================================================

/// 최고 점수 답변 검색
///
/// 점수가 엄격하게 높을 때만(`>`) 교체하므로 동점이면
/// 먼저 로드된 엔트리가 이깁니다.
///
/// # Arguments
/// * `keyword_vectors` - 질의 키워드 임베딩 목록
/// * `base` - 로드 순서의 지식 베이스 엔트리
///
/// # Returns
/// 최고 점수 답변, 베이스나 키워드가 비어 있으면 [`Retrieval::not_found`]
pub fn retrieve(keyword_vectors: &[Vec<f32>], base: &[KnowledgeEntry]) -> Retrieval {
    if keyword_vectors.is_empty() || base.is_empty() {
        return Retrieval::not_found();
    }

    let mut best = Retrieval::not_found();

    for (index, entry) in base.iter().enumerate() {
        let score = average_similarity(keyword_vectors, &entry.embedding);
        if score > best.score {
            best.score = score;
            best.index = Some(index);
        }
    }

    if let Some(index) = best.index {
        best.answer = base[index].answer.clone();
    }

    best
}

// ============================================================================
// Tests
// ============================================================================
