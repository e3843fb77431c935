//! Knowledge 모듈 - 질문/답변 지식 베이스와 임베딩 검색
//!
//! - Entry: 질문/답변 + 질문 임베딩, 불변 지식 베이스
//! - Retriever: 키워드 벡터 평균 코사인 유사도로 최고 답변 선택
//! - Loader: 슬롯별 JSON 파일 로드 및 질문 임베딩

mod entry;
mod loader;
mod retriever;

// Re-exports
pub use entry::{KnowledgeBase, KnowledgeEntry, KnowledgeError, QaRecord};
pub use loader::{
    load_base, read_all, read_records, BaseLayout, RecordFile, DEFAULT_SLOT_COUNT,
    DEFAULT_VERSION_DIR,
};
pub use retriever::{
    average_similarity, cosine_similarity, retrieve, Retrieval, NO_ANSWER, NO_SCORE,
};
