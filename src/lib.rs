//! nebula-core - 자연어 계산기 + 임베딩 기반 Q&A
//!
//! 자유 텍스트 질의를 두 가지 방법으로 처리합니다:
//! - 자연어 산술식이면 제한 문법 평가기로 계산
//! - 그 외에는 키워드 임베딩으로 가장 가까운 질문/답변을 찾고
//!   동의어 테이블로 답변 표현을 변형

pub mod answer;
pub mod calc;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod knowledge;
pub mod text;
pub mod translate;

// Re-exports
pub use answer::{has_domain_hint, KnowledgeContext, QueryAnswerer, NOT_UNDERSTOOD};
pub use calc::{CalcError, ExpressionInterpreter, Number, Recognized};
pub use config::Config;
pub use embedding::{create_embedder, EmbeddingProvider, LocalEmbedding};
pub use knowledge::{
    cosine_similarity, load_base, retrieve, BaseLayout, KnowledgeBase, KnowledgeEntry,
    KnowledgeError, Retrieval,
};
pub use text::{extract_keywords, normalize};
pub use translate::{AnswerTranslator, SynonymTable};
