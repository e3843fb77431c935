//! 질의 응답기 - 계산기 → 키워드 검색 → 도메인 힌트 → 답변 변형
//!
//! 상태 흐름:
//! ```text
//! TryArithmetic ──성공/계산 오류──▶ Done
//!       │
//!       └─인식 실패─▶ Retrieve ─▶ AnnotateDomainHint ─▶ Translate ─▶ Done
//! ```
//! 요청 간에 공유되는 것은 불변 [`KnowledgeContext`]뿐입니다.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use rand::Rng;

use crate::calc::ExpressionInterpreter;
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::knowledge::{load_base, retrieve, KnowledgeBase, Retrieval};
use crate::text::extract_keywords;
use crate::translate::{AnswerTranslator, SynonymTable};

/// 키워드가 하나도 없을 때의 응답
pub const NOT_UNDERSTOOD: &str = "Desculpe, não entendi sua pergunta.";

/// 도메인 힌트 접미어
pub const DOMAIN_HINT_SUFFIX: &str = " 💡 (Esta resposta está no slot 1, chance: 0% - 35%)";

/// 도메인 힌트 단어 (소문자 질의에 부분 문자열로 포함되면 힌트 추가)
pub const DOMAIN_HINT_KEYWORDS: &[&str] = &[
    "estudo",
    "matemática",
    "fisica",
    "química",
    "história",
    "geografia",
    "português",
    "literatura",
    "biologia",
    "escola",
    "prova",
    "enem",
    "vestibular",
    "faculdade",
    "ciência",
    "livro",
    "apostila",
    "exercício",
    "curso",
    "professor",
    "universidade",
    "educação",
    "redação",
];

/// 도메인 힌트 대상 질의인지 확인
pub fn has_domain_hint(query: &str) -> bool {
    let lowered = query.to_lowercase();
    DOMAIN_HINT_KEYWORDS.iter().any(|word| lowered.contains(word))
}

// ============================================================================
// KnowledgeContext
// ============================================================================

/// 시작 시 한 번 구성되는 불변 컨텍스트
///
/// 여러 요청이 동기화 없이 동시에 읽습니다.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeContext {
    base: KnowledgeBase,
    translator: AnswerTranslator,
}

impl KnowledgeContext {
    pub fn new(base: KnowledgeBase, synonyms: SynonymTable) -> Self {
        Self {
            base,
            translator: AnswerTranslator::new(synonyms),
        }
    }

    /// 설정에 따라 지식 베이스와 동의어 테이블 로드
    pub async fn load(config: &Config, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        let base = load_base(&config.layout(), embedder)
            .await
            .context("Failed to load knowledge base")?;
        let synonyms =
            SynonymTable::load(&config.synonyms_path).context("Failed to load synonym table")?;

        Ok(Self::new(base, synonyms))
    }

    pub fn base(&self) -> &KnowledgeBase {
        &self.base
    }

    pub fn translator(&self) -> &AnswerTranslator {
        &self.translator
    }
}

// ============================================================================
// QueryAnswerer
// ============================================================================

/// 변형 전 단계까지의 처리 결과
#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    /// 그대로 반환하는 응답 (계산 결과, 이해 불가)
    Final(String),
    /// 변형 대상 검색 답변 (도메인 힌트 포함)
    Retrieved(String),
}

/// 질의 응답기
pub struct QueryAnswerer {
    context: Arc<KnowledgeContext>,
    embedder: Arc<dyn EmbeddingProvider>,
    interpreter: ExpressionInterpreter,
}

impl QueryAnswerer {
    /// 응답기 생성
    ///
    /// 프로바이더 차원이 지식 베이스 차원과 다르면 설정 오류입니다.
    pub fn new(context: Arc<KnowledgeContext>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if let Some(dimension) = context.base().dimension() {
            if dimension != embedder.dimension() {
                anyhow::bail!(
                    "Embedding dimension mismatch: knowledge base uses {}, provider '{}' produces {}",
                    dimension,
                    embedder.name(),
                    embedder.dimension()
                );
            }
        }

        Ok(Self {
            context,
            embedder,
            interpreter: ExpressionInterpreter::new(),
        })
    }

    pub fn context(&self) -> &KnowledgeContext {
        &self.context
    }

    /// 질의 응답
    ///
    /// # Arguments
    /// * `text` - 사용자 질의
    /// * `caller` - 호출자 식별자 (로그 전용)
    ///
    /// # Returns
    /// 응답 텍스트, 임베딩 프로바이더 실패 시 에러
    pub async fn answer_query(&self, text: &str, caller: &str) -> Result<String> {
        match self.resolve(text, caller).await? {
            Resolution::Final(answer) => Ok(answer),
            Resolution::Retrieved(answer) => Ok(self.finish(&answer, caller, &mut rand::rng())),
        }
    }

    /// 주어진 RNG로 답변 변형까지 수행
    pub async fn answer_query_with<R: Rng + ?Sized>(
        &self,
        text: &str,
        caller: &str,
        rng: &mut R,
    ) -> Result<String> {
        match self.resolve(text, caller).await? {
            Resolution::Final(answer) => Ok(answer),
            Resolution::Retrieved(answer) => Ok(self.finish(&answer, caller, rng)),
        }
    }

    fn finish<R: Rng + ?Sized>(&self, answer: &str, caller: &str, rng: &mut R) -> String {
        let translated = self.context.translator().translate_with(answer, rng);
        tracing::info!(caller = %caller, "[answer] {}", translated);
        translated
    }

    async fn resolve(&self, text: &str, caller: &str) -> Result<Resolution> {
        // 1. 계산 시도 (공백 제거본 → 원문)
        if let Some(result) = self.interpreter.interpret_query(text) {
            tracing::info!(caller = %caller, query = %text, "[calc] {}", result);
            return Ok(Resolution::Final(result));
        }

        // 2. 키워드 추출
        let keywords = extract_keywords(text);
        if keywords.is_empty() {
            tracing::debug!(caller = %caller, "No keywords in query: {:?}", text);
            return Ok(Resolution::Final(NOT_UNDERSTOOD.to_string()));
        }

        // 3. 키워드 임베딩 (동시 요청, 하나라도 실패하면 전체 실패)
        let vectors = self.embed_keywords(&keywords).await?;
        let retrieval = retrieve(&vectors, self.context.base().entries());
        log_retrieval(caller, &keywords, &retrieval);

        // 4. 도메인 힌트
        let mut answer = retrieval.answer;
        if has_domain_hint(text) {
            answer.push_str(DOMAIN_HINT_SUFFIX);
        }

        Ok(Resolution::Retrieved(answer))
    }

    async fn embed_keywords(&self, keywords: &[String]) -> Result<Vec<Vec<f32>>> {
        try_join_all(keywords.iter().map(|keyword| async move {
            self.embedder
                .embed(keyword)
                .await
                .with_context(|| format!("Failed to embed keyword '{}'", keyword))
        }))
        .await
    }
}

fn log_retrieval(caller: &str, keywords: &[String], retrieval: &Retrieval) {
    tracing::info!(
        caller = %caller,
        score = retrieval.score,
        entry = ?retrieval.index,
        "[retrieve] keywords={:?}",
        keywords
    );
}

// ============================================================================
// Tests
// ============================================================================
