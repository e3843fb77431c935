//! 답변 변형기 - 동의어 테이블 기반 무작위 단어 치환
//!
//! 답변 문장의 각 단어를 동의어 목록 중 하나로 무작위 교체합니다.
//! 테이블에 없는 단어와 단어 사이 구분자는 그대로 둡니다.
//!
//! 난수원은 주입할 수 있으므로 테스트에서는 시드 고정 RNG를 사용합니다.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use rand::Rng;
use regex::{Captures, Regex};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));

// ============================================================================
// SynonymTable
// ============================================================================

/// 동의어 테이블 (소문자 단어 → 대체 단어 목록)
///
/// 모든 목록은 비어 있지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: HashMap<String, Vec<String>>,
}

impl SynonymTable {
    /// 빈 테이블 (항등 변환)
    pub fn empty() -> Self {
        Self::default()
    }

    /// 매핑으로 생성
    ///
    /// 키는 소문자로 정규화하고, 대체 단어가 없는 항목은 버립니다.
    /// 소문자로 같아지는 키들의 목록은 키 순서대로 합칩니다 (중복 제거).
    pub fn from_map(map: HashMap<String, Vec<String>>) -> Self {
        let mut sorted: Vec<(String, Vec<String>)> = map.into_iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut entries: HashMap<String, Vec<String>> = HashMap::with_capacity(sorted.len());

        for (word, alternatives) in sorted {
            if alternatives.is_empty() {
                tracing::warn!("Dropping synonym entry '{}' with no alternatives", word);
                continue;
            }

            let key = word.to_lowercase();
            match entries.get_mut(&key) {
                Some(existing) => {
                    tracing::warn!("Synonym entry '{}' merged into '{}'", word, key);
                    for alternative in alternatives {
                        if !existing.contains(&alternative) {
                            existing.push(alternative);
                        }
                    }
                }
                None => {
                    entries.insert(key, alternatives);
                }
            }
        }

        Self { entries }
    }

    /// JSON 파일에서 로드 (`{"palavra": ["alt1", "alt2"]}`)
    ///
    /// 파일이 없으면 빈 테이블을 반환합니다.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(
                "Synonym file not found ({}), answers will not be varied",
                path.display()
            );
            return Ok(Self::empty());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let map: HashMap<String, Vec<String>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let table = Self::from_map(map);
        tracing::info!("Synonym table loaded: {} words", table.len());
        Ok(table)
    }

    /// 단어의 대체 목록 (대소문자 무시)
    pub fn alternatives(&self, word: &str) -> Option<&[String]> {
        self.entries.get(&word.to_lowercase()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// AnswerTranslator
// ============================================================================

/// 답변 변형기
#[derive(Debug, Clone, Default)]
pub struct AnswerTranslator {
    synonyms: SynonymTable,
}

impl AnswerTranslator {
    pub fn new(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// 스레드 로컬 RNG로 변형 (호출마다 결과가 달라질 수 있음)
    pub fn translate(&self, text: &str) -> String {
        self.translate_with(text, &mut rand::rng())
    }

    /// 주어진 RNG로 변형
    ///
    /// 테이블에 있는 단어는 대체 목록에서 균등하게 하나를 고르고,
    /// 없는 단어는 원래 대소문자 그대로 둡니다.
    pub fn translate_with<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> String {
        if self.synonyms.is_empty() {
            return text.to_string();
        }

        WORD_RE
            .replace_all(text, |caps: &Captures| {
                let word = &caps[0];
                match self.synonyms.alternatives(word) {
                    Some(alternatives) => alternatives
                        .choose(&mut *rng)
                        .cloned()
                        .unwrap_or_else(|| word.to_string()),
                    None => word.to_string(),
                }
            })
            .into_owned()
    }
}

// ============================================================================
// Tests
// ============================================================================
