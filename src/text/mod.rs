//! 텍스트 정규화 - 소문자화, 발음 구별 기호 제거, 토큰화
//!
//! 계산기와 검색기가 공통으로 사용하는 리프 유틸리티입니다.
//! 악센트가 있는 형태와 없는 형태("matemática" / "matematica")가
//! 같은 토큰으로 정규화됩니다.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// 키워드 최소 길이 (이보다 짧은 토큰은 버림)
pub const MIN_KEYWORD_LEN: usize = 3;

/// 키워드 추출에서 제외되는 포르투갈어 기능어
///
/// 정규화 후 비교하므로 "à", "às"는 "a", "as"와 같아집니다.
pub const STOPWORDS: &[&str] = &[
    "a", "o", "e", "de", "do", "da", "em", "no", "na", "para", "um", "uma", "os", "as", "por",
    "que", "com", "se", "ao", "dos", "das", "nos", "nas", "sobre", "à", "às",
];

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

// ============================================================================
// Normalization
// ============================================================================

/// 단어 정규화 (소문자화 + NFD 분해 후 결합 문자 제거)
pub fn normalize_word(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// 텍스트를 정규화된 토큰 목록으로 변환
///
/// 영숫자/밑줄 연속 구간 단위로 분리합니다.
pub fn normalize(text: &str) -> Vec<String> {
    let normalized = normalize_word(text);
    WORD_RE
        .find_iter(&normalized)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// 불용어 여부 (정규화된 토큰 기준)
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.iter().any(|s| normalize_word(s) == token)
}

/// 키워드 추출
///
/// 정규화 후 불용어와 3자 미만 토큰을 제거합니다.
/// 남는 토큰이 없으면 빈 목록을 반환합니다 (에러 아님).
///
/// # Example
/// ```
/// use nebula_core::text::extract_keywords;
///
/// let keywords = extract_keywords("O que é a Matemática?");
/// assert_eq!(keywords, vec!["matematica".to_string()]);
/// ```
pub fn extract_keywords(text: &str) -> Vec<String> {
    normalize(text)
        .into_iter()
        .filter(|token| token.chars().count() >= MIN_KEYWORD_LEN && !is_stopword(token))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
