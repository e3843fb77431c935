//! 숫자/연산자 단어 테이블
//!
//! 포르투갈어 수 단어와 연산자 구문을 기호로 치환합니다.
//! 모든 항목은 부분 문자열이 아닌 단어 단위로만 매칭됩니다.

use once_cell::sync::Lazy;
use regex::Regex;

/// 수 단어 → 숫자
pub const NUMBER_WORDS: &[(&str, &str)] = &[
    ("zero", "0"),
    ("um", "1"),
    ("uma", "1"),
    ("dois", "2"),
    ("duas", "2"),
    ("três", "3"),
    ("tres", "3"),
    ("quatro", "4"),
    ("cinco", "5"),
    ("seis", "6"),
    ("sete", "7"),
    ("oito", "8"),
    ("nove", "9"),
    ("dez", "10"),
];

/// 연산자 구문 → 기호
pub const OPERATOR_WORDS: &[(&str, &str)] = &[
    ("multiplicado por", "*"),
    ("dividido por", "/"),
    ("mais", "+"),
    ("menos", "-"),
    ("vezes", "*"),
    ("x", "*"),
    ("sobre", "/"),
    ("mod", "%"),
    ("módulo", "%"),
    ("modulo", "%"),
];

/// 단어 경계 정규식과 치환 기호
struct WordRule {
    pattern: Regex,
    symbol: &'static str,
}

fn compile(table: &[(&str, &'static str)]) -> Vec<WordRule> {
    table
        .iter()
        .map(|(word, symbol)| {
            let phrase = word
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+");
            WordRule {
                pattern: Regex::new(&format!(r"(?i)\b{}\b", phrase)).expect("valid word pattern"),
                symbol,
            }
        })
        .collect()
}

static NUMBER_RULES: Lazy<Vec<WordRule>> = Lazy::new(|| compile(NUMBER_WORDS));
static OPERATOR_RULES: Lazy<Vec<WordRule>> = Lazy::new(|| compile(OPERATOR_WORDS));

fn apply(rules: &[WordRule], text: &str) -> String {
    rules.iter().fold(text.to_string(), |acc, rule| {
        rule.pattern
            .replace_all(&acc, regex::NoExpand(rule.symbol))
            .into_owned()
    })
}

/// 수 단어를 숫자로 치환
pub fn numbers_to_digits(text: &str) -> String {
    apply(&NUMBER_RULES, text)
}

/// 연산자 단어를 기호로 치환
pub fn operators_to_symbols(text: &str) -> String {
    apply(&OPERATOR_RULES, text)
}

/// 수 단어 → 연산자 단어 순서로 전체 치환
pub fn substitute(text: &str) -> String {
    operators_to_symbols(&numbers_to_digits(text))
}

// ============================================================================
// Tests
// ============================================================================
