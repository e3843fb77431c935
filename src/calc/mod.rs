//! Calc 모듈 - 자연어 산술 해석기
//!
//! - 이름 있는 함수 구문 (제곱근, 팩토리얼, 거듭제곱, 로그)을 우선순위대로 인식
//! - 그 외에는 단어 → 기호 치환 후 제한 문법 평가기로 계산
//!
//! 계산 질의가 아니면 `None`을 반환하여 호출자가 검색으로 넘어가게 합니다.

mod eval;
mod words;

pub use eval::{evaluate, parse_literal, CalcError, Number};
pub use words::{numbers_to_digits, operators_to_symbols, substitute, NUMBER_WORDS, OPERATOR_WORDS};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// 계산 성공 응답 접두어
pub const RESULT_PREFIX: &str = "💻 Resultado: ";

/// 계산 실패 응답 접두어
pub const ERROR_PREFIX: &str = "Erro ao calcular: ";

/// 치환 후 허용되는 문자 집합
static EXPRESSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+\-*/().%\s]+$").expect("valid expression regex"));

const NUM: &str = r"([+-]?\d+(?:\.\d+)?)";

// ============================================================================
// Rules
// ============================================================================

/// 인식된 계산 질의
#[derive(Debug, Clone, PartialEq)]
pub enum Recognized {
    SquareRoot(Number),
    Factorial(Number),
    Power(Number, Number),
    Logarithm(Number),
    /// 기호로 치환된 중위 표현식
    Expression(String),
}

impl Recognized {
    /// 인식된 질의 계산
    pub fn evaluate(&self) -> Result<Number, CalcError> {
        match self {
            Recognized::SquareRoot(n) => n.sqrt(),
            Recognized::Factorial(n) => n.factorial(),
            Recognized::Power(base, exp) => base.clone().pow(exp.clone()),
            Recognized::Logarithm(n) => n.ln(),
            Recognized::Expression(expr) => evaluate(expr),
        }
    }
}

/// 함수 구문 규칙 (정규식 + 캡처 → 태그 변환)
struct PhraseRule {
    name: &'static str,
    pattern: Regex,
    build: fn(&Captures) -> Result<Recognized, CalcError>,
}

fn operand(caps: &Captures, idx: usize) -> Result<Number, CalcError> {
    let literal = caps.get(idx).map(|m| m.as_str()).unwrap_or_default();
    let (negative, digits) = match literal.as_bytes().first() {
        Some(b'-') => (true, &literal[1..]),
        Some(b'+') => (false, &literal[1..]),
        _ => (false, literal),
    };
    let value = parse_literal(digits)?;
    if negative {
        value.neg()
    } else {
        Ok(value)
    }
}

fn rule(name: &'static str, pattern: &str, build: fn(&Captures) -> Result<Recognized, CalcError>) -> PhraseRule {
    PhraseRule {
        name,
        pattern: Regex::new(pattern).expect("valid phrase regex"),
        build,
    }
}

/// 우선순위 순서의 함수 구문 규칙 (먼저 매칭된 규칙이 이김)
static PHRASE_RULES: Lazy<Vec<PhraseRule>> = Lazy::new(|| {
    vec![
        rule("square_root", &format!(r"raiz\s*quadrada\s*de\s*{}", NUM), |c| {
            Ok(Recognized::SquareRoot(operand(c, 1)?))
        }),
        rule("factorial", &format!(r"fatorial\s*de\s*{}", NUM), |c| {
            Ok(Recognized::Factorial(operand(c, 1)?))
        }),
        rule("power", &format!(r"{}\s*elevado\s*a\s*{}", NUM, NUM), |c| {
            Ok(Recognized::Power(operand(c, 1)?, operand(c, 2)?))
        }),
        rule("logarithm", &format!(r"\blog(?:aritmo)?\s*de\s*{}", NUM), |c| {
            Ok(Recognized::Logarithm(operand(c, 1)?))
        }),
    ]
});

// ============================================================================
// ExpressionInterpreter
// ============================================================================

/// 자연어 산술 해석기
///
/// 상태가 없으므로 여러 요청이 동시에 공유해도 안전합니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionInterpreter;

impl ExpressionInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// 텍스트를 계산 질의로 인식
    ///
    /// # Returns
    /// * `None` - 계산 질의가 아님
    /// * `Some(Ok(_))` - 인식 성공
    /// * `Some(Err(_))` - 구문은 인식했지만 피연산자가 잘못됨
    pub fn recognize(&self, text: &str) -> Option<Result<Recognized, CalcError>> {
        let lowered = text.to_lowercase();

        for rule in PHRASE_RULES.iter() {
            if let Some(caps) = rule.pattern.captures(&lowered) {
                tracing::debug!("Matched phrase rule: {}", rule.name);
                return Some((rule.build)(&caps));
            }
        }

        let substituted = substitute(&lowered);
        if EXPRESSION_RE.is_match(&substituted) {
            return Some(Ok(Recognized::Expression(substituted)));
        }

        None
    }

    /// 텍스트를 인식하고 계산
    pub fn evaluate(&self, text: &str) -> Option<Result<Number, CalcError>> {
        self.recognize(text)
            .map(|recognized| recognized.and_then(|r| r.evaluate()))
    }

    /// 계산 질의 응답 생성
    ///
    /// 계산 질의가 아니면 `None`, 계산 실패는 오류 메시지 응답이 됩니다.
    ///
    /// # Example
    /// ```
    /// use nebula_core::calc::ExpressionInterpreter;
    ///
    /// let calc = ExpressionInterpreter::new();
    /// assert_eq!(calc.interpret("fatorial de 5").as_deref(), Some("💻 Resultado: 120"));
    /// assert_eq!(calc.interpret("qual a capital do Brasil"), None);
    /// ```
    pub fn interpret(&self, text: &str) -> Option<String> {
        self.evaluate(text).map(|outcome| match outcome {
            Ok(value) => format!("{}{}", RESULT_PREFIX, value),
            Err(e) => format!("{}{}", ERROR_PREFIX, e),
        })
    }

    /// 사용자 질의 해석 (공백 제거본 우선, 필요 시 원문 재시도)
    ///
    /// 공백을 모두 지운 텍스트를 먼저 해석합니다. 원문 재시도는 단어
    /// 치환이 실제로 일어나는 질의에만 합니다 ("três mais quatro"처럼
    /// 단어 경계가 필요한 경우). 공백뿐인 질의는 계산 질의가 아닙니다.
    pub fn interpret_query(&self, text: &str) -> Option<String> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return None;
        }

        if let Some(answer) = self.interpret(&compact) {
            return Some(answer);
        }

        let lowered = text.to_lowercase();
        if substitute(&lowered) == lowered {
            return None;
        }
        self.interpret(text)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(text: &str) -> Option<String> {
        ExpressionInterpreter::new().interpret(text)
    }

    #[test]
    fn test_named_functions() {
        assert_eq!(calc("raiz quadrada de 16").as_deref(), Some("💻 Resultado: 4.0"));
        assert_eq!(calc("fatorial de 5").as_deref(), Some("💻 Resultado: 120"));
        assert_eq!(calc("2 elevado a 10").as_deref(), Some("💻 Resultado: 1024"));
        assert_eq!(calc("log de 1").as_deref(), Some("💻 Resultado: 0.0"));
    }

    #[test]
    fn test_named_functions_without_spaces() {
        assert_eq!(calc("raizquadradade16").as_deref(), Some("💻 Resultado: 4.0"));
        assert_eq!(calc("fatorialde5").as_deref(), Some("💻 Resultado: 120"));
        assert_eq!(calc("2elevadoa10").as_deref(), Some("💻 Resultado: 1024"));
        assert_eq!(calc("logde1").as_deref(), Some("💻 Resultado: 0.0"));
    }

    #[test]
    fn test_factorial_of_negative_is_failure() {
        let answer = calc("fatorial de -1").unwrap_or_default();
        assert!(answer.starts_with(ERROR_PREFIX), "got {answer}");
        let answer = calc("fatorialde-1").unwrap_or_default();
        assert!(answer.starts_with(ERROR_PREFIX), "got {answer}");
    }

    #[test]
    fn test_logarithm_of_non_positive_is_failure() {
        assert!(calc("log de 0").unwrap_or_default().starts_with(ERROR_PREFIX));
        assert!(calc("logaritmo de -3").unwrap_or_default().starts_with(ERROR_PREFIX));
    }

    #[test]
    fn test_priority_order() {
        // raiz quadrada vence quando ambas as frases aparecem
        let recognized = ExpressionInterpreter::new().recognize("fatorial de 3 e raiz quadrada de 9");
        assert_eq!(recognized, Some(Ok(Recognized::SquareRoot(Number::from(9)))));
    }

    #[test]
    fn test_word_expressions() {
        assert_eq!(calc("três mais quatro").as_deref(), Some("💻 Resultado: 7"));
        assert_eq!(calc("dez dividido por quatro").as_deref(), Some("💻 Resultado: 2.5"));
        assert_eq!(calc("(um mais dois) vezes três").as_deref(), Some("💻 Resultado: 9"));
        assert_eq!(calc("nove mod dois").as_deref(), Some("💻 Resultado: 1"));
        assert_eq!(calc("2+2").as_deref(), Some("💻 Resultado: 4"));
    }

    #[test]
    fn test_number_words_match_digits() {
        for (word, digit) in NUMBER_WORDS {
            let spelled = calc(&format!("{} mais {}", word, word));
            let direct = calc(&format!("{}+{}", digit, digit));
            assert_eq!(spelled, direct, "word: {word}");
        }
    }

    #[test]
    fn test_malformed_expression_is_failure() {
        assert!(calc("1/0").unwrap_or_default().starts_with(ERROR_PREFIX));
        assert!(calc("(1+2").unwrap_or_default().starts_with(ERROR_PREFIX));
        assert!(calc("um mais").unwrap_or_default().starts_with(ERROR_PREFIX));
    }

    #[test]
    fn test_query_prefers_compact_text() {
        let calc = ExpressionInterpreter::new();
        assert_eq!(calc.interpret_query("2 + 2").as_deref(), Some("💻 Resultado: 4"));
        assert_eq!(calc.interpret_query("raiz quadrada de 16").as_deref(), Some("💻 Resultado: 4.0"));
        assert_eq!(calc.interpret_query("três mais quatro").as_deref(), Some("💻 Resultado: 7"));
        // 숫자 사이 공백도 제거됨
        assert_eq!(calc.interpret_query("1 0 + 1").as_deref(), Some("💻 Resultado: 11"));
    }

    #[test]
    fn test_query_of_whitespace_is_not_arithmetic() {
        let calc = ExpressionInterpreter::new();
        assert_eq!(calc.interpret_query("   "), None);
        assert_eq!(calc.interpret_query("\t\n"), None);
        assert_eq!(calc.interpret_query(""), None);
        assert_eq!(calc.interpret_query("qual a capital do brasil"), None);
    }

    #[test]
    fn test_not_arithmetic() {
        assert_eq!(calc("qual a capital do brasil"), None);
        assert_eq!(calc("raiz quadrada de banana"), None);
        assert_eq!(calc(""), None);
    }
}
