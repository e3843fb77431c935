//! 제한 문법 산술 평가기
//!
//! 숫자, `+ - * / // % **`, 괄호, 공백만 이해하는 재귀 하강 파서입니다.
//! 범용 코드 실행 없이 중위 표현식을 평가합니다.
//!
//! 문법:
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '//' | '%') unary)*
//! unary  := ('+' | '-') unary | power
//! power  := atom ('**' unary)?
//! atom   := NUMBER | '(' expr ')'
//! ```
//!
//! 정수는 임의 정밀도이며, 괄호/부호/지수 중첩은 256 단계까지만 허용합니다.

use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};
use thiserror::Error;

/// 정수 결과의 최대 비트 수 (약 30만 자리)
const MAX_RESULT_BITS: u64 = 1 << 20;

/// 팩토리얼 인자 상한
const MAX_FACTORIAL: u64 = 20_000;

// ============================================================================
// Errors
// ============================================================================

/// 계산 실패
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("math domain error: {0}")]
    Domain(&'static str),

    #[error("numeric overflow")]
    Overflow,

    #[error("factorial() only accepts integral values")]
    NonIntegerFactorial,

    #[error("factorial() not defined for negative values")]
    NegativeFactorial,

    #[error("invalid syntax: {0}")]
    Syntax(String),
}

// ============================================================================
// Number
// ============================================================================

/// 정수/실수를 구분하는 계산 값
///
/// 정수는 임의 정밀도로 유지되고 `/`, 제곱근, 로그는 항상 실수가 됩니다.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Int(BigInt),
    Float(f64),
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(BigInt::from(value))
    }
}

impl Number {
    /// 실수로 변환 (표현 범위를 넘으면 무한대)
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => i.to_f64().unwrap_or(if i.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }),
            Number::Float(f) => *f,
        }
    }

    /// 정수 값 (정수형이거나 소수부가 0인 실수)
    pub fn as_integer(&self) -> Option<BigInt> {
        match self {
            Number::Int(i) => Some(i.clone()),
            Number::Float(f) if f.is_finite() && f.fract() == 0.0 => BigInt::from_f64(*f),
            Number::Float(_) => None,
        }
    }

    fn checked_float(f: f64) -> Result<Number, CalcError> {
        if f.is_finite() {
            Ok(Number::Float(f))
        } else {
            Err(CalcError::Overflow)
        }
    }

    fn checked_int(i: BigInt) -> Result<Number, CalcError> {
        if i.bits() > MAX_RESULT_BITS {
            Err(CalcError::Overflow)
        } else {
            Ok(Number::Int(i))
        }
    }

    pub fn add(self, rhs: Number) -> Result<Number, CalcError> {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => Self::checked_int(a + b),
            (a, b) => Self::checked_float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn sub(self, rhs: Number) -> Result<Number, CalcError> {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => Self::checked_int(a - b),
            (a, b) => Self::checked_float(a.as_f64() - b.as_f64()),
        }
    }

    pub fn mul(self, rhs: Number) -> Result<Number, CalcError> {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => {
                if a.bits() + b.bits() > MAX_RESULT_BITS + 1 {
                    return Err(CalcError::Overflow);
                }
                Self::checked_int(a * b)
            }
            (a, b) => Self::checked_float(a.as_f64() * b.as_f64()),
        }
    }

    /// 실수 나눗셈 (`/`)
    pub fn div(self, rhs: Number) -> Result<Number, CalcError> {
        if rhs.as_f64() == 0.0 {
            return Err(CalcError::DivisionByZero);
        }
        Self::checked_float(self.as_f64() / rhs.as_f64())
    }

    /// 내림 나눗셈 (`//`)
    pub fn floor_div(self, rhs: Number) -> Result<Number, CalcError> {
        match (self, rhs) {
            (Number::Int(_), Number::Int(b)) if b.is_zero() => Err(CalcError::DivisionByZero),
            (Number::Int(a), Number::Int(b)) => Ok(Number::Int(a.div_floor(&b))),
            (a, b) => {
                if b.as_f64() == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                Self::checked_float((a.as_f64() / b.as_f64()).floor())
            }
        }
    }

    /// 나머지 (`%`), 결과 부호는 제수를 따름
    pub fn rem(self, rhs: Number) -> Result<Number, CalcError> {
        match (self, rhs) {
            (Number::Int(_), Number::Int(b)) if b.is_zero() => Err(CalcError::DivisionByZero),
            (Number::Int(a), Number::Int(b)) => Ok(Number::Int(a.mod_floor(&b))),
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                if b == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                let mut r = a % b;
                if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                    r += b;
                }
                Self::checked_float(r)
            }
        }
    }

    /// 거듭제곱 (`**`)
    ///
    /// 밑이 0, 1, -1이면 지수 크기와 무관하게 바로 계산합니다.
    pub fn pow(self, rhs: Number) -> Result<Number, CalcError> {
        match (self, rhs) {
            (Number::Int(base), Number::Int(exp)) if !exp.is_negative() => {
                if base.is_zero() {
                    return Ok(Number::from(if exp.is_zero() { 1 } else { 0 }));
                }
                if base.is_one() {
                    return Ok(Number::from(1));
                }
                if base == BigInt::from(-1) {
                    return Ok(Number::from(if exp.is_even() { 1 } else { -1 }));
                }

                // |base| >= 2 이면 결과는 최소 exp * (bits - 1) 비트
                let exp = exp
                    .to_u64()
                    .filter(|&e| e.saturating_mul(base.bits() - 1) <= MAX_RESULT_BITS)
                    .ok_or(CalcError::Overflow)?;
                let exp = u32::try_from(exp).map_err(|_| CalcError::Overflow)?;
                Self::checked_int(base.pow(exp))
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                if a == 0.0 && b < 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                if a < 0.0 && b.fract() != 0.0 {
                    return Err(CalcError::Domain("fractional power of a negative number"));
                }
                Self::checked_float(a.powf(b))
            }
        }
    }

    pub fn neg(&self) -> Result<Number, CalcError> {
        match self {
            Number::Int(i) => Ok(Number::Int(-i)),
            Number::Float(f) => Ok(Number::Float(-f)),
        }
    }

    /// 제곱근 (항상 실수)
    pub fn sqrt(&self) -> Result<Number, CalcError> {
        let value = self.as_f64();
        if value < 0.0 {
            return Err(CalcError::Domain("square root of a negative number"));
        }
        Self::checked_float(value.sqrt())
    }

    /// 자연로그 (N > 0)
    pub fn ln(&self) -> Result<Number, CalcError> {
        let value = self.as_f64();
        if value <= 0.0 {
            return Err(CalcError::Domain("logarithm of a non-positive number"));
        }
        Self::checked_float(value.ln())
    }

    /// 팩토리얼 (음이 아닌 정수만, 정확한 정수 결과)
    pub fn factorial(&self) -> Result<Number, CalcError> {
        let n = self.as_integer().ok_or(CalcError::NonIntegerFactorial)?;
        if n.is_negative() {
            return Err(CalcError::NegativeFactorial);
        }
        let n = n
            .to_u64()
            .filter(|&n| n <= MAX_FACTORIAL)
            .ok_or(CalcError::Overflow)?;

        let product = (2..=n).fold(BigInt::one(), |acc, k| acc * k);
        Ok(Number::Int(product))
    }
}

/// 실수 표기 (큰 값과 아주 작은 값은 `1e+16`, `1e-05` 같은 지수 표기)
fn format_float(v: f64) -> String {
    let magnitude = v.abs();
    if v == 0.0 || (1e-4..1e16).contains(&magnitude) {
        let plain = v.to_string();
        return if plain.contains('.') || !v.is_finite() {
            plain
        } else {
            format!("{}.0", plain)
        };
    }

    let scientific = format!("{:e}", v);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or_default();
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => scientific,
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_literal(&literal)?));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::DoubleStar);
                i += 2;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '+' | '-' | '*' | '/' | '%' | '(' | ')' => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
                i += 1;
            }
            other => {
                return Err(CalcError::Syntax(format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

/// 숫자 리터럴 파싱 (`12`, `1.5`, `.5`, `3.`)
pub fn parse_literal(literal: &str) -> Result<Number, CalcError> {
    let invalid = || CalcError::Syntax(format!("invalid number literal '{}'", literal));

    if literal.matches('.').count() > 1 || literal == "." || literal.is_empty() {
        return Err(invalid());
    }

    if literal.contains('.') {
        literal.parse::<f64>().map(Number::Float).map_err(|_| invalid())
    } else {
        literal
            .parse::<BigInt>()
            .map(Number::Int)
            .map_err(|_| invalid())
    }
}

// ============================================================================
// Parser
// ============================================================================

/// 괄호/부호 중첩 상한 (재귀 깊이 제한)
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).cloned()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<Number, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = match op {
                Token::Plus => value.add(rhs)?,
                _ => value.sub(rhs)?,
            };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<Number, CalcError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::DoubleSlash | Token::Percent)) =
            self.peek()
        {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value.mul(rhs)?,
                Token::Slash => value.div(rhs)?,
                Token::DoubleSlash => value.floor_div(rhs)?,
                _ => value.rem(rhs)?,
            };
        }
        Ok(value)
    }

    /// 모든 괄호, 부호, 지수 재귀가 이 지점을 지남
    fn unary(&mut self) -> Result<Number, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::Syntax("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let result = self.signed();
        self.depth -= 1;
        result
    }

    fn signed(&mut self) -> Result<Number, CalcError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            Some(Token::Minus) => {
                self.pos += 1;
                self.unary()?.neg()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Number, CalcError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::DoubleStar) {
            self.pos += 1;
            let exp = self.unary()?;
            return base.pow(exp);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, CalcError> {
        match self.bump() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(CalcError::Syntax("'(' was never closed".to_string())),
                }
            }
            Some(Token::RParen) => Err(CalcError::Syntax("unmatched ')'".to_string())),
            Some(_) => Err(CalcError::Syntax("missing operand".to_string())),
            None => Err(CalcError::Syntax("unexpected end of expression".to_string())),
        }
    }
}

/// 중위 표현식 평가
///
/// # Arguments
/// * `input` - 숫자, 연산자, 괄호, 공백으로만 이루어진 문자열
///
/// # Returns
/// 계산 결과 또는 [`CalcError`]
pub fn evaluate(input: &str) -> Result<Number, CalcError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CalcError::Syntax("empty expression".to_string()));
    }

    let mut parser = Parser::new(tokens);
    let value = parser.expr()?;

    match parser.peek() {
        None => Ok(value),
        Some(Token::RParen) => Err(CalcError::Syntax("unmatched ')'".to_string())),
        Some(_) => Err(CalcError::Syntax("unexpected token".to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> Number {
        Number::from(value)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("2+3*4"), Ok(int(14)));
        assert_eq!(evaluate("(2+3)*4"), Ok(int(20)));
        assert_eq!(evaluate("10 - 4 - 3"), Ok(int(3)));
        assert_eq!(evaluate("2 ** 3 ** 2"), Ok(int(512)));
        assert_eq!(evaluate("-2**2"), Ok(int(-4)));
    }

    #[test]
    fn test_division_yields_float() {
        assert_eq!(evaluate("7/2"), Ok(Number::Float(3.5)));
        assert_eq!(evaluate("8/2").map(|n| n.to_string()), Ok("4.0".to_string()));
        assert_eq!(evaluate("7//2"), Ok(int(3)));
        assert_eq!(evaluate("-7//2"), Ok(int(-4)));
    }

    #[test]
    fn test_remainder_follows_divisor_sign() {
        assert_eq!(evaluate("7 % 3"), Ok(int(1)));
        assert_eq!(evaluate("-7 % 3"), Ok(int(2)));
        assert_eq!(evaluate("7 % -3"), Ok(int(-2)));
        assert_eq!(evaluate("5.5 % 2"), Ok(Number::Float(1.5)));
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(evaluate("1/0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("5 % 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("5 // 0"), Err(CalcError::DivisionByZero));
        assert!(matches!(evaluate("(1+2"), Err(CalcError::Syntax(_))));
        assert!(matches!(evaluate("1+2)"), Err(CalcError::Syntax(_))));
        assert!(matches!(evaluate("1+"), Err(CalcError::Syntax(_))));
        assert!(matches!(evaluate("*3"), Err(CalcError::Syntax(_))));
        assert!(matches!(evaluate("1.2.3"), Err(CalcError::Syntax(_))));
        assert!(matches!(evaluate("   "), Err(CalcError::Syntax(_))));
        assert!(matches!(evaluate("()"), Err(CalcError::Syntax(_))));
        assert!(matches!(evaluate("2 3"), Err(CalcError::Syntax(_))));
    }

    #[test]
    fn test_rejects_foreign_characters() {
        assert!(matches!(evaluate("2+a"), Err(CalcError::Syntax(_))));
    }

    #[test]
    fn test_deep_nesting_is_syntax_error() {
        let depth = 100_000;
        let nested = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert!(matches!(evaluate(&nested), Err(CalcError::Syntax(_))));

        let signs = format!("{}1", "-".repeat(depth));
        assert!(matches!(evaluate(&signs), Err(CalcError::Syntax(_))));

        let powers = format!("{}2", "2**".repeat(depth));
        assert!(matches!(evaluate(&powers), Err(CalcError::Syntax(_))));
    }

    #[test]
    fn test_moderate_nesting_still_evaluates() {
        let nested = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(evaluate(&nested), Ok(int(1)));
        assert_eq!(evaluate(&format!("{}7", "-".repeat(50))), Ok(int(7)));
    }

    #[test]
    fn test_large_integers_are_exact() {
        let expected: BigInt = "295232799039604140847618609643520000000".parse().unwrap();
        assert_eq!(int(34).factorial(), Ok(Number::Int(expected)));

        let googol = evaluate("10**100").unwrap();
        assert_eq!(googol.to_string(), format!("1{}", "0".repeat(100)));
        assert_eq!(evaluate("2**200 - 2**200 + 1"), Ok(int(1)));
    }

    #[test]
    fn test_trivial_bases_ignore_exponent_size() {
        assert_eq!(evaluate("1 ** 5000000000"), Ok(int(1)));
        assert_eq!(evaluate("0 ** 5000000000"), Ok(int(0)));
        assert_eq!(evaluate("0 ** 0"), Ok(int(1)));
        assert_eq!(evaluate("(-1) ** 5000000001"), Ok(int(-1)));
        assert_eq!(evaluate("(-1) ** 5000000000"), Ok(int(1)));
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(evaluate("2 ** 5000000000"), Err(CalcError::Overflow));
        assert_eq!(evaluate("10.0 ** 400"), Err(CalcError::Overflow));
        assert_eq!(int(1_000_000).factorial(), Err(CalcError::Overflow));
    }

    #[test]
    fn test_functions() {
        assert_eq!(int(16).sqrt(), Ok(Number::Float(4.0)));
        assert_eq!(int(5).factorial(), Ok(int(120)));
        assert_eq!(int(0).factorial(), Ok(int(1)));
        assert_eq!(Number::Float(6.0).factorial(), Ok(int(720)));
        assert_eq!(int(-1).factorial(), Err(CalcError::NegativeFactorial));
        assert_eq!(Number::Float(2.5).factorial(), Err(CalcError::NonIntegerFactorial));
        assert_eq!(int(1).ln(), Ok(Number::Float(0.0)));
        assert!(matches!(int(0).ln(), Err(CalcError::Domain(_))));
        assert!(matches!(int(-4).sqrt(), Err(CalcError::Domain(_))));
        assert_eq!(int(2).pow(int(-1)), Ok(Number::Float(0.5)));
        assert_eq!(int(0).pow(int(-1)), Err(CalcError::DivisionByZero));
    }

    #[test]
    fn test_display() {
        assert_eq!(int(120).to_string(), "120");
        assert_eq!(Number::Float(4.0).to_string(), "4.0");
        assert_eq!(Number::Float(0.0).to_string(), "0.0");
        assert_eq!(Number::Float(3.5).to_string(), "3.5");
        assert_eq!(Number::Float(0.0001).to_string(), "0.0001");
        assert_eq!(Number::Float(1e15).to_string(), "1000000000000000.0");
    }

    #[test]
    fn test_display_uses_exponent_for_extreme_floats() {
        assert_eq!(Number::Float(1e16).to_string(), "1e+16");
        assert_eq!(Number::Float(1.5e20).to_string(), "1.5e+20");
        assert_eq!(Number::Float(1e-5).to_string(), "1e-05");
        assert_eq!(Number::Float(-2.5e-7).to_string(), "-2.5e-07");
        assert_eq!(Number::Float(1e100).to_string(), "1e+100");
        assert_eq!(evaluate("10 ** 16 / 1").map(|n| n.to_string()), Ok("1e+16".to_string()));
    }
}
