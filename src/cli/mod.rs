//! CLI 모듈
//!
//! nebula CLI 명령어 정의 및 구현

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::answer::{KnowledgeContext, QueryAnswerer};
use crate::calc::ExpressionInterpreter;
use crate::config::Config;
use crate::embedding::create_embedder;
use crate::knowledge::read_all;
use crate::text::extract_keywords;
use crate::translate::SynonymTable;

/// 대화 종료 명령
const EXIT_WORDS: &[&str] = &["sair", "exit", "quit"];

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "nebula")]
#[command(version, about = "자연어 계산기 + 임베딩 기반 Q&A", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// 설정 덮어쓰기 플래그
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// 지식 베이스 디렉토리 (slotN/versionamento1/*.json)
    #[arg(long, global = true)]
    pub base: Option<PathBuf>,

    /// 동의어 JSON 파일
    #[arg(long, global = true)]
    pub synonyms: Option<PathBuf>,

    /// 임베딩 모델 이름
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// 모델 캐시 디렉토리
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 질의 하나에 답변
    Ask {
        /// 질의 텍스트
        query: String,

        /// 호출자 식별자 (로그용)
        #[arg(short, long, default_value = "cli")]
        caller: String,
    },

    /// 표준 입력에서 한 줄씩 질의 (sair로 종료)
    Chat {
        /// 호출자 식별자 (로그용)
        #[arg(short, long, default_value = "chat")]
        caller: String,
    },

    /// 계산기만 실행 (모델 로드 없음)
    Calc {
        /// 계산식 (예: "três mais quatro")
        expression: String,
    },

    /// 키워드 추출 결과 확인
    Keywords {
        /// 분석할 텍스트
        text: String,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// 설정 병합 (CLI 플래그 > 환경변수 > 기본값)
pub fn resolve_config(global: &GlobalArgs) -> Config {
    let mut config = Config::from_env();

    if let Some(ref base) = global.base {
        config.base_path = base.clone();
    }
    if let Some(ref synonyms) = global.synonyms {
        config.synonyms_path = synonyms.clone();
    }
    if let Some(ref model) = global.model {
        config.model_name = model.clone();
    }
    if let Some(ref cache_dir) = global.cache_dir {
        config.cache_dir = cache_dir.clone();
    }

    config
}

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli.global);

    match cli.command {
        Commands::Ask { query, caller } => cmd_ask(&config, &query, &caller).await,
        Commands::Chat { caller } => cmd_chat(&config, &caller).await,
        Commands::Calc { expression } => cmd_calc(&expression),
        Commands::Keywords { text } => cmd_keywords(&text),
        Commands::Status => cmd_status(&config),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 모델 로드 + 지식 베이스 임베딩 후 응답기 생성
async fn build_answerer(config: &Config) -> Result<QueryAnswerer> {
    println!("[*] 임베딩 모델 로드 중: {}", config.model_name);
    let embedder = create_embedder(&config.model_name, config.cache_dir.clone())?;

    println!("[*] 지식 베이스 로드 중: {}", config.base_path.display());
    let context = KnowledgeContext::load(config, embedder.as_ref())
        .await
        .context("KnowledgeContext 로드 실패")?;

    println!(
        "[OK] 질문 {} 건, 동의어 {} 단어",
        context.base().len(),
        context.translator().synonyms().len()
    );

    QueryAnswerer::new(Arc::new(context), embedder)
}

/// 질의 명령어 (ask)
async fn cmd_ask(config: &Config, query: &str, caller: &str) -> Result<()> {
    let answerer = build_answerer(config).await?;
    let answer = answerer
        .answer_query(query, caller)
        .await
        .context("질의 처리 실패")?;

    println!();
    println!("{}", answer);
    Ok(())
}

/// 대화 명령어 (chat)
///
/// 질의 사이에 상태를 유지하지 않습니다.
async fn cmd_chat(config: &Config, caller: &str) -> Result<()> {
    let answerer = build_answerer(config).await?;
    println!("[*] 질문을 입력하세요 ({}로 종료)", EXIT_WORDS[0]);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("표준 입력 읽기 실패")? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
            break;
        }

        match answerer.answer_query(query, caller).await {
            Ok(answer) => println!("{}", answer),
            Err(e) => println!("[!] 질의 처리 실패: {:#}", e),
        }
    }

    Ok(())
}

/// 계산 명령어 (calc)
///
/// `ask`의 계산 단계와 같은 해석 경로를 사용합니다.
fn cmd_calc(expression: &str) -> Result<()> {
    println!("{}", calc_output(expression));
    Ok(())
}

fn calc_output(expression: &str) -> String {
    ExpressionInterpreter::new()
        .interpret_query(expression)
        .unwrap_or_else(|| format!("[!] 계산식으로 인식되지 않습니다: \"{}\"", expression))
}

/// 키워드 명령어 (keywords)
fn cmd_keywords(text: &str) -> Result<()> {
    let keywords = extract_keywords(text);

    if keywords.is_empty() {
        println!("[!] 키워드가 없습니다.");
    } else {
        println!("[OK] 키워드 ({} 개): {}", keywords.len(), keywords.join(", "));
    }

    Ok(())
}

/// 상태 명령어 (status)
///
/// 모델을 로드하지 않고 파일만 확인합니다.
fn cmd_status(config: &Config) -> Result<()> {
    println!("nebula-core v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 지식 베이스: {}", config.base_path.display());
    println!("[*] 동의어 파일: {}", config.synonyms_path.display());
    println!("[*] 임베딩 모델: {}", config.model_name);
    println!("[*] 모델 캐시: {}", config.cache_dir.display());
    println!();

    let files = read_all(&config.layout());
    for slot in 1..=config.slot_count {
        let (file_count, record_count) = files
            .iter()
            .filter(|f| f.slot == slot)
            .fold((0usize, 0usize), |(fc, rc), f| (fc + 1, rc + f.records.len()));
        println!(
            "    slot{}: {} 파일, {} 질문",
            slot, file_count, record_count
        );
    }

    let total: usize = files.iter().map(|f| f.records.len()).sum();
    println!("[OK] 전체 질문: {} 건", total);

    match SynonymTable::load(&config.synonyms_path) {
        Ok(table) => println!("[OK] 동의어: {} 단어", table.len()),
        Err(e) => println!("[!] 동의어 로드 실패: {:#}", e),
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::TableEmbedding;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["nebula", "ask", "fatorial de 5", "--caller", "10.0.0.1"]).unwrap();
        match cli.command {
            Commands::Ask { query, caller } => {
                assert_eq!(query, "fatorial de 5");
                assert_eq!(caller, "10.0.0.1");
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["nebula", "status", "--base", "/tmp/base", "--model", "bge-small-en-v1.5"])
            .unwrap();
        let config = resolve_config(&cli.global);
        assert_eq!(config.base_path, PathBuf::from("/tmp/base"));
        assert_eq!(config.model_name, "bge-small-en-v1.5");
    }

    #[test]
    fn test_calc_and_keywords_commands() {
        assert!(cmd_calc("dois mais dois").is_ok());
        assert!(cmd_keywords("de para com").is_ok());
    }

    #[tokio::test]
    async fn test_calc_agrees_with_ask() {
        let provider = TableEmbedding::new(&[], vec![1.0]);
        let answerer = QueryAnswerer::new(Arc::new(KnowledgeContext::default()), Arc::new(provider)).unwrap();

        for query in ["raiz quadrada de 16", "três mais quatro", "1 0 + 1", "fatorialde5", "2 elevado a 10"] {
            let asked = answerer.answer_query(query, "test").await.unwrap();
            assert_eq!(calc_output(query), asked, "query: {query}");
        }
    }

    #[test]
    fn test_calc_rejects_blank_input() {
        assert!(calc_output("   ").starts_with("[!]"));
    }
}
