//! 런타임 설정
//!
//! 우선순위: CLI 플래그 > 환경변수 > 기본값
//!
//! | 환경변수 | 기본값 |
//! |---|---|
//! | `NEBULA_BASE_PATH` | `bigdata` |
//! | `NEBULA_SYNONYMS_PATH` | `similares.json` |
//! | `NEBULA_EMBED_MODEL` | `all-MiniLM-L6-v2` |
//! | `NEBULA_CACHE_DIR` | `<캐시 디렉토리>/nebula-core` |

use std::path::PathBuf;

use crate::embedding::DEFAULT_MODEL;
use crate::knowledge::{BaseLayout, DEFAULT_SLOT_COUNT, DEFAULT_VERSION_DIR};

pub const ENV_BASE_PATH: &str = "NEBULA_BASE_PATH";
pub const ENV_SYNONYMS_PATH: &str = "NEBULA_SYNONYMS_PATH";
pub const ENV_EMBED_MODEL: &str = "NEBULA_EMBED_MODEL";
pub const ENV_CACHE_DIR: &str = "NEBULA_CACHE_DIR";

/// 모델 캐시 기본 경로
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nebula-core")
}

/// 전체 설정
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// 지식 베이스 루트 (slotN/versionamento1/*.json)
    pub base_path: PathBuf,
    /// 동의어 JSON 파일
    pub synonyms_path: PathBuf,
    pub slot_count: usize,
    pub version_dir: String,
    /// fastembed 모델 이름
    pub model_name: String,
    /// 모델 캐시 디렉토리
    pub cache_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("bigdata"),
            synonyms_path: PathBuf::from("similares.json"),
            slot_count: DEFAULT_SLOT_COUNT,
            version_dir: DEFAULT_VERSION_DIR.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl Config {
    /// 환경변수로 기본값 덮어쓰기
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// 조회 함수로 설정 구성 (빈 값은 무시)
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(ENV_BASE_PATH) {
            config.base_path = PathBuf::from(path);
        }
        if let Some(path) = get(ENV_SYNONYMS_PATH) {
            config.synonyms_path = PathBuf::from(path);
        }
        if let Some(model) = get(ENV_EMBED_MODEL) {
            config.model_name = model;
        }
        if let Some(dir) = get(ENV_CACHE_DIR) {
            config.cache_dir = PathBuf::from(dir);
        }

        config
    }

    /// 지식 베이스 디렉토리 구조
    pub fn layout(&self) -> BaseLayout {
        BaseLayout {
            root: self.base_path.clone(),
            slot_count: self.slot_count,
            version_dir: self.version_dir.clone(),
        }
    }
}
