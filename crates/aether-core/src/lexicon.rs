//! Lexical backend adapter.
//!
//! The state machine consumes the pinyin backend only through
//! `query(code, limit) -> ordered, deduped strings`. The primary provider
//! wraps whatever engine the host ships (located via `AETHERIME_LIBIME_DICT`
//! / `AETHERIME_LIBIME_LM` or well-known paths); when it is missing or
//! returns nothing, a compiled-in demo lexicon keeps Chinese mode usable.
//! English mode uses its own static lexicon of the same shape.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{info, warn};

use crate::config;
use crate::protocol::Language;

const WELL_KNOWN_DICT_PATHS: &[&str] = &[
    "/usr/share/aetherime/pinyin.tsv",
    "/usr/local/share/aetherime/pinyin.tsv",
];

/// Opaque pinyin engine contract.
///
/// Implementations must be infallible: any internal failure during lookup
/// is reported as an empty result, never an error or panic.
pub trait PinyinProvider: Send + Sync {
    fn query(&self, code: &str, limit: usize) -> Vec<String>;
    fn status(&self) -> &str;
}

/// Tuning knobs forwarded to the primary engine.
#[derive(Debug, Clone, Copy)]
pub struct PinyinTuning {
    pub beam_size: usize,
    pub n_best: usize,
    pub score_filter: f32,
}

impl Default for PinyinTuning {
    fn default() -> Self {
        Self {
            beam_size: 20,
            n_best: 2,
            score_filter: 1.0,
        }
    }
}

pub struct Lexicon {
    primary: Option<Box<dyn PinyinProvider>>,
    status: String,
}

impl Lexicon {
    /// Set up the primary backend from env overrides or well-known paths.
    pub fn from_env() -> Self {
        let dict_path = env_path(config::DICT_ENV).or_else(|| {
            WELL_KNOWN_DICT_PATHS
                .iter()
                .map(|path| PathBuf::from(*path))
                .find(|path| path.exists())
        });
        let Some(dict_path) = dict_path else {
            return Self::unavailable("pinyin dict file not found (expect pinyin.tsv)");
        };
        let lm_path = env_path(config::LM_ENV);
        match DictFileProvider::load(&dict_path, lm_path.as_deref(), PinyinTuning::default()) {
            Ok(provider) => {
                info!(dict = %dict_path.display(), "pinyin backend ready");
                Self::with_provider(Box::new(provider))
            }
            Err(error) => {
                warn!(dict = %dict_path.display(), %error, "pinyin backend init failed");
                Self::unavailable(format!("pinyin backend init failed: {error}"))
            }
        }
    }

    pub fn with_provider(provider: Box<dyn PinyinProvider>) -> Self {
        let status = provider.status().to_string();
        Self {
            primary: Some(provider),
            status,
        }
    }

    pub fn unavailable(status: impl Into<String>) -> Self {
        Self {
            primary: None,
            status: status.into(),
        }
    }

    pub fn available(&self) -> bool {
        self.primary.is_some()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Ordered, deduped candidates for `code`, at most `limit`.
    ///
    /// Chinese mode prefers the primary backend and falls back to the demo
    /// lexicon when it yields nothing; English mode always uses the static
    /// English lexicon.
    pub fn query(&self, language: Language, code: &str, limit: usize) -> Vec<String> {
        if limit == 0 || !is_pinyin_code(code) {
            return Vec::new();
        }
        match language {
            Language::En => table_lookup(english_lexicon(), code, limit),
            Language::Zh => {
                if let Some(primary) = &self.primary {
                    let hits = dedup_truncate(primary.query(code, limit), limit);
                    if !hits.is_empty() {
                        return hits;
                    }
                }
                table_lookup(fallback_zh_lexicon(), code, limit)
            }
        }
    }
}

/// `[a-zA-Z']+`
pub fn is_pinyin_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .bytes()
            .all(|byte| byte.is_ascii_alphabetic() || byte == b'\'')
}

fn env_path(name: &str) -> Option<PathBuf> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

fn table_lookup(
    table: &'static HashMap<&'static str, &'static [&'static str]>,
    code: &str,
    limit: usize,
) -> Vec<String> {
    match table.get(code) {
        Some(entries) => entries.iter().take(limit).map(|s| s.to_string()).collect(),
        None => Vec::new(),
    }
}

fn dedup_truncate(entries: Vec<String>, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(limit.min(entries.len()));
    for entry in entries {
        if entry.is_empty() || out.contains(&entry) {
            continue;
        }
        out.push(entry);
        if out.len() >= limit {
            break;
        }
    }
    out
}

fn fallback_zh_lexicon() -> &'static HashMap<&'static str, &'static [&'static str]> {
    static TABLE: OnceLock<HashMap<&'static str, &'static [&'static str]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            ("ni", ["你", "呢", "泥"].as_slice()),
            ("nihao", ["你好", "你好吗", "你好呀"].as_slice()),
            ("wo", ["我", "握", "窝"].as_slice()),
            ("women", ["我们", "我们先", "我们可以"].as_slice()),
            ("jintian", ["今天", "今天的", "今天我们"].as_slice()),
            ("xiexie", ["谢谢", "谢谢你", "谢谢大家"].as_slice()),
            ("qingwen", ["请问", "请问一下", "请问现在方便吗"].as_slice()),
            ("woxiang", ["我想", "我想要", "我想先"].as_slice()),
            ("ceshi", ["测试", "测试一下", "测试完成"].as_slice()),
        ])
    })
}

fn english_lexicon() -> &'static HashMap<&'static str, &'static [&'static str]> {
    static TABLE: OnceLock<HashMap<&'static str, &'static [&'static str]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            ("hello", ["hello", "hello there", "hello team"].as_slice()),
            ("please", ["please", "please review", "please help"].as_slice()),
            ("thanks", ["thanks", "thanks a lot", "thanks for your help"].as_slice()),
            ("build", ["build", "build this", "build the feature"].as_slice()),
            ("need", ["need", "need to", "need your help"].as_slice()),
        ])
    })
}

// ---------------------------------------------------------------------------
// File-backed primary provider
// ---------------------------------------------------------------------------

/// Primary provider reading a tab-separated lexicon export:
/// `code<TAB>surface[<TAB>score]` per line, `#` comments. An optional
/// language-model file (`surface<TAB>weight`) biases the ranking.
pub struct DictFileProvider {
    entries: HashMap<String, Vec<ScoredEntry>>,
    tuning: PinyinTuning,
    status: String,
}

#[derive(Debug, Clone)]
struct ScoredEntry {
    surface: String,
    score: f32,
}

impl DictFileProvider {
    pub fn load(
        dict_path: &Path,
        lm_path: Option<&Path>,
        tuning: PinyinTuning,
    ) -> io::Result<Self> {
        let dict_raw = fs::read_to_string(dict_path)?;
        let lm_raw = match lm_path {
            Some(path) => Some(fs::read_to_string(path)?),
            None => None,
        };
        let mut provider = Self::parse(&dict_raw, lm_raw.as_deref(), tuning);
        provider.status = match lm_path {
            Some(lm) => format!(
                "pinyin dict {} + lm {}",
                dict_path.display(),
                lm.display()
            ),
            None => format!("pinyin dict {}", dict_path.display()),
        };
        Ok(provider)
    }

    fn parse(dict_raw: &str, lm_raw: Option<&str>, tuning: PinyinTuning) -> Self {
        let weights: HashMap<&str, f32> = lm_raw
            .map(|raw| {
                raw.lines()
                    .filter_map(|line| {
                        let mut fields = line.split('\t');
                        let surface = fields.next()?.trim();
                        let weight = fields.next()?.trim().parse::<f32>().ok()?;
                        (!surface.is_empty()).then_some((surface, weight))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut entries: HashMap<String, Vec<ScoredEntry>> = HashMap::new();
        for line in dict_raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let (Some(code), Some(surface)) = (fields.next(), fields.next()) else {
                continue;
            };
            let code = code.trim().to_ascii_lowercase();
            let surface = surface.trim();
            if !is_pinyin_code(&code) || surface.is_empty() {
                continue;
            }
            let base = fields
                .next()
                .and_then(|score| score.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            let score = base + weights.get(surface).copied().unwrap_or(0.0);
            entries.entry(code).or_default().push(ScoredEntry {
                surface: surface.to_string(),
                score,
            });
        }

        for list in entries.values_mut() {
            list.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
            list.truncate(tuning.beam_size);
        }

        Self {
            entries,
            tuning,
            status: String::new(),
        }
    }
}

impl PinyinProvider for DictFileProvider {
    fn query(&self, code: &str, limit: usize) -> Vec<String> {
        let Some(list) = self.entries.get(code) else {
            return Vec::new();
        };
        let Some(best) = list.first() else {
            return Vec::new();
        };
        let floor = best.score - self.tuning.score_filter;
        let mut out: Vec<String> = Vec::new();
        for entry in list {
            // Keep at least n_best entries even below the score floor.
            if entry.score < floor && out.len() >= self.tuning.n_best {
                break;
            }
            if !out.contains(&entry.surface) {
                out.push(entry.surface.clone());
            }
            if out.len() >= limit {
                break;
            }
        }
        out
    }

    fn status(&self) -> &str {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_provider(dict: &str, lm: Option<&str>) -> DictFileProvider {
        DictFileProvider::parse(dict, lm, PinyinTuning::default())
    }

    #[test]
    fn pinyin_code_gate() {
        assert!(is_pinyin_code("nihao"));
        assert!(is_pinyin_code("NiHao"));
        assert!(is_pinyin_code("xi'an"));
        assert!(!is_pinyin_code(""));
        assert!(!is_pinyin_code("ni3"));
        assert!(!is_pinyin_code("ni hao"));
        assert!(!is_pinyin_code("你好"));
    }

    #[test]
    fn fallback_lexicon_serves_chinese_mode() {
        let lexicon = Lexicon::unavailable("built without pinyin backend");
        assert!(!lexicon.available());
        assert_eq!(
            lexicon.query(Language::Zh, "nihao", 5),
            vec!["你好", "你好吗", "你好呀"]
        );
        assert!(lexicon.query(Language::Zh, "zzz", 5).is_empty());
    }

    #[test]
    fn english_lexicon_ignores_primary() {
        let dict = "hello\t不该出现\n";
        let lexicon = Lexicon::with_provider(Box::new(file_provider(dict, None)));
        assert_eq!(
            lexicon.query(Language::En, "hello", 2),
            vec!["hello", "hello there"]
        );
    }

    #[test]
    fn invalid_code_returns_empty() {
        let lexicon = Lexicon::unavailable("x");
        assert!(lexicon.query(Language::Zh, "ni3", 5).is_empty());
        assert!(lexicon.query(Language::Zh, "", 5).is_empty());
        assert!(lexicon.query(Language::Zh, "nihao", 0).is_empty());
    }

    #[test]
    fn primary_preferred_with_fallback_when_empty() {
        let dict = "nihao\t你好\t3.0\nnihao\t妮好\t2.5\n";
        let lexicon = Lexicon::with_provider(Box::new(file_provider(dict, None)));
        assert!(lexicon.available());
        assert_eq!(lexicon.query(Language::Zh, "nihao", 5), vec!["你好", "妮好"]);
        // Primary misses "wo": the demo table answers.
        assert_eq!(lexicon.query(Language::Zh, "wo", 2), vec!["我", "握"]);
    }

    #[test]
    fn provider_ranks_and_filters_by_score() {
        let dict = "ma\t妈\t5.0\nma\t马\t4.5\nma\t骂\t1.0\nma\t吗\t4.2\n";
        let provider = file_provider(dict, None);
        // 骂 is 4.0 below best with score_filter 1.0, but n_best = 2 keeps
        // nothing extra here since two better entries already survive.
        assert_eq!(provider.query("ma", 10), vec!["妈", "马", "吗"]);
    }

    #[test]
    fn lm_weights_reorder_entries() {
        let dict = "ta\t他\t1.0\nta\t她\t1.0\n";
        let lm = "她\t0.5\n";
        let provider = file_provider(dict, Some(lm));
        assert_eq!(provider.query("ta", 10), vec!["她", "他"]);
    }

    #[test]
    fn provider_dedups_and_limits() {
        let dict = "yi\t一\nyi\t一\nyi\t以\nyi\t已\nyi\t亦\n";
        let provider = file_provider(dict, None);
        assert_eq!(provider.query("yi", 3), vec!["一", "以", "已"]);
    }

    #[test]
    fn malformed_dict_lines_are_skipped() {
        let dict = "# comment\n\nnocode\nni3\t错\nnihao\t你好\n";
        let provider = file_provider(dict, None);
        assert_eq!(provider.query("nihao", 5), vec!["你好"]);
        assert!(provider.query("ni3", 5).is_empty());
    }
}
