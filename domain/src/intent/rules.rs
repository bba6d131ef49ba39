//! Ordered heuristic classification rules.
//!
//! The rule table is an ordered list of `(predicate, IntentKind)` variants
//! evaluated in sequence, not a monolithic if/elif chain: each rule is
//! individually testable and the table can be reordered deliberately.
//!
//! Order is load-bearing where categories overlap. Action-verb rules
//! ([`HeuristicRule::FileSearchVerbs`]) run before the bare location pattern
//! ([`HeuristicRule::BareLocation`]) so "list files in current directory"
//! resolves to `FileSearch`, not `LocationQuery`. Domain keyword rules run
//! first so "find papers about transformers" never reads as a file search.
//!
//! A request with more than one filename-like token is multi-target: it
//! matches `FileSearch` and is excluded from `FileRead`.

use super::{Intent, IntentKind};
use crate::core::string::normalize;

/// How certain a rule match is.
///
/// Only strong matches decide a classification; weak matches mark the text
/// ambiguous and send it to the remote fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Strong,
    Weak,
}

/// A single rule firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    pub kind: IntentKind,
    pub confidence: Confidence,
}

impl RuleMatch {
    fn strong(kind: IntentKind) -> Self {
        Self {
            kind,
            confidence: Confidence::Strong,
        }
    }

    fn weak(kind: IntentKind) -> Self {
        Self {
            kind,
            confidence: Confidence::Weak,
        }
    }
}

/// Result of evaluating the whole table against one request text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleVerdict {
    /// The first strong rule, in table order, decided the classification.
    Decided {
        kind: IntentKind,
        rule: HeuristicRule,
    },
    /// No strong rule fired; `weak_hits` counts the weak signals seen.
    Ambiguous { weak_hits: usize },
}

/// Pre-tokenized view of one request text, shared by all rules.
#[derive(Debug)]
pub struct RuleInput {
    normalized: String,
    tokens: Vec<String>,
    filename_tokens: usize,
}

impl RuleInput {
    pub fn new(text: &str) -> Self {
        let normalized = normalize(text);
        let tokens: Vec<String> = normalized
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && !"./_-~".contains(c)))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let filename_tokens = tokens.iter().filter(|t| looks_like_filename(t)).count();
        Self {
            normalized,
            tokens,
            filename_tokens,
        }
    }

    /// The normalized form of the input text.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// The filename-like tokens of this text, in order of appearance.
    pub fn filenames(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter(|t| looks_like_filename(t))
            .map(|t| t.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    fn has_word(&self, word: &str) -> bool {
        self.tokens.iter().any(|t| t == word)
    }

    fn has_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.has_word(w))
    }

    fn has_phrase(&self, phrase: &str) -> bool {
        self.normalized.contains(phrase)
    }

    fn has_any_phrase(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.has_phrase(p))
    }
}

/// A token that names a concrete file: has a path separator, or an
/// alphanumeric extension of plausible length.
fn looks_like_filename(token: &str) -> bool {
    if token.contains('/') && token.len() > 1 {
        return true;
    }
    match token.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

const GREETING_WORDS: &[&str] = &["hi", "hello", "hey", "thanks"];

const GREETING_PHRASES: &[&str] = &[
    "thank you",
    "good morning",
    "good evening",
    "how are you",
];

const FINANCIAL_TERMS: &[&str] = &[
    "revenue", "earnings", "stock", "stocks", "ticker", "dividend", "profit", "valuation",
    "quarterly", "fiscal",
];

const FINANCIAL_PHRASES: &[&str] = &["market cap", "income statement", "balance sheet"];

const CITATION_TERMS: &[&str] = &[
    "paper",
    "papers",
    "citation",
    "citations",
    "cite",
    "arxiv",
    "doi",
    "journal",
    "publication",
    "publications",
    "preprint",
];

const ANALYSIS_TERMS: &[&str] = &[
    "analyze",
    "analyse",
    "analysis",
    "plot",
    "chart",
    "histogram",
    "average",
    "mean",
    "median",
    "correlation",
    "statistics",
    "stats",
    "aggregate",
];

const SEARCH_VERBS: &[&str] = &["list", "find", "search", "locate", "ls", "glob", "show"];

const FILE_NOUNS: &[&str] = &[
    "file",
    "files",
    "directory",
    "directories",
    "folder",
    "folders",
    "dir",
];

const READ_VERBS: &[&str] = &["read", "open", "cat", "view", "display", "print", "show"];

const LOCATION_PHRASES: &[&str] = &[
    "where am i",
    "current directory",
    "current folder",
    "working directory",
    "what directory",
    "which directory",
];

/// The rule table, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicRule {
    /// Short greetings and pleasantries are plain conversation.
    Greeting,
    /// Financial vocabulary needs the remote financial-data family.
    FinancialKeywords,
    /// Citation/paper vocabulary needs the remote academic-search family.
    CitationKeywords,
    /// Explicit imperative to run a command.
    ShellImperative,
    /// Analysis vocabulary over local data.
    AnalysisKeywords,
    /// Action verbs plus file nouns, or multi-target filename mentions.
    FileSearchVerbs,
    /// A read verb with exactly one filename-like token.
    SingleFileRead,
    /// Bare "where am I" / "pwd" phrasing with no stronger signal above.
    BareLocation,
    /// A lone filename with no verb: a weak read signal.
    LooseFileMention,
    /// Location-adjacent words outside the bare patterns: a weak signal.
    LooseLocationWords,
}

impl HeuristicRule {
    /// Evaluation order. Reordering entries changes overlap resolution, so
    /// additions go at the position their precedence requires.
    pub const ORDERED: [HeuristicRule; 10] = [
        HeuristicRule::Greeting,
        HeuristicRule::FinancialKeywords,
        HeuristicRule::CitationKeywords,
        HeuristicRule::ShellImperative,
        HeuristicRule::AnalysisKeywords,
        HeuristicRule::FileSearchVerbs,
        HeuristicRule::SingleFileRead,
        HeuristicRule::BareLocation,
        HeuristicRule::LooseFileMention,
        HeuristicRule::LooseLocationWords,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HeuristicRule::Greeting => "greeting",
            HeuristicRule::FinancialKeywords => "financial_keywords",
            HeuristicRule::CitationKeywords => "citation_keywords",
            HeuristicRule::ShellImperative => "shell_imperative",
            HeuristicRule::AnalysisKeywords => "analysis_keywords",
            HeuristicRule::FileSearchVerbs => "file_search_verbs",
            HeuristicRule::SingleFileRead => "single_file_read",
            HeuristicRule::BareLocation => "bare_location",
            HeuristicRule::LooseFileMention => "loose_file_mention",
            HeuristicRule::LooseLocationWords => "loose_location_words",
        }
    }

    pub fn evaluate(&self, input: &RuleInput) -> Option<RuleMatch> {
        match self {
            HeuristicRule::Greeting => {
                let short = input.tokens.len() <= 4;
                let greeting =
                    input.has_any_word(GREETING_WORDS) || input.has_any_phrase(GREETING_PHRASES);
                (short && greeting).then(|| RuleMatch::strong(IntentKind::Conversation))
            }
            HeuristicRule::FinancialKeywords => (input.has_any_word(FINANCIAL_TERMS)
                || input.has_any_phrase(FINANCIAL_PHRASES))
            .then(|| RuleMatch::strong(IntentKind::RemoteToolRequired)),
            HeuristicRule::CitationKeywords => input
                .has_any_word(CITATION_TERMS)
                .then(|| RuleMatch::strong(IntentKind::RemoteToolRequired)),
            HeuristicRule::ShellImperative => {
                let imperative = input.normalized.starts_with("run ")
                    || input.normalized.starts_with("exec ")
                    || input.normalized.starts_with("execute ")
                    || input.normalized.starts_with("$ ")
                    || input.normalized.starts_with("! ");
                (imperative || input.has_phrase("shell command"))
                    .then(|| RuleMatch::strong(IntentKind::ShellExecution))
            }
            HeuristicRule::AnalysisKeywords => (input.has_any_word(ANALYSIS_TERMS)
                || input.has_phrase("summarize data")
                || input.has_phrase("summarise data"))
            .then(|| RuleMatch::strong(IntentKind::DataAnalysis)),
            HeuristicRule::FileSearchVerbs => {
                // Multi-target requests are always searches, whatever the verb.
                if input.filename_tokens >= 2 {
                    return Some(RuleMatch::strong(IntentKind::FileSearch));
                }
                let verb = input.has_any_word(SEARCH_VERBS) || input.has_phrase("where is");
                (verb && input.has_any_word(FILE_NOUNS))
                    .then(|| RuleMatch::strong(IntentKind::FileSearch))
            }
            HeuristicRule::SingleFileRead => {
                (input.has_any_word(READ_VERBS) && input.filename_tokens == 1)
                    .then(|| RuleMatch::strong(IntentKind::FileRead))
            }
            HeuristicRule::BareLocation => {
                let exact = matches!(input.normalized.as_str(), "pwd" | "cwd" | "whereami");
                (exact || input.has_any_phrase(LOCATION_PHRASES))
                    .then(|| RuleMatch::strong(IntentKind::LocationQuery))
            }
            HeuristicRule::LooseFileMention => (input.filename_tokens == 1)
                .then(|| RuleMatch::weak(IntentKind::FileRead)),
            HeuristicRule::LooseLocationWords => input
                .has_any_word(&["where", "directory", "folder"])
                .then(|| RuleMatch::weak(IntentKind::LocationQuery)),
        }
    }
}

/// Evaluate the whole table in order. The first strong match decides; weak
/// matches only record that the text was not silent.
pub fn evaluate_rules(text: &str) -> RuleVerdict {
    let input = RuleInput::new(text);
    let mut weak_hits = 0;

    for rule in HeuristicRule::ORDERED {
        match rule.evaluate(&input) {
            Some(RuleMatch {
                kind,
                confidence: Confidence::Strong,
            }) => return RuleVerdict::Decided { kind, rule },
            Some(RuleMatch {
                confidence: Confidence::Weak,
                ..
            }) => weak_hits += 1,
            None => {}
        }
    }

    RuleVerdict::Ambiguous { weak_hits }
}

/// Convenience wrapper: a decided verdict becomes a heuristic [`Intent`].
pub fn heuristic_intent(text: &str) -> Option<Intent> {
    match evaluate_rules(text) {
        RuleVerdict::Decided { kind, .. } => Some(Intent::heuristic(kind)),
        RuleVerdict::Ambiguous { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decided(text: &str) -> Option<IntentKind> {
        match evaluate_rules(text) {
            RuleVerdict::Decided { kind, .. } => Some(kind),
            RuleVerdict::Ambiguous { .. } => None,
        }
    }

    // ==================== Individual rules ====================

    #[test]
    fn test_filename_detection() {
        assert!(looks_like_filename("config.yaml"));
        assert!(looks_like_filename("src/main.rs"));
        assert!(looks_like_filename("~/notes.txt"));
        assert!(!looks_like_filename("3.14"));
        assert!(!looks_like_filename("files"));
        assert!(!looks_like_filename("etc."));
    }

    #[test]
    fn test_greeting_rule() {
        let input = RuleInput::new("hello there");
        assert_eq!(
            HeuristicRule::Greeting.evaluate(&input),
            Some(RuleMatch::strong(IntentKind::Conversation))
        );
        // Long sentences are not greetings even if one appears
        let input = RuleInput::new("hello, can you list all the rust files in src");
        assert_eq!(HeuristicRule::Greeting.evaluate(&input), None);
    }

    #[test]
    fn test_shell_rule_requires_imperative_position() {
        let input = RuleInput::new("run cargo fmt");
        assert!(HeuristicRule::ShellImperative.evaluate(&input).is_some());
        let input = RuleInput::new("my morning run was nice");
        assert!(HeuristicRule::ShellImperative.evaluate(&input).is_none());
    }

    #[test]
    fn test_multi_target_is_search_not_read() {
        let input = RuleInput::new("read a.txt and b.txt");
        assert_eq!(
            HeuristicRule::FileSearchVerbs.evaluate(&input),
            Some(RuleMatch::strong(IntentKind::FileSearch))
        );
        // And the whole table agrees
        assert_eq!(decided("read a.txt and b.txt"), Some(IntentKind::FileSearch));
    }

    #[test]
    fn test_single_file_read() {
        assert_eq!(decided("open config.yaml"), Some(IntentKind::FileRead));
        assert_eq!(decided("show me notes.txt"), Some(IntentKind::FileRead));
    }

    // ==================== Ordering scenarios ====================

    #[test]
    fn test_action_verbs_win_over_bare_location() {
        assert_eq!(
            decided("list files in current directory"),
            Some(IntentKind::FileSearch)
        );
        assert_eq!(
            decided("list the python files here"),
            Some(IntentKind::FileSearch)
        );
    }

    #[test]
    fn test_bare_location_patterns() {
        assert_eq!(decided("pwd"), Some(IntentKind::LocationQuery));
        assert_eq!(decided("where am I"), Some(IntentKind::LocationQuery));
        assert_eq!(
            decided("what directory is this"),
            Some(IntentKind::LocationQuery)
        );
    }

    #[test]
    fn test_domain_keywords_win_over_file_verbs() {
        assert_eq!(
            decided("find papers about transformers"),
            Some(IntentKind::RemoteToolRequired)
        );
        assert_eq!(
            decided("compare Apple and Microsoft revenue"),
            Some(IntentKind::RemoteToolRequired)
        );
    }

    #[test]
    fn test_analysis_keywords() {
        assert_eq!(decided("plot the monthly totals"), Some(IntentKind::DataAnalysis));
        assert_eq!(
            decided("analyze sales.csv"),
            Some(IntentKind::DataAnalysis)
        );
    }

    // ==================== Ambiguity ====================

    #[test]
    fn test_lone_filename_is_ambiguous() {
        match evaluate_rules("config.yaml") {
            RuleVerdict::Ambiguous { weak_hits } => assert!(weak_hits >= 1),
            other => panic!("expected ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_no_signal_is_ambiguous() {
        assert_eq!(decided("what a day it has been"), None);
    }

    #[test]
    fn test_table_order_is_stable() {
        // The positions that resolve documented overlaps.
        let order = HeuristicRule::ORDERED;
        let position = |rule: HeuristicRule| order.iter().position(|r| *r == rule).unwrap();
        assert!(position(HeuristicRule::FileSearchVerbs) < position(HeuristicRule::BareLocation));
        assert!(position(HeuristicRule::FinancialKeywords) < position(HeuristicRule::FileSearchVerbs));
        assert!(position(HeuristicRule::FileSearchVerbs) < position(HeuristicRule::SingleFileRead));
    }
}
