/// Rule packs: callout phrasing, template parsing, loading and expansion.
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::schema::pool::PoolId;

/// Keyword every pack expands from.
pub const ROOT_KEYWORD: &str = "rule";

/// Nested symbol expansions deeper than this are treated as a cycle.
const MAX_DEPTH: usize = 16;

/// Upper bound on symbol expansions, retries included, for one resolution.
const MAX_EXPANSIONS: usize = 512;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("template parse error: {0}")]
    TemplateParse(String),
    #[error("no applicable rule for symbol '{0}'")]
    RuleNotFound(String),
    #[error("expansion of '{0}' nested too deeply")]
    RecursionLimit(String),
    #[error("unknown rule pack: {0}")]
    UnknownPool(PoolId),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// Reference to another symbol: `{INITIATOR_label}`, `{taunt}`.
    Symbol(String),
}

/// A parsed template, as a sequence of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{symbol}` → `Symbol` (letters, digits and `_` only)
    /// - `{{` / `}}` → literal `{` / `}`
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, GrammarError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            match chars[i] {
                '{' if i + 1 < len && chars[i + 1] == '{' => {
                    literal_buf.push('{');
                    i += 2;
                }
                '{' => {
                    let start = i + 1;
                    let end = chars[start..]
                        .iter()
                        .position(|&c| c == '}')
                        .map(|offset| start + offset)
                        .ok_or_else(|| GrammarError::TemplateParse("unclosed brace".to_string()))?;

                    let symbol: String = chars[start..end].iter().collect();
                    if symbol.is_empty() {
                        return Err(GrammarError::TemplateParse("empty braces".to_string()));
                    }
                    let invalid = |c: &char| !(c.is_alphanumeric() || *c == '_');
                    if let Some(bad) = symbol.chars().find(invalid) {
                        return Err(GrammarError::TemplateParse(format!(
                            "invalid character '{}' in symbol '{}'",
                            bad, symbol
                        )));
                    }

                    if !literal_buf.is_empty() {
                        segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_buf)));
                    }
                    segments.push(TemplateSegment::Symbol(symbol));
                    i = end + 1;
                }
                '}' if i + 1 < len && chars[i + 1] == '}' => {
                    literal_buf.push('}');
                    i += 2;
                }
                '}' => {
                    return Err(GrammarError::TemplateParse(
                        "unmatched closing brace".to_string(),
                    ));
                }
                c => {
                    literal_buf.push(c);
                    i += 1;
                }
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Ok(Template { segments })
    }

    fn symbols(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            TemplateSegment::Symbol(s) => Some(s.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }
}

/// One phrasing for a keyword, guarded by constant preconditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub keyword: String,
    pub weight: u32,
    /// Constants that must be set to exactly these values.
    pub requires: FxHashMap<String, String>,
    /// Constants that must not be set to these values.
    pub excludes: FxHashMap<String, String>,
    pub template: Template,
}

impl Rule {
    pub fn applies(&self, constants: &FxHashMap<String, String>) -> bool {
        self.requires
            .iter()
            .all(|(k, v)| constants.get(k) == Some(v))
            && self
                .excludes
                .iter()
                .all(|(k, v)| constants.get(k) != Some(v))
    }
}

/// A named set of rules, optionally pulling in the rules of other packs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulePack {
    pub name: PoolId,
    pub include: Vec<PoolId>,
    pub rules: Vec<Rule>,
}

/// Inputs for one resolution: constants that gate rules, plus literal
/// values for context symbols such as `INITIATOR_label`.
#[derive(Debug, Clone, Default)]
pub struct GrammarRequest {
    pub constants: FxHashMap<String, String>,
    pub rules: FxHashMap<String, String>,
}

impl GrammarRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_constant(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.constants.insert(name.into(), value.into());
    }

    pub fn set_rule(&mut self, symbol: impl Into<String>, value: impl Into<String>) {
        self.rules.insert(symbol.into(), value.into());
    }
}

/// Resolves phrasing for a pool. Implemented by `RulePackSet`; hosts with
/// their own grammar engine can implement it instead.
pub trait TemplateResolver {
    /// Number of rules with `keyword` in the pool, includes counted.
    fn rule_count(&self, pool: &PoolId, keyword: &str) -> usize;

    /// Resolved text, or `None` when nothing applicable could be produced.
    fn resolve(&self, pool: &PoolId, request: &GrammarRequest, rng: &mut StdRng) -> Option<String>;
}

/// A problem found by `RulePackSet::lint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintIssue {
    UnknownInclude { pack: PoolId, include: PoolId },
    UndefinedSymbol { pack: PoolId, symbol: String },
    NoRootRule(PoolId),
    /// Every alternative of `symbol` refers back to `symbol`.
    EndlessSymbol { pack: PoolId, symbol: String },
}

impl std::fmt::Display for LintIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownInclude { pack, include } => {
                write!(f, "pack '{}' includes unknown pack '{}'", pack, include)
            }
            Self::UndefinedSymbol { pack, symbol } => {
                write!(f, "pack '{}' references undefined symbol '{}'", pack, symbol)
            }
            Self::NoRootRule(pack) => write!(f, "pack '{}' has no '{}' rule", pack, ROOT_KEYWORD),
            Self::EndlessSymbol { pack, symbol } => {
                write!(f, "pack '{}' symbol '{}' never stops expanding", pack, symbol)
            }
        }
    }
}

/// All loaded rule packs by name.
#[derive(Debug, Clone, Default)]
pub struct RulePackSet {
    packs: HashMap<PoolId, RulePack>,
}

// RON deserialization helpers. The RON format uses a different shape
// than the internal types, so we need intermediate structs.

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct RonRule {
    keyword: String,
    #[serde(default = "default_weight")]
    weight: u32,
    #[serde(default)]
    requires: FxHashMap<String, String>,
    #[serde(default)]
    excludes: FxHashMap<String, String>,
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Pack")]
struct RonPack {
    #[serde(default)]
    include: Vec<String>,
    rules: Vec<RonRule>,
}

impl RulePackSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rule packs from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<RulePackSet, GrammarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse rule packs from a RON string: a map of pack name to `Pack(..)`.
    pub fn parse_ron(input: &str) -> Result<RulePackSet, GrammarError> {
        let raw: HashMap<String, RonPack> = ron::from_str(input)?;
        let mut set = RulePackSet::new();

        for (name, ron_pack) in raw {
            let mut rules = Vec::with_capacity(ron_pack.rules.len());
            for rule in ron_pack.rules {
                rules.push(Rule {
                    keyword: rule.keyword,
                    weight: rule.weight,
                    requires: rule.requires,
                    excludes: rule.excludes,
                    template: Template::parse(&rule.text)?,
                });
            }
            set.insert(RulePack {
                name: PoolId::new(name),
                include: ron_pack.include.into_iter().map(PoolId::new).collect(),
                rules,
            });
        }

        Ok(set)
    }

    pub fn insert(&mut self, pack: RulePack) {
        self.packs.insert(pack.name.clone(), pack);
    }

    /// Merge another set into this one. Packs from `other` replace packs
    /// with the same name.
    pub fn merge(&mut self, other: RulePackSet) {
        self.packs.extend(other.packs);
    }

    pub fn get(&self, pool: &PoolId) -> Option<&RulePack> {
        self.packs.get(pool)
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }

    pub fn pools(&self) -> impl Iterator<Item = &PoolId> {
        self.packs.keys()
    }

    /// Rules of `pool` followed by the rules of everything it includes,
    /// each pack visited once.
    pub fn rules_plus_includes(&self, pool: &PoolId) -> Vec<&Rule> {
        let mut rules = Vec::new();
        let mut visited = FxHashSet::default();
        let mut stack = vec![pool];
        while let Some(name) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            if let Some(pack) = self.packs.get(name) {
                rules.extend(pack.rules.iter());
                stack.extend(pack.include.iter().rev());
            }
        }
        rules
    }

    pub fn rule_count(&self, pool: &PoolId, keyword: &str) -> usize {
        self.rules_plus_includes(pool)
            .iter()
            .filter(|rule| rule.keyword == keyword)
            .count()
    }

    /// Expand the root keyword of `pool`.
    pub fn expand(
        &self,
        pool: &PoolId,
        request: &GrammarRequest,
        rng: &mut StdRng,
    ) -> Result<String, GrammarError> {
        if !self.packs.contains_key(pool) {
            return Err(GrammarError::UnknownPool(pool.clone()));
        }
        let rules = self.rules_plus_includes(pool);
        let mut expansion = Expansion {
            rules: &rules,
            request,
            rng,
            budget: MAX_EXPANSIONS,
        };
        expansion.symbol(ROOT_KEYWORD, 0)
    }

    /// Check every pack for unknown includes, symbols that no rule defines
    /// and missing root rules. Packs that are only ever included need no
    /// root rule. Symbols whose every alternative mentions the symbol
    /// itself are reported as endless. Symbols starting with one of
    /// `context_prefixes` are supplied at request time and not reported.
    pub fn lint(&self, context_prefixes: &[&str]) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let mut names: Vec<&PoolId> = self.packs.keys().collect();
        names.sort();
        let included: FxHashSet<&PoolId> =
            self.packs.values().flat_map(|p| p.include.iter()).collect();

        for name in names {
            let pack = &self.packs[name];
            for include in &pack.include {
                if !self.packs.contains_key(include) {
                    issues.push(LintIssue::UnknownInclude {
                        pack: name.clone(),
                        include: include.clone(),
                    });
                }
            }

            let rules = self.rules_plus_includes(name);
            let defined: FxHashSet<&str> = rules.iter().map(|r| r.keyword.as_str()).collect();
            if !included.contains(name) && !pack.rules.iter().any(|r| r.keyword == ROOT_KEYWORD) {
                issues.push(LintIssue::NoRootRule(name.clone()));
            }

            let mut reported = FxHashSet::default();
            for rule in &pack.rules {
                for symbol in rule.template.symbols() {
                    let external = context_prefixes.iter().any(|p| symbol.starts_with(p));
                    if !external && !defined.contains(symbol) && reported.insert(symbol) {
                        issues.push(LintIssue::UndefinedSymbol {
                            pack: name.clone(),
                            symbol: symbol.to_string(),
                        });
                    }
                }
            }

            let mut checked = FxHashSet::default();
            for rule in &pack.rules {
                let keyword = rule.keyword.as_str();
                if !checked.insert(keyword) {
                    continue;
                }
                let endless = rules
                    .iter()
                    .filter(|r| r.keyword == keyword)
                    .all(|r| r.template.symbols().any(|s| s == keyword));
                if endless {
                    issues.push(LintIssue::EndlessSymbol {
                        pack: name.clone(),
                        symbol: keyword.to_string(),
                    });
                }
            }
        }

        issues
    }
}

/// State shared by every nested step of one expansion.
struct Expansion<'a> {
    rules: &'a [&'a Rule],
    request: &'a GrammarRequest,
    rng: &'a mut StdRng,
    /// Symbol expansions left before the whole attempt is abandoned.
    budget: usize,
}

impl Expansion<'_> {
    /// Expand `symbol`, trying another alternative whenever the chosen one
    /// cannot be fully expanded. Hitting the depth or budget limit aborts
    /// the whole expansion instead of backtracking.
    fn symbol(&mut self, symbol: &str, depth: usize) -> Result<String, GrammarError> {
        if depth > MAX_DEPTH || self.budget == 0 {
            return Err(GrammarError::RecursionLimit(symbol.to_string()));
        }
        self.budget -= 1;
        if let Some(value) = self.request.rules.get(symbol) {
            return Ok(value.clone());
        }

        let constants = &self.request.constants;
        let mut candidates: Vec<&Rule> = self
            .rules
            .iter()
            .copied()
            .filter(|rule| rule.keyword == symbol && rule.weight > 0 && rule.applies(constants))
            .collect();
        let mut last_err = GrammarError::RuleNotFound(symbol.to_string());

        while !candidates.is_empty() {
            let weights: Vec<u32> = candidates.iter().map(|rule| rule.weight).collect();
            let dist = WeightedIndex::new(&weights)
                .map_err(|_| GrammarError::RuleNotFound(symbol.to_string()))?;
            let picked = dist.sample(&mut *self.rng);

            match self.render(&candidates[picked].template, depth) {
                Ok(text) => return Ok(text),
                Err(err @ GrammarError::RecursionLimit(_)) => return Err(err),
                Err(err) => {
                    last_err = err;
                    candidates.swap_remove(picked);
                }
            }
        }

        Err(last_err)
    }

    fn render(&mut self, template: &Template, depth: usize) -> Result<String, GrammarError> {
        let mut out = String::new();
        for segment in &template.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Symbol(symbol) => out.push_str(&self.symbol(symbol, depth + 1)?),
            }
        }
        Ok(out)
    }
}

impl TemplateResolver for RulePackSet {
    fn rule_count(&self, pool: &PoolId, keyword: &str) -> usize {
        RulePackSet::rule_count(self, pool, keyword)
    }

    fn resolve(&self, pool: &PoolId, request: &GrammarRequest, rng: &mut StdRng) -> Option<String> {
        match self.expand(pool, request, rng) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!("Could not resolve text from pack {}: {}", pool, err);
                None
            }
        }
    }
}
