//! IQ-TREE argument vector construction.
//!
//! Everything here is a pure string-vector builder: no filesystem access and
//! no process spawning. Every run mode starts from the same base tokens
//! (`<exe> -s <alignment> -m <model> -pre <prefix>`), except the pairwise
//! RF-distance mode which has its own shape.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Flags owned by the base invocation; extra flags may never repeat them.
const BASE_FLAGS: &[&str] = &["s", "m", "pre"];

/// Ordered argument vector; the first token is always the executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    tokens: Vec<String>,
}

impl CommandSpec {
    /// Wrap an already assembled token list.
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn executable(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    /// Token following the first `-<flag>`. Only meaningful for flags the
    /// builder emits with a value; the token is returned as is, even when it
    /// starts with `-`.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        let wanted = format!("-{flag}");
        self.tokens
            .iter()
            .position(|t| *t == wanted)
            .and_then(|i| self.tokens.get(i + 1))
            .map(String::as_str)
    }

    /// Number of standalone `-<flag>` tokens.
    pub fn count_flag(&self, flag: &str) -> usize {
        let wanted = format!("-{flag}");
        self.tokens.iter().filter(|t| **t == wanted).count()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

/// Value attached to an extra flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagValue {
    /// Flag is emitted alone (`-redo`).
    Switch,
    /// Flag is followed by this token (`-nt 4`).
    Value(String),
}

impl From<&str> for FlagValue {
    fn from(v: &str) -> Self {
        FlagValue::Value(v.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(v: String) -> Self {
        FlagValue::Value(v)
    }
}

impl From<&Path> for FlagValue {
    fn from(v: &Path) -> Self {
        FlagValue::Value(v.to_string_lossy().into_owned())
    }
}

// Rust's `Display` for numbers is locale independent, which is what the tool
// expects on its command line.
macro_rules! numeric_flag_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FlagValue {
                fn from(v: $t) -> Self {
                    FlagValue::Value(v.to_string())
                }
            }
        )*
    };
}

numeric_flag_value!(i32, i64, u32, u64, usize, f32, f64);

/// Ordered mapping of extra flag name to value.
///
/// Setting an existing name replaces its value in place, so the emitted order
/// is the order in which names were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraFlags {
    entries: Vec<(String, FlagValue)>,
}

impl ExtraFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`. A leading `-` on the name is ignored.
    pub fn set(&mut self, name: &str, value: impl Into<FlagValue>) {
        let name = name.trim().trim_start_matches('-').to_string();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with_value(mut self, name: &str, value: impl Into<FlagValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_switch(mut self, name: &str) -> Self {
        self.set(name, FlagValue::Switch);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn append_to(&self, tokens: &mut Vec<String>, reserved: &[&str]) -> Result<(), CommandError> {
        for (name, value) in &self.entries {
            if name.is_empty() {
                return Err(CommandError::EmptyFlagName);
            }
            if reserved.contains(&name.as_str()) {
                return Err(CommandError::ReservedFlag { flag: name.clone() });
            }
            tokens.push(format!("-{name}"));
            if let FlagValue::Value(v) = value {
                tokens.push(v.clone());
            }
        }
        Ok(())
    }
}

/// Starting tree strategy for a full tree search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartTree {
    /// Maximum-parsimony starting tree.
    Pars,
    /// Random starting tree.
    Rand,
    /// BIONJ starting tree.
    Bionj,
}

impl StartTree {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartTree::Pars => "pars",
            StartTree::Rand => "rand",
            StartTree::Bionj => "bionj",
        }
    }
}

impl fmt::Display for StartTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StartTree {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pars" | "parsimony" => Ok(StartTree::Pars),
            "rand" | "random" => Ok(StartTree::Rand),
            "bionj" => Ok(StartTree::Bionj),
            other => Err(format!(
                "unknown starting tree '{other}' (expected pars, rand or bionj)"
            )),
        }
    }
}

/// Alignment-based run modes. Each extends the base invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Base invocation only; used to have the tool parse the alignment.
    AlignmentParse,
    /// Parsimony-only search producing `count` starting trees.
    ParsimonyTrees { count: u32 },
    /// Full maximum-likelihood tree search.
    TreeSearch { start: StartTree },
    /// Score a fixed tree without searching.
    Evaluate { tree: PathBuf },
    /// Topology tests of `trees` against `reference`.
    SignificanceTests { trees: PathBuf, reference: PathBuf },
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::AlignmentParse => "alignment_parse",
            RunMode::ParsimonyTrees { .. } => "parsimony_trees",
            RunMode::TreeSearch { .. } => "tree_search",
            RunMode::Evaluate { .. } => "evaluate",
            RunMode::SignificanceTests { .. } => "significance_tests",
        }
    }

    fn mode_flags(&self) -> &'static [&'static str] {
        match self {
            RunMode::AlignmentParse => &[],
            RunMode::ParsimonyTrees { .. } | RunMode::TreeSearch { .. } => &["start"],
            RunMode::Evaluate { .. } => &["t", "n"],
            RunMode::SignificanceTests { .. } => &["z", "te", "n", "zb", "zw", "au"],
        }
    }

    fn mode_tokens(&self) -> Vec<String> {
        match self {
            RunMode::AlignmentParse => Vec::new(),
            RunMode::ParsimonyTrees { count } => {
                vec!["-start".to_string(), format!("pars{{{count}}}")]
            }
            RunMode::TreeSearch { start } => {
                vec!["-start".to_string(), start.as_str().to_string()]
            }
            RunMode::Evaluate { tree } => vec![
                "-t".to_string(),
                path_token(tree),
                "-n".to_string(),
                "0".to_string(),
            ],
            RunMode::SignificanceTests { trees, reference } => vec![
                "-z".to_string(),
                path_token(trees),
                "-te".to_string(),
                path_token(reference),
                "-n".to_string(),
                "0".to_string(),
                "-zb".to_string(),
                "10000".to_string(),
                "-zw".to_string(),
                "-au".to_string(),
            ],
        }
    }
}

/// Builds argument vectors for one IQ-TREE executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    executable: PathBuf,
}

impl CommandBuilder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// `<exe> -s <alignment> -m <model> -pre <prefix> <mode tokens> <extras>`
    pub fn alignment_run(
        &self,
        alignment: &Path,
        model: &str,
        prefix: &Path,
        mode: &RunMode,
        extra: &ExtraFlags,
    ) -> Result<CommandSpec, CommandError> {
        let mut tokens = vec![
            path_token(&self.executable),
            "-s".to_string(),
            path_token(alignment),
            "-m".to_string(),
            model.to_string(),
            "-pre".to_string(),
            path_token(prefix),
        ];
        tokens.extend(mode.mode_tokens());

        let reserved: Vec<&str> = BASE_FLAGS
            .iter()
            .chain(mode.mode_flags())
            .copied()
            .collect();
        extra.append_to(&mut tokens, &reserved)?;

        Ok(CommandSpec::from_tokens(tokens))
    }

    /// `<exe> -rfdist <trees> -pre <prefix> <extras>`
    pub fn rf_distances(
        &self,
        trees: &Path,
        prefix: &Path,
        extra: &ExtraFlags,
    ) -> Result<CommandSpec, CommandError> {
        let mut tokens = vec![
            path_token(&self.executable),
            "-rfdist".to_string(),
            path_token(trees),
            "-pre".to_string(),
            path_token(prefix),
        ];
        extra.append_to(&mut tokens, &["rfdist", "pre"])?;
        Ok(CommandSpec::from_tokens(tokens))
    }
}

fn path_token(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
