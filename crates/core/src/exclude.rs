//! Per-directory exclusion rules
//!
//! Each directory may carry a `.abakusignore` file declaring paths to leave
//! out of the walk. Rules are evaluated against absolute paths using a stack
//! of frames, one frame per directory on the current descent path.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory ignore file
pub const IGNORE_FILE: &str = ".abakusignore";

/// The only ignore-file version this implementation understands
const IGNORE_VERSION: u32 = 1;

/// On-disk ignore file document
///
/// Unknown fields are ignored; a version other than 1 is a hard error.
#[derive(Debug, Deserialize)]
struct IgnoreFile {
    version: u32,
    #[serde(default)]
    excludes: Vec<String>,
}

/// Exclusion rules declared by a single directory
#[derive(Debug)]
pub struct ExcludeRules {
    dir: PathBuf,
    rules: Vec<Regex>,
}

impl ExcludeRules {
    /// Create an empty rule set for `dir`
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            rules: Vec::new(),
        }
    }

    /// Load the rules declared by `dir`'s ignore file
    ///
    /// An absent ignore file yields an empty rule set; an unreadable or
    /// malformed one is an error.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut rules = Self::new(dir);
        let path = dir.join(IGNORE_FILE);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(rules),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read ignore file {}", path.display()))
            }
        };

        let doc: IgnoreFile = serde_yaml::from_str(&contents)
            .with_context(|| format!("malformed ignore file {}", path.display()))?;

        if doc.version != IGNORE_VERSION {
            anyhow::bail!(
                "ignore file version {} not supported: {}",
                doc.version,
                path.display()
            );
        }

        for pattern in &doc.excludes {
            rules.add(pattern)?;
        }

        Ok(rules)
    }

    /// Add a single exclusion pattern
    ///
    /// A pattern starting with `/` is anchored to this rule set's directory;
    /// any other pattern matches at any depth below it. The pattern text is
    /// embedded verbatim in the compiled expression, so regex metacharacters
    /// keep their meaning.
    pub fn add(&mut self, pattern: &str) -> Result<()> {
        let expr = if let Some(rest) = pattern.strip_prefix('/') {
            format!("^{}$", self.dir.join(rest).display())
        } else {
            format!("^.*/{}$", pattern)
        };

        let re = Regex::new(&expr).with_context(|| {
            format!(
                "invalid exclude pattern '{}' declared in {}",
                pattern,
                self.dir.display()
            )
        })?;
        self.rules.push(re);
        Ok(())
    }

    /// True if any rule in this set matches the absolute path
    pub fn is_excluded(&self, abs_path: &str) -> bool {
        self.rules.iter().any(|re| re.is_match(abs_path))
    }
}

/// Stack of rule frames active during a tree walk
///
/// A frame is pushed on entering a directory and popped on leaving it; a
/// path is excluded if any frame matches it.
#[derive(Default)]
pub struct ExcludeStack {
    frames: Vec<ExcludeRules>,
}

impl ExcludeStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a rule frame
    pub fn push(&mut self, rules: ExcludeRules) {
        self.frames.push(rules);
    }

    /// Pop the most recent rule frame
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// True if any rule in any active frame matches the absolute path
    pub fn is_excluded(&self, abs_path: &str) -> bool {
        self.frames.iter().any(|frame| frame.is_excluded(abs_path))
    }
}
