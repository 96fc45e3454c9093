//! Rule registry.
//!
//! A [`Rule`] pairs a text pattern with a handler. Rules are kept in
//! registration order; duplicates are allowed and all of them are retained.
//!
//! # Matching
//!
//! Patterns are matched against message text **anchored at the start**: the
//! rule applies when a match begins at byte 0, but the match need not consume
//! the whole text. Look-around is supported, so `(?!/).+` matches any text
//! that does not start with a slash.
//!
//! ```rust,ignore
//! let mut rules = RuleRegistry::new();
//! rules.register("/command ?(.*)", command, None, RuleOptions::new())?;
//! rules.register("(?!/).+", parrot, None, RuleOptions::new())?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use fancy_regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::InvalidPatternError;
use crate::handler::{BoxedHandler, Handler, into_handler};

/// Opaque options attached to a rule at registration.
pub type RuleOptions = HashMap<String, Value>;

// =============================================================================
// Captures
// =============================================================================

/// Capture groups extracted from a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    /// Every capture group in order, named groups included.
    /// Groups that did not participate in the match are `None`.
    pub positional: Vec<Option<String>>,
    /// Named capture groups.
    pub named: HashMap<String, Option<String>>,
}

impl Captures {
    fn from_match(regex: &Regex, caps: &fancy_regex::Captures<'_>) -> Self {
        let positional = (1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();

        let named = regex
            .capture_names()
            .flatten()
            .map(|name| {
                let value = caps.name(name).map(|m| m.as_str().to_string());
                (name.to_string(), value)
            })
            .collect();

        Self { positional, named }
    }

    /// Returns positional group `index` (0 is the first group, not the whole
    /// match), if it participated.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.positional.get(index).and_then(|v| v.as_deref())
    }

    /// Returns the named group `name`, if it participated.
    pub fn name(&self, name: &str) -> Option<&str> {
        self.named.get(name).and_then(|v| v.as_deref())
    }

    /// Number of positional groups.
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// Returns whether the pattern had no groups.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }
}

// =============================================================================
// Rule
// =============================================================================

/// Endpoint and options of a rule, shared with every invocation it produces.
#[derive(Debug, Clone, Default)]
pub struct RuleInfo {
    /// Optional logical name of the rule.
    pub endpoint: Option<String>,
    /// Opaque pass-through options.
    pub options: Arc<RuleOptions>,
}

impl RuleInfo {
    /// Looks up an option by key.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

/// A registered (pattern, handler, options) tuple. Immutable once created.
#[derive(Clone)]
pub struct Rule {
    source: String,
    regex: Regex,
    info: RuleInfo,
    handler: BoxedHandler,
}

impl Rule {
    /// Compiles `pattern` into a rule.
    pub fn new(
        pattern: &str,
        handler: BoxedHandler,
        endpoint: Option<String>,
        options: RuleOptions,
    ) -> Result<Self, InvalidPatternError> {
        let regex = Regex::new(pattern).map_err(|e| InvalidPatternError::new(pattern, e))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
            info: RuleInfo {
                endpoint,
                options: Arc::new(options),
            },
            handler,
        })
    }

    /// The pattern source as registered.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// The optional logical name of this rule.
    pub fn endpoint(&self) -> Option<&str> {
        self.info.endpoint.as_deref()
    }

    /// The options attached to this rule.
    pub fn options(&self) -> &RuleOptions {
        &self.info.options
    }

    /// Endpoint and options as shared with handler invocations.
    pub fn info(&self) -> &RuleInfo {
        &self.info
    }

    /// The handler invoked when this rule matches.
    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    /// Matches `text` from its first character.
    ///
    /// Returns the capture groups when a match begins at position 0. A match
    /// that fails at runtime (e.g. backtracking limit) counts as no match.
    pub fn captures(&self, text: &str) -> Option<Captures> {
        // Leftmost-first search: if any match starts at 0, the first match does.
        match self.regex.captures(text) {
            Ok(Some(caps)) if caps.get(0).is_some_and(|m| m.start() == 0) => {
                Some(Captures::from_match(&self.regex, &caps))
            }
            Ok(_) => None,
            Err(e) => {
                warn!(rule = %self.source, error = %e, "Pattern match failed, skipping rule");
                None
            }
        }
    }

    /// Returns whether this rule applies to `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.captures(text).is_some()
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.source)
            .field("endpoint", &self.info.endpoint)
            .field("options", &self.info.options)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// An ordered list of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Compiles `pattern` and appends a rule invoking `handler`.
    pub fn register<H, T>(
        &mut self,
        pattern: &str,
        handler: H,
        endpoint: Option<String>,
        options: RuleOptions,
    ) -> Result<(), InvalidPatternError>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.register_boxed(pattern, into_handler(handler), endpoint, options)
    }

    /// Appends a rule with a pre-built boxed handler.
    pub fn register_boxed(
        &mut self,
        pattern: &str,
        handler: BoxedHandler,
        endpoint: Option<String>,
        options: RuleOptions,
    ) -> Result<(), InvalidPatternError> {
        let rule = Rule::new(pattern, handler, endpoint, options)?;
        debug!(
            rule = %rule.pattern(),
            endpoint = rule.endpoint().unwrap_or("unnamed"),
            index = self.rules.len(),
            "Registered update rule"
        );
        self.rules.push(rule);
        Ok(())
    }

    /// All rules in registration order.
    pub fn all(&self) -> &[Rule] {
        &self.rules
    }

    /// Iterates over rules in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns whether no rule has been registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleRegistry {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
