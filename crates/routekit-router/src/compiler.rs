//! Compiling resolved routes into one regular expression.
//!
//! Routes are tokenized and merged into a prefix trie so that routes sharing
//! a prefix share the expression for it. The trie is then emitted as a
//! single alternation anchored at the start of the path. Every named slot
//! becomes a capture group; every route terminal becomes an empty sentinel
//! group `$()`. Exactly one sentinel participates in a successful match, and
//! its group index identifies the branch through a dense table.

use std::cmp::Reverse;
use std::collections::HashSet;

use regex::{Captures, Regex, RegexBuilder};
use routekit_core::{RouterConfig, RouterError};
use tracing::{debug, trace, warn};

use crate::pattern::{Component, Hint, LABEL_PATTERN};
use crate::relation::Route;

const TAIL_WILDCARD: &str = "(?:/.*)?";
const ONLY_WILDCARD: &str = ".*";

/// Trie edge label.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Key {
    /// Literal text, leading `/` included.
    Literal(String),
    /// `/` followed by one value matching the expression.
    Slot(String),
    /// A trailing `/*`: nothing, or `/` and anything.
    Tail,
    /// The bare `*` pattern.
    Rest,
}

impl Key {
    /// Alternation priority: literals, constrained slots (longer expressions
    /// first), the default slot, then wildcards.
    fn rank(&self) -> (u8, Reverse<usize>, &str) {
        match self {
            Self::Literal(text) => (0, Reverse(0), text.as_str()),
            Self::Slot(pattern) if pattern == LABEL_PATTERN => (2, Reverse(0), ""),
            Self::Slot(pattern) => (1, Reverse(pattern.len()), pattern.as_str()),
            Self::Tail => (3, Reverse(0), ""),
            Self::Rest => (4, Reverse(0), ""),
        }
    }
}

#[derive(Debug)]
struct Token {
    key: Key,
    name: Option<String>,
    /// Capture groups declared inside a user supplied fragment.
    inner_groups: usize,
}

fn tokenize(route: &Route, group_names: &mut Vec<String>) -> Result<Vec<Token>, RouterError> {
    let hint: &Hint = &route.hint;
    if hint.components.is_empty() && hint.ends_with_wildcard {
        return Ok(vec![Token {
            key: Key::Rest,
            name: None,
            inner_groups: 0,
        }]);
    }

    let last = hint.components.len().saturating_sub(1);
    let mut tokens = Vec::with_capacity(hint.components.len());
    for (i, component) in hint.components.iter().enumerate() {
        let token = match component {
            Component::Literal(text) => Token {
                key: Key::Literal(text.clone()),
                name: None,
                inner_groups: 0,
            },
            Component::Param { name, constraint } => {
                let fragment =
                    Regex::new(constraint).map_err(|err| RouterError::invalid(&route.path, err))?;
                group_names.extend(fragment.capture_names().flatten().map(String::from));
                Token {
                    key: Key::Slot(constraint.clone()),
                    name: Some(name.clone()),
                    inner_groups: fragment.captures_len() - 1,
                }
            }
            Component::Wildcard if i == last => Token {
                key: Key::Tail,
                name: None,
                inner_groups: 0,
            },
            Component::Wildcard => Token {
                key: Key::Slot(LABEL_PATTERN.to_string()),
                name: None,
                inner_groups: 0,
            },
        };
        tokens.push(token);
    }
    Ok(tokens)
}

#[derive(Debug, Default)]
struct Node {
    /// Entry of the route terminating here.
    leaf: Option<usize>,
    /// Parameter variable bound by this slot, if any route names it.
    var: Option<usize>,
    inner_groups: usize,
    children: Vec<(Key, Node)>,
}

impl Node {
    fn insert(
        &mut self,
        tokens: &[Token],
        vars: &mut usize,
        params: &mut Vec<(String, usize)>,
    ) -> &mut Option<usize> {
        let Some((token, rest)) = tokens.split_first() else {
            return &mut self.leaf;
        };

        let pos = if let Some(pos) = self.children.iter().position(|(k, _)| *k == token.key) {
            pos
        } else {
            self.children.push((
                token.key.clone(),
                Node {
                    inner_groups: token.inner_groups,
                    ..Node::default()
                },
            ));
            self.children.len() - 1
        };

        let child = &mut self.children[pos].1;
        if let Some(name) = &token.name {
            let var = *child.var.get_or_insert_with(|| {
                *vars += 1;
                *vars - 1
            });
            params.push((name.clone(), var));
        }
        child.insert(rest, vars, params)
    }

    fn emit(&self, out: &mut String, state: &mut EmitState) {
        let mut alternatives = Vec::with_capacity(self.children.len() + 1);

        if let Some(entry) = self.leaf {
            state.groups += 1;
            state.sentinels.push((state.groups, entry));
            alternatives.push("$()".to_string());
        }

        let mut children: Vec<&(Key, Node)> = self.children.iter().collect();
        children.sort_by(|(a, _), (b, _)| a.rank().cmp(&b.rank()));

        for (key, child) in children {
            let mut alt = String::new();
            match key {
                Key::Literal(text) => alt.push_str(&regex::escape(text)),
                Key::Slot(pattern) => {
                    if let Some(var) = child.var {
                        state.groups += 1;
                        state.var_groups[var] = state.groups;
                        alt.push_str(&format!("/({pattern})"));
                    } else {
                        alt.push_str(&format!("/(?:{pattern})"));
                    }
                    state.groups += child.inner_groups;
                }
                Key::Tail => alt.push_str(TAIL_WILDCARD),
                Key::Rest => alt.push_str(ONLY_WILDCARD),
            }
            child.emit(&mut alt, state);
            alternatives.push(alt);
        }

        match alternatives.len() {
            0 => {}
            1 => out.push_str(&alternatives[0]),
            _ => {
                out.push_str("(?:");
                out.push_str(&alternatives.join("|"));
                out.push(')');
            }
        }
    }
}

#[derive(Debug)]
struct EmitState {
    groups: usize,
    var_groups: Vec<usize>,
    sentinels: Vec<(usize, usize)>,
}

#[derive(Debug)]
struct Entry {
    handlers: Vec<usize>,
    params: Vec<(String, usize)>,
}

/// Handler table entry for one branch of a compiled matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Branch {
    /// Handler arena indexes, in registration order.
    pub handlers: Vec<usize>,
    /// `(capture group, parameter name)` pairs, aliases included. `None`
    /// for parameter-less branches.
    pub params: Option<Vec<(usize, String)>>,
}

/// One compiled expression and its branch table.
#[derive(Debug)]
pub(crate) struct Matcher {
    regex: Regex,
    /// Sentinel capture group of each branch, indexed by branch id.
    sentinels: Vec<usize>,
    branches: Vec<Branch>,
}

impl Matcher {
    /// Run the expression and identify the branch that matched.
    pub fn exec<'p>(&self, path: &'p str) -> Option<(&Branch, Captures<'p>)> {
        let caps = self.regex.captures(path)?;
        let id = self
            .sentinels
            .iter()
            .position(|&group| caps.get(group).is_some())?;
        Some((&self.branches[id], caps))
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }
}

/// Compiled matchers for one effective method.
#[derive(Debug, Default)]
pub(crate) struct MethodMatchers {
    pub primary: Option<Matcher>,
    /// Tried in order when the primary matcher fails.
    pub secondary: Vec<Matcher>,
    /// Patterns that match exactly one path.
    pub static_paths: Vec<String>,
}

/// Compile resolved, specificity-ordered routes for `method`.
///
/// Routes whose constraint fragments declare a capture group name already
/// used in the matcher under construction cannot share its expression; they
/// are deferred to the next matcher in the list.
pub(crate) fn compile(
    method: &str,
    routes: &[Route],
    config: &RouterConfig,
) -> Result<MethodMatchers, RouterError> {
    let static_paths = routes
        .iter()
        .filter(|r| r.hint.is_static())
        .map(|r| r.path.clone())
        .collect();

    let mut pending: Vec<&Route> = routes.iter().collect();
    let mut matchers = Vec::new();
    while !pending.is_empty() {
        let (matcher, deferred) = build_matcher(method, &pending, config)?;
        matchers.push(matcher);
        pending = deferred;
    }

    for matcher in &matchers {
        trace!(
            method,
            branches = matcher.branch_count(),
            expression = matcher.as_str(),
            "matcher expression"
        );
    }
    if matchers.len() > 1 {
        warn!(
            method,
            secondary = matchers.len() - 1,
            "routes deferred to secondary matchers"
        );
    }

    let mut matchers = matchers.into_iter();
    Ok(MethodMatchers {
        primary: matchers.next(),
        secondary: matchers.collect(),
        static_paths,
    })
}

fn build_matcher<'r>(
    method: &str,
    routes: &[&'r Route],
    config: &RouterConfig,
) -> Result<(Matcher, Vec<&'r Route>), RouterError> {
    let mut root = Node::default();
    let mut vars = 0;
    let mut entries: Vec<Entry> = Vec::new();
    let mut used_names: HashSet<String> = HashSet::new();
    let mut deferred = Vec::new();

    for &route in routes {
        let mut names = Vec::new();
        let tokens = tokenize(route, &mut names)?;
        if names.iter().any(|n| used_names.contains(n)) {
            deferred.push(route);
            continue;
        }
        used_names.extend(names);

        let mut params = Vec::new();
        let leaf = root.insert(&tokens, &mut vars, &mut params);

        let mut with_aliases = params.clone();
        for (name, var) in &params {
            if let Some(targets) = route.aliases.get(name) {
                with_aliases.extend(targets.iter().map(|t| (t.clone(), *var)));
            }
        }

        match *leaf {
            Some(existing) => {
                // Same expression path: both routes fire on the same inputs.
                let entry = &mut entries[existing];
                entry.handlers.extend(route.sorted_handlers());
                entry.handlers.sort_unstable();
                entry.handlers.dedup();
                for (name, var) in with_aliases {
                    if !entry.params.iter().any(|(n, _)| *n == name) {
                        entry.params.push((name, var));
                    }
                }
            }
            None => {
                *leaf = Some(entries.len());
                entries.push(Entry {
                    handlers: route.sorted_handlers(),
                    params: with_aliases,
                });
            }
        }
    }

    let mut state = EmitState {
        groups: 0,
        var_groups: vec![0; vars],
        sentinels: Vec::with_capacity(entries.len()),
    };
    let mut body = String::from("^");
    root.emit(&mut body, &mut state);

    let regex = RegexBuilder::new(&body)
        .size_limit(config.regex_size_limit)
        .build()
        .map_err(|err| RouterError::invalid(format!("{method} matcher"), err))?;

    let mut slots: Vec<Option<Entry>> = entries.into_iter().map(Some).collect();
    let mut sentinels = Vec::with_capacity(slots.len());
    let mut branches = Vec::with_capacity(slots.len());
    for (group, index) in state.sentinels {
        let Some(entry) = slots[index].take() else {
            continue;
        };
        let params: Vec<(usize, String)> = entry
            .params
            .into_iter()
            .map(|(name, var)| (state.var_groups[var], name))
            .collect();
        sentinels.push(group);
        branches.push(Branch {
            handlers: entry.handlers,
            params: (!params.is_empty()).then_some(params),
        });
    }

    debug!(
        method,
        routes = routes.len() - deferred.len(),
        branches = branches.len(),
        groups = state.groups,
        "compiled matcher"
    );

    Ok((
        Matcher {
            regex,
            sentinels,
            branches,
        },
        deferred,
    ))
}
