//! Route relation resolution.
//!
//! Before compilation, the routes of one effective method are sorted by
//! specificity and compared pairwise. A route that generalizes a later one
//! hands its handlers down as absorbed middleware and retrofits its
//! parameter names onto it; routes that overlap without a clear ordering are
//! rejected.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use routekit_core::RouterError;

use crate::pattern::{Component, Hint, LABEL_PATTERN, NamedParam, Shape};

/// A registered route and the state the resolver accumulates for it.
///
/// Handlers are indexes into the router's handler arena. The index is the
/// global registration order, so sorting by it restores insertion order.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    pub method: String,
    /// The pattern as registered.
    pub path: String,
    pub hint: Hint,
    pub handlers: Vec<usize>,
    /// Handlers absorbed from less specific routes.
    pub middleware: Vec<usize>,
    /// Parameter name to the extra names that receive the same value.
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl Route {
    pub fn new(method: &str, path: &str, hint: Hint, handler: usize) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            hint,
            handlers: vec![handler],
            middleware: Vec::new(),
            aliases: BTreeMap::new(),
        }
    }

    /// Own and absorbed handlers, in registration order.
    pub fn sorted_handlers(&self) -> Vec<usize> {
        let mut all: Vec<usize> = self
            .middleware
            .iter()
            .chain(&self.handlers)
            .copied()
            .collect();
        all.sort_unstable();
        all.dedup();
        all
    }
}

/// How one route relates to a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Relation {
    /// No path matches both.
    Disjoint,
    /// The first route matches every path the second one does.
    Subsumes,
    /// The routes overlap but neither is more specific.
    Ambiguous,
}

/// Order routes so that, for any pair, the more general one comes first
/// whenever one generalizes the other.
pub(crate) fn specificity(a: &Route, b: &Route) -> Ordering {
    a.hint
        .len
        .cmp(&b.hint.len)
        .then_with(|| compare_param_indexes(&a.hint.param_indexes, &b.hint.param_indexes))
        .then_with(|| b.hint.ends_with_wildcard.cmp(&a.hint.ends_with_wildcard))
}

fn compare_param_indexes(a: &[usize], b: &[usize]) -> Ordering {
    for i in 0..=a.len().min(b.len()) {
        match (a.get(i), b.get(i)) {
            (x, y) if x == y => {}
            (None, _) => return Ordering::Less,
            (_, None) => return Ordering::Greater,
            (Some(x), Some(y)) => return x.cmp(y),
        }
    }
    Ordering::Equal
}

/// Classify how `a` relates to `b`, where `a` sorts before `b`.
pub(crate) fn compare(a: &Route, b: &Route) -> Relation {
    if a.path == "*" {
        return Relation::Subsumes;
    }

    let a_shapes = &a.hint.shapes;
    let b_shapes = &b.hint.shapes;
    let len = a_shapes.len();

    let mut i = 0;
    while i < len {
        if b_shapes.get(i) != Some(&a_shapes[i]) {
            if a_shapes[i] == Shape::Any {
                break;
            }
            return Relation::Disjoint;
        }
        i += 1;
    }

    // `a` generalized at position `i`; the rest decides
    for k in i..len {
        match (&a_shapes[k], b_shapes.get(k)) {
            (Shape::Any, _) => {}
            (x, Some(y)) if x == y => {}
            (Shape::Literal(_), Some(Shape::Literal(_))) => return Relation::Disjoint,
            _ => return Relation::Ambiguous,
        }
    }

    if len == b_shapes.len() || a.hint.ends_with_wildcard {
        Relation::Subsumes
    } else {
        Relation::Disjoint
    }
}

/// Sort `routes` by specificity and resolve every pairwise relation.
pub(crate) fn resolve(routes: &mut [Route]) -> Result<(), RouterError> {
    routes.sort_by(specificity);

    for i in 0..routes.len() {
        for j in i + 1..routes.len() {
            let (head, tail) = routes.split_at_mut(j);
            let general = &head[i];
            let specific = &mut tail[0];
            match compare(general, specific) {
                Relation::Subsumes => absorb(general, specific),
                Relation::Ambiguous => return Err(RouterError::unsupported(&general.path)),
                Relation::Disjoint => {}
            }
        }
    }

    routes.iter().try_for_each(verify_params)
}

/// Fold `general` into `specific`: its handlers become middleware and its
/// parameter names are bound on `specific` too.
fn absorb(general: &Route, specific: &mut Route) {
    for param in &general.hint.named_params {
        let Some(component) = specific.hint.components.get_mut(param.index) else {
            continue;
        };
        match component {
            Component::Param { name, .. } if *name == param.name => {}
            Component::Param { name, .. } => {
                let targets = specific.aliases.entry(name.clone()).or_default();
                if !targets.contains(&param.name) {
                    targets.push(param.name.clone());
                }
            }
            Component::Literal(text) => {
                let constraint = regex::escape(&text[1..]);
                *component = Component::Param {
                    name: param.name.clone(),
                    constraint: constraint.clone(),
                };
                specific.hint.named_params.push(NamedParam {
                    index: param.index,
                    name: param.name.clone(),
                    constraint,
                });
            }
            Component::Wildcard => {
                *component = Component::Param {
                    name: param.name.clone(),
                    constraint: LABEL_PATTERN.to_string(),
                };
                specific.hint.named_params.push(NamedParam {
                    index: param.index,
                    name: param.name.clone(),
                    constraint: LABEL_PATTERN.to_string(),
                });
            }
        }
    }

    specific.middleware.extend_from_slice(&general.handlers);
}

/// Reject routes binding one name, aliases included, to two positions.
fn verify_params(route: &Route) -> Result<(), RouterError> {
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for param in &route.hint.named_params {
        match positions.insert(&param.name, param.index) {
            Some(previous) if previous != param.index => {
                return Err(RouterError::duplicate_param(&param.name, &route.path));
            }
            _ => {}
        }
    }

    for (from, targets) in &route.aliases {
        let Some(&index) = positions.get(from.as_str()) else {
            continue;
        };
        for target in targets {
            match positions.insert(target, index) {
                Some(previous) if previous != index => {
                    return Err(RouterError::duplicate_param(target, &route.path));
                }
                _ => {}
            }
        }
    }

    Ok(())
}
