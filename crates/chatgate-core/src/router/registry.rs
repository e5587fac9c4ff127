//! Static route table consulted by the navigation guard.
//!
//! Patterns are `/`-rooted and made of:
//! - static segments (`/chats`)
//! - parameters matching exactly one segment (`/chats/:id`)
//! - a trailing `*` matching the rest of the path, including nothing

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// What a route needs from the session before it can be entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Requirement {
    #[default]
    Public,
    RequiresAuth,
    RequiresGuest,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Requirement::Public => "public",
            Requirement::RequiresAuth => "requires-auth",
            Requirement::RequiresGuest => "requires-guest",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub path: String,
    #[serde(default)]
    pub requirement: Requirement,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>, requirement: Requirement) -> Self {
        Self {
            path: path.into(),
            requirement,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("Route pattern '{0}' is registered more than once")]
    DuplicatePattern(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Rest,
}

#[derive(Debug, Clone)]
struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason,
        };

        if !raw.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let parts: Vec<&str> = split_segments(raw).collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = if *part == "*" {
                if i + 1 != parts.len() {
                    return Err(invalid("'*' is only allowed as the last segment"));
                }
                Segment::Rest
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("parameter name is empty"));
                }
                Segment::Param(name.to_string())
            } else {
                Segment::Static((*part).to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Shape of the pattern with parameter names erased.
    /// `/chats/:id` and `/chats/:cid` share a shape and would be ambiguous.
    fn shape(&self) -> String {
        let mut shape = String::new();
        for segment in &self.segments {
            shape.push('/');
            match segment {
                Segment::Static(s) => shape.push_str(s),
                Segment::Param(_) => shape.push(':'),
                Segment::Rest => shape.push('*'),
            }
        }
        shape
    }

    fn matches(&self, parts: &[&str]) -> bool {
        let mut parts = parts.iter();
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Static(expected) => match parts.next() {
                    Some(part) if part == expected => {}
                    _ => return false,
                },
                Segment::Param(_) => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }

    /// Ranking among overlapping matches: static segments first, then parameters.
    fn specificity(&self) -> (usize, usize) {
        self.segments.iter().fold((0, 0), |(s, p), segment| match segment {
            Segment::Static(_) => (s + 1, p),
            Segment::Param(_) => (s, p + 1),
            Segment::Rest => (s, p),
        })
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Reduce a location to the path the route table is keyed on.
///
/// Hash-history locations (`/#/chats`) route on their fragment. Otherwise the
/// query string and fragment are dropped.
fn route_path(location: &str) -> &str {
    let location = location
        .strip_prefix("/#")
        .or_else(|| location.strip_prefix('#'))
        .unwrap_or(location);
    let end = location.find(['?', '#']).unwrap_or(location.len());
    &location[..end]
}

/// Canonical form of a location as the route table sees it: hash prefix,
/// query, fragment, empty and trailing segments removed. `/#/chats/3/?x=1`
/// becomes `/chats/3`.
pub fn canonical_path(location: &str) -> String {
    let mut path = String::from("/");
    for (i, segment) in split_segments(route_path(location)).enumerate() {
        if i > 0 {
            path.push('/');
        }
        path.push_str(segment);
    }
    path
}

/// Immutable table of routes, built once at startup
#[derive(Debug, Clone)]
pub struct RouteRegistry {
    routes: Vec<(RoutePattern, Requirement)>,
}

impl RouteRegistry {
    pub fn new(descriptors: Vec<RouteDescriptor>) -> Result<Self, RouteError> {
        let mut routes: Vec<(RoutePattern, Requirement)> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let pattern = RoutePattern::parse(&descriptor.path)?;
            let shape = pattern.shape();
            if routes.iter().any(|(existing, _)| existing.shape() == shape) {
                return Err(RouteError::DuplicatePattern(descriptor.path));
            }
            routes.push((pattern, descriptor.requirement));
        }
        Ok(Self { routes })
    }

    /// Requirement of the most specific route matching `path`, if any
    pub fn lookup(&self, path: &str) -> Option<Requirement> {
        let parts: Vec<&str> = split_segments(route_path(path)).collect();
        let mut best: Option<&(RoutePattern, Requirement)> = None;
        for route in &self.routes {
            if !route.0.matches(&parts) {
                continue;
            }
            // Strictly greater keeps the earliest declaration on ties.
            if best.map_or(true, |b| route.0.specificity() > b.0.specificity()) {
                best = Some(route);
            }
        }
        best.map(|(pattern, requirement)| {
            debug!(path, pattern = %pattern.raw, %requirement, "Route matched");
            *requirement
        })
    }

    /// Requirement for `path`, treating unregistered paths as public
    pub fn requirement_for(&self, path: &str) -> Requirement {
        self.lookup(path).unwrap_or_else(|| {
            debug!(path, "Unregistered route, treating as public");
            Requirement::Public
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
