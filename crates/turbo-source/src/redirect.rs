//! Route redirections applied before handler matching.

use std::sync::Arc;

use tracing::debug;

use crate::link;
use crate::pattern::{get_match, Params, PatternEntry, PatternError};

/// Rewrite function of a redirection.
///
/// Returning an empty string withdraws the route instead of rewriting it.
pub type RewriteFn = Arc<dyn Fn(&Params) -> String + Send + Sync>;

/// A redirection rule.
pub type Redirection = PatternEntry<RewriteFn>;

/// Result of applying the redirection rules to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// No rule matched; the route is used as is.
    Unchanged,
    /// A rule rewrote the route.
    Rewritten(String),
    /// A reverse rule matched; the route has no resolvable target.
    Removed,
}

impl RedirectOutcome {
    /// The route handlers should be matched against, if any.
    pub fn resolve(self, route: &str) -> Option<String> {
        match self {
            Self::Unchanged => Some(route.to_string()),
            Self::Rewritten(target) => Some(target),
            Self::Removed => None,
        }
    }
}

/// Create a redirection from a closure.
pub fn redirection<F>(
    name: impl Into<String>,
    priority: i32,
    pattern: &str,
    rewrite: F,
) -> Result<Redirection, PatternError>
where
    F: Fn(&Params) -> String + Send + Sync + 'static,
{
    PatternEntry::new(name, priority, pattern, Arc::new(rewrite) as RewriteFn)
}

/// Apply at most one redirection to a route.
pub fn redirect(route: &str, link: &str, redirections: &[Redirection]) -> RedirectOutcome {
    let Some(matched) = get_match(route, link, redirections) else {
        return RedirectOutcome::Unchanged;
    };

    let target = (matched.entry.func)(&matched.params);
    if target.is_empty() {
        debug!(route, redirection = %matched.entry.name, "route removed by reverse redirection");
        return RedirectOutcome::Removed;
    }

    let target = link::parse(&target).route;
    debug!(route, %target, redirection = %matched.entry.name, "route redirected");
    RedirectOutcome::Rewritten(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subdirectory_rules() -> Vec<Redirection> {
        vec![
            redirection("subdirectory", 10, "/blog/:subpath*", |params| {
                match params.get("subpath") {
                    Some(subpath) => format!("/{}/", subpath),
                    None => "/".to_string(),
                }
            })
            .unwrap(),
            redirection("subdirectory (reverse)", 10, "/:subpath*", |_| String::new()).unwrap(),
        ]
    }

    #[test]
    fn test_redirect_unchanged_without_rules() {
        assert_eq!(redirect("/about/", "/about/", &[]), RedirectOutcome::Unchanged);
    }

    #[test]
    fn test_redirect_rewrites_with_params() {
        let rules = subdirectory_rules();

        assert_eq!(
            redirect("/blog/hello/", "/blog/hello/", &rules),
            RedirectOutcome::Rewritten("/hello/".to_string())
        );
        assert_eq!(
            redirect("/blog/", "/blog/", &rules),
            RedirectOutcome::Rewritten("/".to_string())
        );
    }

    #[test]
    fn test_redirect_reverse_rule_removes() {
        let rules = subdirectory_rules();

        assert_eq!(redirect("/hello/", "/hello/", &rules), RedirectOutcome::Removed);
        assert_eq!(redirect("/", "/", &rules), RedirectOutcome::Removed);
    }

    #[test]
    fn test_redirect_normalizes_target() {
        let rules = vec![redirection("homepage", 10, "/", |_| "/about-us".to_string()).unwrap()];

        assert_eq!(
            redirect("/", "/", &rules),
            RedirectOutcome::Rewritten("/about-us/".to_string())
        );
    }

    #[test]
    fn test_outcome_resolve() {
        assert_eq!(RedirectOutcome::Unchanged.resolve("/a/"), Some("/a/".to_string()));
        assert_eq!(
            RedirectOutcome::Rewritten("/b/".to_string()).resolve("/a/"),
            Some("/b/".to_string())
        );
        assert_eq!(RedirectOutcome::Removed.resolve("/a/"), None);
    }
}
