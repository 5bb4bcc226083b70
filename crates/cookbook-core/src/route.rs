//! Route configuration and path matching.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Extracted route parameters (e.g., `:slug` from `/recipes/:slug`).
pub type RouteParams = HashMap<String, String>;

/// Configuration for a single route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route pattern (e.g., "/recipes/:slug").
    pub pattern: String,
    /// Handler name, used in logs.
    pub handler: String,
    /// HTTP methods this route accepts.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

impl RouteConfig {
    /// Create a new route configuration.
    pub fn new(pattern: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            handler: handler.into(),
            methods: default_methods(),
        }
    }

    /// Set allowed HTTP methods.
    pub fn with_methods(mut self, methods: Vec<&str>) -> Self {
        self.methods = methods.into_iter().map(String::from).collect();
        self
    }

    /// Whether the route accepts a method.
    pub fn accepts(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }

    /// Match a request path against the pattern.
    ///
    /// Segments starting with `:` capture one non-empty path segment,
    /// percent-decoded. A single trailing slash on the path is ignored.
    /// Query strings must be stripped by the caller. A captured segment that
    /// does not decode to UTF-8 does not match.
    pub fn match_path(&self, path: &str) -> Option<RouteParams> {
        let path = if path.len() > 1 {
            path.strip_suffix('/').unwrap_or(path)
        } else {
            path
        };

        let pattern_segments: Vec<&str> = self.pattern.split('/').collect();
        let path_segments: Vec<&str> = path.split('/').collect();
        if pattern_segments.len() != path_segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (pattern, actual) in pattern_segments.iter().zip(path_segments.iter()) {
            match pattern.strip_prefix(':') {
                Some(name) => {
                    if actual.is_empty() {
                        return None;
                    }
                    let value = urlencoding::decode(actual).ok()?;
                    params.insert(name.to_string(), value.into_owned());
                }
                None if pattern == actual => {}
                None => return None,
            }
        }
        Some(params)
    }

    /// Build a concrete path by substituting parameters into the pattern.
    ///
    /// Returns `None` when a parameter named in the pattern is missing.
    pub fn build_path(&self, params: &RouteParams) -> Option<String> {
        let segments: Option<Vec<String>> = self
            .pattern
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => params.get(name).cloned(),
                None => Some(segment.to_string()),
            })
            .collect();
        segments.map(|s| s.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_route() -> RouteConfig {
        RouteConfig::new("/recipes/:slug", "recipe_details")
    }

    // === Matching Tests ===

    #[test]
    fn test_match_path_extracts_param() {
        let params = recipe_route().match_path("/recipes/pancakes").unwrap();
        assert_eq!(params.get("slug").map(String::as_str), Some("pancakes"));
    }

    #[test]
    fn test_match_path_trailing_slash() {
        let params = recipe_route().match_path("/recipes/pancakes/").unwrap();
        assert_eq!(params.get("slug").map(String::as_str), Some("pancakes"));
    }

    #[test]
    fn test_match_path_rejects_other_routes() {
        let route = recipe_route();
        assert!(route.match_path("/recipes").is_none());
        assert!(route.match_path("/recipes/").is_none());
        assert!(route.match_path("/blog/pancakes").is_none());
        assert!(route.match_path("/recipes/pancakes/extra").is_none());
    }

    #[test]
    fn test_match_path_decodes_param() {
        let route = recipe_route();

        let params = route.match_path("/recipes/cr%C3%AApes").unwrap();
        assert_eq!(params.get("slug").map(String::as_str), Some("crêpes"));

        let params = route.match_path("/recipes/mac%20and%20cheese").unwrap();
        assert_eq!(params.get("slug").map(String::as_str), Some("mac and cheese"));

        // An encoded slash stays inside the segment.
        let params = route.match_path("/recipes/a%2Fb").unwrap();
        assert_eq!(params.get("slug").map(String::as_str), Some("a/b"));
    }

    #[test]
    fn test_match_path_rejects_invalid_utf8() {
        assert!(recipe_route().match_path("/recipes/%FF").is_none());
    }

    // === Building Tests ===

    #[test]
    fn test_build_path() {
        let mut params = RouteParams::new();
        params.insert("slug".to_string(), "waffles".to_string());

        assert_eq!(
            recipe_route().build_path(&params),
            Some("/recipes/waffles".to_string())
        );
    }

    #[test]
    fn test_build_path_missing_param() {
        assert_eq!(recipe_route().build_path(&RouteParams::new()), None);
    }

    #[test]
    fn test_accepts_method() {
        let route = recipe_route().with_methods(vec!["GET", "HEAD"]);
        assert!(route.accepts("get"));
        assert!(route.accepts("HEAD"));
        assert!(!route.accepts("POST"));
    }
}
