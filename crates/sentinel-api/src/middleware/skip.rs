//! 건너뛸 경로 규칙.

use std::collections::HashSet;

/// 미들웨어를 적용하지 않을 경로 집합.
///
/// 정확히 일치하는 경로와 접두사 두 종류를 지원합니다.
#[derive(Debug, Clone, Default)]
pub struct SkipRules {
    paths: HashSet<String>,
    prefixes: Vec<String>,
}

impl SkipRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// 정확히 일치해야 하는 경로를 추가합니다.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.insert(path.into());
        self
    }

    /// 접두사를 추가합니다.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() {
            self.prefixes.push(prefix);
        }
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        self.paths.contains(path) || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.prefixes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_prefix_matching() {
        let rules = SkipRules::new().path("/health").prefix("/public/");

        assert!(rules.matches("/health"));
        assert!(!rules.matches("/health/deep"));
        assert!(rules.matches("/public/logo.png"));
        assert!(!rules.matches("/publicity"));
        assert!(!rules.matches("/api/v1/posts"));
    }

    #[test]
    fn test_empty_prefix_is_ignored() {
        let rules = SkipRules::new().prefix("");
        assert!(rules.is_empty());
        assert!(!rules.matches("/anything"));
    }
}
