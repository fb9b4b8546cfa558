//! Heuristic task estimation from a prompt.
//!
//! Callers that do not know a task's complexity can ask for an estimate. The
//! score is a weighted keyword count clamped to `0..=10`:
//!
//! | score | complexity |
//! |-------|------------|
//! | 8+    | epic       |
//! | 6-7   | complex    |
//! | 4-5   | moderate   |
//! | 2-3   | simple     |
//! | 0-1   | trivial    |
//!
//! Patterns are word prefixes; `a.*b` means a word starting with `a` followed
//! later by a word starting with `b`.

use super::request::{DEFAULT_CONTEXT_SIZE, TaskComplexity};

const EPIC_PATTERNS: &[&str] = &[
    "architecture",
    "system",
    "migration",
    "refactor.*entire",
    "redesign",
    "restructure",
    "complete.*rewrite",
    "platform",
    "infrastructure",
    "enterprise",
    "scalability",
    "performance.*optimization",
];

const COMPLEX_PATTERNS: &[&str] = &[
    "feature",
    "module",
    "integration",
    "api",
    "database",
    "authentication",
    "authorization",
    "security",
    "complex",
    "multiple.*files",
    "cross-cutting",
    "dependency.*injection",
    "microservices",
    "distributed",
    "concurrent",
    "async.*await",
];

const MODERATE_PATTERNS: &[&str] = &[
    "test",
    "documentation",
    "config",
    "settings",
    "validation",
    "error.*handling",
    "logging",
    "monitoring",
    "deployment",
    "ci.*cd",
    "docker",
    "kubernetes",
];

const SIMPLE_PATTERNS: &[&str] = &[
    "fix",
    "bug",
    "typo",
    "comment",
    "readme",
    "doc",
    "update",
    "change",
    "modify",
    "add.*field",
    "remove.*field",
];

const HEAVY_TECH: &[&str] = &[
    "kubernetes",
    "docker.*compose",
    "microservices",
    "graphql",
    "blockchain",
    "machine.*learning",
    "ai",
    "neural",
    "tensorflow",
    "pytorch",
    "cuda",
    "gpu",
    "distributed.*computing",
];

const MEDIUM_TECH: &[&str] = &[
    "react",
    "vue",
    "angular",
    "typescript",
    "webpack",
    "database",
    "sql",
    "nosql",
    "redis",
    "mongodb",
    "authentication",
    "oauth",
    "jwt",
    "encryption",
];

const BROAD_SCOPE: &[&str] = &[
    "all.*files",
    "entire.*project",
    "whole.*system",
    "every.*component",
    "all.*modules",
    "system.*wide",
    "across.*application",
    "end.*to.*end",
];

const MEDIUM_SCOPE: &[&str] = &[
    "multiple.*files",
    "several.*components",
    "various.*modules",
    "different.*parts",
    "several.*areas",
];

const APPROVAL_PATTERNS: &[&str] = &[
    "approval",
    "review",
    "architectural",
    "design.*review",
    "stakeholder",
    "business.*requirements",
    "critical",
    "high.*impact",
    "breaking.*change",
    "migration",
    "delete.*data",
    "drop.*table",
    "remove.*feature",
    "major.*version",
    "api.*change",
];

/// Estimated routing attributes for a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskEstimate {
    pub complexity: TaskComplexity,
    pub needs_plan_approval: bool,
    pub estimated_context_size: u64,
}

/// Estimate complexity, approval need, and context size from a prompt.
pub fn estimate_task(prompt: &str) -> TaskEstimate {
    let words = tokenize(prompt);
    TaskEstimate {
        complexity: complexity_from_score(complexity_score(&words)),
        needs_plan_approval: any_match(&words, APPROVAL_PATTERNS),
        estimated_context_size: estimate_context_size(&words),
    }
}

/// Estimate only the complexity of a prompt.
pub fn estimate_complexity(prompt: &str) -> TaskComplexity {
    complexity_from_score(complexity_score(&tokenize(prompt)))
}

fn complexity_from_score(score: f32) -> TaskComplexity {
    if score >= 8.0 {
        TaskComplexity::Epic
    } else if score >= 6.0 {
        TaskComplexity::Complex
    } else if score >= 4.0 {
        TaskComplexity::Moderate
    } else if score >= 2.0 {
        TaskComplexity::Simple
    } else {
        TaskComplexity::Trivial
    }
}

fn complexity_score(words: &[String]) -> f32 {
    let score = 3.0 * count_matches(words, EPIC_PATTERNS)
        + 2.0 * count_matches(words, COMPLEX_PATTERNS)
        + count_matches(words, MODERATE_PATTERNS)
        - 0.5 * count_matches(words, SIMPLE_PATTERNS)
        + 2.0 * count_matches(words, HEAVY_TECH)
        + count_matches(words, MEDIUM_TECH)
        + 2.0 * count_matches(words, BROAD_SCOPE)
        + count_matches(words, MEDIUM_SCOPE);
    score.clamp(0.0, 10.0)
}

fn estimate_context_size(words: &[String]) -> u64 {
    if any_match(words, &["architecture", "system", "refactor", "migration"]) {
        50_000
    } else if any_match(words, &["feature", "module", "integration", "multiple.*files"]) {
        10_000
    } else if any_match(words, &["fix", "typo", "single.*file", "one.*file"]) {
        500
    } else {
        DEFAULT_CONTEXT_SIZE
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn pattern_matches(words: &[String], pattern: &str) -> bool {
    let mut remaining = words.iter();
    pattern
        .split(".*")
        .all(|part| remaining.any(|word| word.starts_with(part)))
}

fn count_matches(words: &[String], patterns: &[&str]) -> f32 {
    patterns.iter().filter(|p| pattern_matches(words, p)).count() as f32
}

fn any_match(words: &[String], patterns: &[&str]) -> bool {
    patterns.iter().any(|p| pattern_matches(words, p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_prompt() {
        let estimate = estimate_task("Fix typo in README");
        assert_eq!(estimate.complexity, TaskComplexity::Trivial);
        assert!(!estimate.needs_plan_approval);
        assert_eq!(estimate.estimated_context_size, 500);
    }

    #[test]
    fn test_epic_prompt() {
        let estimate =
            estimate_task("Redesign the system architecture and plan the database migration");
        assert_eq!(estimate.complexity, TaskComplexity::Epic);
        assert!(estimate.needs_plan_approval);
        assert_eq!(estimate.estimated_context_size, 50_000);
    }

    #[test]
    fn test_moderate_feature() {
        // feature(2) + test(1) + validation(1) = 4
        let estimate = estimate_task("Add input validation feature with a test");
        assert_eq!(estimate.complexity, TaskComplexity::Moderate);
        assert_eq!(estimate.estimated_context_size, 10_000);
    }

    #[test]
    fn test_sequence_patterns() {
        let words = tokenize("Handle errors: error handling everywhere");
        assert!(pattern_matches(&words, "error.*handling"));
        assert!(!pattern_matches(&tokenize("handling error"), "error.*handling"));
    }

    #[test]
    fn test_short_patterns_match_word_prefixes_only() {
        // "ai" must not fire inside "maintain"
        assert_eq!(estimate_complexity("maintain"), TaskComplexity::Trivial);
        assert!(pattern_matches(&tokenize("use ai models"), "ai"));
    }
}
