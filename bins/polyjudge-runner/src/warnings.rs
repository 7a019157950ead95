// Compiler diagnostic parsing
//
// gcc/clang and zig share `file:line:col: warning: message`;
// rustc/cargo print `warning: message` with the location on a later line.

use lazy_static::lazy_static;
use polyjudge_common::types::Language;
use regex::Regex;

lazy_static! {
    static ref LOCATED_WARNING: Regex = Regex::new(r".*:\d+:\d+:\s+warning:\s+(.*)").unwrap();
    static ref RUSTC_WARNING: Regex = Regex::new(r"warning:\s+(.*)").unwrap();
}

fn rule(language: Language) -> Option<&'static Regex> {
    match language {
        Language::C | Language::Zig => Some(&*LOCATED_WARNING),
        Language::Rust => Some(&*RUSTC_WARNING),
        Language::Python | Language::TypeScript => None,
    }
}

/// Collect warning messages from toolchain stderr; non-matching lines are ignored
pub fn extract(language: Language, stderr: &str) -> Vec<String> {
    let Some(rule) = rule(language) else {
        return Vec::new();
    };

    stderr
        .lines()
        .filter_map(|line| rule.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clang_warning() {
        let stderr = "foo.c:12:5: warning: unused variable 'x' [-Wunused-variable]\n    int x;\n        ^\n1 warning generated.\n";
        assert_eq!(
            extract(Language::C, stderr),
            vec!["unused variable 'x' [-Wunused-variable]"]
        );
    }

    #[test]
    fn test_clang_warning_plain_message() {
        assert_eq!(
            extract(Language::C, "foo.c:12:5: warning: unused variable 'x'"),
            vec!["unused variable 'x'"]
        );
    }

    #[test]
    fn test_clang_errors_ignored() {
        let stderr = "foo.c:3:1: error: expected ';' after expression\n";
        assert!(extract(Language::C, stderr).is_empty());
    }

    #[test]
    fn test_zig_shares_located_rule() {
        let stderr = "solution.zig:4:9: warning: unused local constant\n";
        assert_eq!(extract(Language::Zig, stderr), vec!["unused local constant"]);
    }

    #[test]
    fn test_rustc_warning() {
        let stderr = "warning: unused variable: `x`\n --> src/main.rs:2:9\n  |\n2 |     let x = 5;\n";
        assert_eq!(extract(Language::Rust, stderr), vec!["unused variable: `x`"]);
    }

    #[test]
    fn test_multiple_warnings_in_order() {
        let stderr = "a.c:1:1: warning: first\nnoise\na.c:2:2: warning: second\n";
        assert_eq!(extract(Language::C, stderr), vec!["first", "second"]);
    }

    #[test]
    fn test_interpreted_languages_yield_nothing() {
        let stderr = "warning: something\nfoo.py:1:1: warning: other\n";
        assert!(extract(Language::Python, stderr).is_empty());
        assert!(extract(Language::TypeScript, stderr).is_empty());
    }

    #[test]
    fn test_empty_stderr() {
        assert!(extract(Language::Rust, "").is_empty());
    }
}
