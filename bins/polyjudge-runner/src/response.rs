/// Response Parser - Raw Completion Payload → CandidateSolution
///
/// Payload layout (sections after the code are optional):
///
/// ```text
/// <source code>
/// ---===---
/// <one dependency per line>
/// ---===---
/// <compile flags, whitespace separated>
/// ```
///
/// Parsing never fails. A payload without delimiters is all code; missing
/// trailing sections become empty lists.

use lazy_static::lazy_static;
use polyjudge_common::types::CandidateSolution;
use regex::Regex;

pub const SECTION_DELIMITER: &str = "---===---";

lazy_static! {
    /// A whole line that opens or closes a fenced block, with optional language tag
    static ref FENCE_LINE: Regex = Regex::new(r"(?m)^[ \t]*```[\w+#.-]*[ \t]*(\r?\n|$)").unwrap();
}

/// Remove markdown fence lines, then any stray triple backticks
pub fn strip_code_fences(raw: &str) -> String {
    FENCE_LINE.replace_all(raw, "").replace("```", "")
}

pub fn parse(raw: &str) -> CandidateSolution {
    let cleaned = strip_code_fences(raw);
    let mut sections = cleaned.split(SECTION_DELIMITER);

    let code = sections.next().unwrap_or_default().to_string();

    let dependencies = sections
        .next()
        .map(|block| {
            block
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let compile_flags = sections
        .next()
        .map(|block| block.split_whitespace().map(String::from).collect())
        .unwrap_or_default();

    CandidateSolution {
        code,
        dependencies,
        compile_flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_only() {
        let parsed = parse("print('hi')\n");
        assert_eq!(parsed.code, "print('hi')\n");
        assert!(parsed.dependencies.is_empty());
        assert!(parsed.compile_flags.is_empty());
    }

    #[test]
    fn test_code_and_dependencies() {
        let parsed = parse("import requests\n---===---\nrequests\n\nnumpy==1.26\n");
        assert_eq!(parsed.code, "import requests\n");
        assert_eq!(parsed.dependencies, vec!["requests", "numpy==1.26"]);
        assert!(parsed.compile_flags.is_empty());
    }

    #[test]
    fn test_all_three_sections() {
        let raw = "int main(void) { return 0; }\n---===---\n---===---\n-O2  -lm\n-std=c11\n";
        let parsed = parse(raw);
        assert_eq!(parsed.code, "int main(void) { return 0; }\n");
        assert!(parsed.dependencies.is_empty());
        assert_eq!(parsed.compile_flags, vec!["-O2", "-lm", "-std=c11"]);
    }

    #[test]
    fn test_extra_sections_ignored() {
        let parsed = parse("code---===---dep---===----O2---===---junk");
        assert_eq!(parsed.code, "code");
        assert_eq!(parsed.dependencies, vec!["dep"]);
        assert_eq!(parsed.compile_flags, vec!["-O2"]);
    }

    #[test]
    fn test_fences_stripped() {
        let raw = "```python\nprint(1)\n```\n---===---\n```\nrequests\n```";
        let parsed = parse(raw);
        assert_eq!(parsed.code, "print(1)\n");
        assert_eq!(parsed.dependencies, vec!["requests"]);
    }

    #[test]
    fn test_inline_backticks_removed() {
        assert_eq!(strip_code_fences("let x = 1; ```"), "let x = 1; ");
    }

    #[test]
    fn test_first_segment_is_code_for_any_delimiter_count() {
        for raw in ["a", "a---===---b", "a---===---b---===---c"] {
            assert_eq!(parse(raw).code, "a");
        }
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(parse(""), CandidateSolution::default());
    }
}
