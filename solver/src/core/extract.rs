//! Code extraction from free-form model output.
//!
//! Models wrap code in markdown fences, sometimes several, sometimes with prose
//! around them. [`parse_fences`] is a small state machine over the text:
//!
//! - `Outside`: scanning prose for an opening fence.
//! - `LangTag`: reading the rest of the opening line, which is either a
//!   language tag, empty, or already code.
//! - `Inside`: collecting the body until the closing fence (or end of input).
//!
//! [`extract_code`] then applies the selection rules on top of the blocks.

const FENCE: &str = "```";
const MAX_LANG_TAG_LEN: usize = 20;

/// Markers that identify a block as the actual solution.
pub const SOLUTION_MARKERS: &[&str] = &["class Solution", "public"];

/// A fenced block found in model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    pub lang: Option<String>,
    /// Block body, trimmed.
    pub body: String,
    /// False when the input ended before a closing fence.
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    LangTag,
    Inside,
}

/// Split `text` into its fenced blocks, in order of appearance.
pub fn parse_fences(text: &str) -> Vec<FencedBlock> {
    let mut blocks = Vec::new();
    let mut state = State::Outside;
    let mut rest = text;
    let mut lang: Option<String> = None;

    loop {
        match state {
            State::Outside => match rest.find(FENCE) {
                Some(idx) => {
                    rest = &rest[idx + FENCE.len()..];
                    state = State::LangTag;
                }
                None => break,
            },
            State::LangTag => {
                let line_end = rest.find('\n').unwrap_or(rest.len());
                let line = &rest[..line_end];
                if let Some(close) = line.find(FENCE) {
                    // Inline fence: ```code``` on a single line.
                    blocks.push(FencedBlock {
                        lang: None,
                        body: line[..close].trim().to_string(),
                        closed: true,
                    });
                    rest = &rest[close + FENCE.len()..];
                    state = State::Outside;
                    continue;
                }
                let tag = line.trim();
                if is_lang_tag(tag) {
                    lang = (!tag.is_empty()).then(|| tag.to_string());
                    rest = &rest[line_end..];
                } else {
                    lang = None;
                }
                state = State::Inside;
            }
            State::Inside => match rest.find(FENCE) {
                Some(idx) => {
                    blocks.push(FencedBlock {
                        lang: lang.take(),
                        body: rest[..idx].trim().to_string(),
                        closed: true,
                    });
                    rest = &rest[idx + FENCE.len()..];
                    state = State::Outside;
                }
                None => {
                    blocks.push(FencedBlock {
                        lang: lang.take(),
                        body: rest.trim().to_string(),
                        closed: false,
                    });
                    break;
                }
            },
        }
    }

    blocks
}

fn is_lang_tag(tag: &str) -> bool {
    tag.len() <= MAX_LANG_TAG_LEN
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '-' | '_' | '.'))
}

/// True if `body` looks like the solution rather than an example or usage snippet.
pub fn has_solution_marker(body: &str) -> bool {
    SOLUTION_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Extract the code to submit from model output.
///
/// - No fences: the trimmed text is returned unchanged.
/// - One non-empty block: its body.
/// - Several: the last block containing a solution marker, else the last
///   non-empty block.
///
/// Returns an empty string when every block is empty; callers treat that as a
/// generation failure.
pub fn extract_code(text: &str) -> String {
    let trimmed = text.trim();
    let blocks = parse_fences(trimmed);
    if blocks.is_empty() {
        return trimmed.to_string();
    }

    let candidates: Vec<&FencedBlock> = blocks.iter().filter(|b| !b.body.is_empty()).collect();
    match candidates.as_slice() {
        [] => String::new(),
        [only] => only.body.clone(),
        many => many
            .iter()
            .rev()
            .find(|block| has_solution_marker(&block.body))
            .or(many.last())
            .map(|block| block.body.clone())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_fence_with_language_tag() {
        let out = extract_code("```java\npublic class Solution {}\n```");
        assert_eq!(out, "public class Solution {}");
    }

    #[test]
    fn clean_input_is_returned_trimmed() {
        let code = "class Solution {\n    int f() { return 1; }\n}";
        assert_eq!(extract_code(&format!("\n\n{code}  \n")), code);
    }

    #[test]
    fn extraction_is_idempotent_on_clean_input() {
        let inputs = [
            "class Solution {}",
            "  public int x;  ",
            "",
            "line one\nline two",
        ];
        for input in inputs {
            let once = extract_code(input);
            assert_eq!(extract_code(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn picks_last_block_with_solution_marker() {
        let text = "Approach:\n```java\nclass Solution { int a; }\n```\n\
                    Usage:\n```java\nSolution s = new Solution();\n```\n\
                    Final:\n```java\nclass Solution { int b; }\n```\nDone.";
        assert_eq!(extract_code(text), "class Solution { int b; }");
    }

    #[test]
    fn skips_trailing_block_without_marker() {
        let text = "```java\nclass Solution { int a; }\n```\n```\nInput: [1,2]\n```";
        assert_eq!(extract_code(text), "class Solution { int a; }");
    }

    #[test]
    fn falls_back_to_last_block_without_markers() {
        let text = "```\nfoo\n```\n```\nbar\n```";
        assert_eq!(extract_code(text), "bar");
    }

    #[test]
    fn empty_fence_yields_empty_code() {
        assert_eq!(extract_code("```java\n```"), "");
        assert_eq!(extract_code("``````"), "");
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let blocks = parse_fences("```python\nclass Solution:\n    pass\n");
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].closed);
        assert_eq!(blocks[0].lang.as_deref(), Some("python"));
        assert_eq!(blocks[0].body, "class Solution:\n    pass");
    }

    #[test]
    fn opening_line_with_code_is_kept_in_body() {
        let blocks = parse_fences("``` class Solution { }\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lang, None);
        assert_eq!(blocks[0].body, "class Solution { }");
    }

    #[test]
    fn inline_fence_is_one_block() {
        let blocks = parse_fences("use ```x + 1``` here");
        assert_eq!(
            blocks,
            vec![FencedBlock {
                lang: None,
                body: "x + 1".to_string(),
                closed: true,
            }]
        );
    }

    #[test]
    fn empty_blocks_are_ignored_when_others_exist() {
        let text = "```java\n```\n```java\nclass Solution {}\n```";
        assert_eq!(extract_code(text), "class Solution {}");
    }
}
