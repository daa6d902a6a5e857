//! Rule-based intent classifier.
//!
//! Rules are tried in a fixed priority order and the first match wins:
//! add, list, complete, rename, delete. Each rule needs a verb from its set
//! and a task word somewhere in the instruction. An add verb that follows a
//! list verb ("show my new tasks") leaves the instruction to the list rule.

use std::ops::Range;

use async_trait::async_trait;
use taskrelay_core::classifier::{ClassificationPlan, IntentClassifier};
use taskrelay_core::message::ConversationTurn;
use tracing::debug;

/// Instructions longer than this are not classified.
pub const MAX_INSTRUCTION_CHARS: usize = 10_000;

const TASK_WORDS: &[&str] = &["task", "tasks", "todo", "todos"];
const ADD_VERBS: &[&str] = &["add", "create", "new"];
const LIST_VERBS: &[&str] = &["list", "show", "display"];
const COMPLETE_VERBS: &[&str] = &["complete", "finish", "done", "mark"];
const RENAME_VERBS: &[&str] = &["rename", "retitle"];
const DELETE_VERBS: &[&str] = &["delete", "remove"];
const COMPLETED_WORDS: &[&str] = &["completed", "done"];
const PENDING_WORDS: &[&str] = &["pending", "open", "incomplete"];

const UNTITLED: &str = "Untitled task";

/// One whitespace-separated word: surrounding punctuation stripped, plus a
/// lowercase form for matching. `cut` covers the whole word and the
/// whitespace after it in the original instruction.
#[derive(Debug)]
struct Token<'a> {
    raw: &'a str,
    norm: String,
    cut: Range<usize>,
}

fn tokenize(instruction: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut word_start = None;
    let boundaries = instruction
        .char_indices()
        .chain(std::iter::once((instruction.len(), ' ')));

    for (i, c) in boundaries {
        match (c.is_whitespace(), word_start) {
            (false, None) => word_start = Some(i),
            (true, Some(start)) => {
                word_start = None;
                let raw = instruction[start..i].trim_matches(|c: char| !c.is_alphanumeric());
                if raw.is_empty() {
                    continue;
                }
                let end = instruction[i..]
                    .find(|c: char| !c.is_whitespace())
                    .map_or(instruction.len(), |n| i + n);
                tokens.push(Token {
                    raw,
                    norm: raw.to_lowercase(),
                    cut: start..end,
                });
            }
            _ => {}
        }
    }
    tokens
}

fn find(tokens: &[Token<'_>], words: &[&str]) -> Option<usize> {
    tokens.iter().position(|t| words.contains(&t.norm.as_str()))
}

fn has(tokens: &[Token<'_>], words: &[&str]) -> bool {
    find(tokens, words).is_some()
}

/// `instruction` with two tokens cut out, trimmed.
fn cut_out(instruction: &str, a: &Range<usize>, b: &Range<usize>) -> String {
    let (first, second) = if a.start < b.start { (a, b) } else { (b, a) };
    let mut text = String::with_capacity(instruction.len());
    text.push_str(&instruction[..first.start]);
    text.push_str(&instruction[first.end..second.start]);
    text.push_str(&instruction[second.end..]);
    text.trim().to_string()
}

/// Keyword matching over a handful of task phrasings.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    restrict_to_known: bool,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only return plans for capabilities in `known_capabilities`.
    ///
    /// By default a plan is produced even when its capability is not
    /// registered, and the executor reports `NotFound`.
    pub fn restricted_to_known() -> Self {
        Self {
            restrict_to_known: true,
        }
    }

    /// Apply the rules to `instruction` without consulting the registry.
    pub fn plan(&self, instruction: &str) -> Option<ClassificationPlan> {
        if instruction.trim().is_empty() || instruction.chars().count() > MAX_INSTRUCTION_CHARS {
            return None;
        }

        let tokens = tokenize(instruction);
        let task_at = find(&tokens, TASK_WORDS)?;

        Self::add(instruction, &tokens, task_at)
            .or_else(|| Self::list(&tokens))
            .or_else(|| Self::with_id(&tokens, task_at, COMPLETE_VERBS, "complete_task"))
            .or_else(|| Self::rename(instruction, &tokens, task_at))
            .or_else(|| Self::with_id(&tokens, task_at, DELETE_VERBS, "delete_task"))
    }

    fn add(instruction: &str, tokens: &[Token<'_>], task_at: usize) -> Option<ClassificationPlan> {
        let verb_at = find(tokens, ADD_VERBS)?;
        if find(tokens, LIST_VERBS).is_some_and(|list_at| list_at < verb_at) {
            return None;
        }
        let title = cut_out(instruction, &tokens[verb_at].cut, &tokens[task_at].cut);
        let title = if title.is_empty() { UNTITLED.to_string() } else { title };
        Some(ClassificationPlan::new("add_task").with_parameter("title", title))
    }

    fn list(tokens: &[Token<'_>]) -> Option<ClassificationPlan> {
        if !has(tokens, LIST_VERBS) {
            return None;
        }
        let plan = ClassificationPlan::new("list_tasks");
        Some(if has(tokens, COMPLETED_WORDS) {
            plan.with_parameter("completed", true)
        } else if has(tokens, PENDING_WORDS) {
            plan.with_parameter("completed", false)
        } else {
            plan
        })
    }

    fn with_id(
        tokens: &[Token<'_>],
        task_at: usize,
        verbs: &[&str],
        capability: &str,
    ) -> Option<ClassificationPlan> {
        if !has(tokens, verbs) {
            return None;
        }
        let id = tokens.get(task_at + 1)?;
        Some(ClassificationPlan::new(capability).with_parameter("task_id", id.raw))
    }

    fn rename(instruction: &str, tokens: &[Token<'_>], task_at: usize) -> Option<ClassificationPlan> {
        if !has(tokens, RENAME_VERBS) {
            return None;
        }
        let id = tokens.get(task_at + 1)?;
        let to_at = tokens
            .iter()
            .skip(task_at + 2)
            .position(|t| t.norm == "to")
            .map(|offset| task_at + 2 + offset)?;
        let title = instruction[tokens[to_at].cut.end..].trim();
        if title.is_empty() {
            return None;
        }
        Some(
            ClassificationPlan::new("update_task")
                .with_parameter("task_id", id.raw)
                .with_parameter("title", title),
        )
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(
        &self,
        instruction: &str,
        _history: &[ConversationTurn],
        known_capabilities: &[String],
    ) -> Option<ClassificationPlan> {
        let plan = self.plan(instruction)?;
        if self.restrict_to_known && !known_capabilities.iter().any(|c| *c == plan.capability) {
            debug!(capability = %plan.capability, "Plan dropped: capability not registered");
            return None;
        }
        Some(plan)
    }
}
