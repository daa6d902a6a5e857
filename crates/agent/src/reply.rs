//! User-facing reply text for an invocation outcome.

use serde_json::Value;
use taskrelay_core::capability::Parameters;
use taskrelay_core::envelope::InvocationResult;

static NULL: Value = Value::Null;

/// What the user asked for, phrased for an apology.
fn action(capability: &str) -> String {
    match capability {
        "add_task" => "add the task".into(),
        "list_tasks" => "list your tasks".into(),
        "get_task" => "find the task".into(),
        "complete_task" => "complete the task".into(),
        "update_task" => "update the task".into(),
        "delete_task" => "delete the task".into(),
        "bulk_add_tasks" => "add the tasks".into(),
        "bulk_update_tasks" => "update the tasks".into(),
        other => format!("run {other}"),
    }
}

/// Read a string field from the result, falling back to the parameters.
fn field<'a>(result: &'a Value, parameters: &'a Parameters, name: &str) -> &'a str {
    result
        .get(name)
        .and_then(Value::as_str)
        .or_else(|| parameters.get(name).and_then(Value::as_str))
        .unwrap_or_default()
}

fn successful(result: &Value) -> u64 {
    result
        .pointer("/summary/successful")
        .and_then(Value::as_u64)
        .unwrap_or_default()
}

/// Compose the reply for `capability` from its envelope.
pub fn compose(capability: &str, parameters: &Parameters, outcome: &InvocationResult) -> String {
    if let Some(error) = outcome.error() {
        return format!("Sorry, I couldn't {}: {}", action(capability), error.message);
    }
    let result = outcome.result().unwrap_or(&NULL);

    match capability {
        "add_task" => format!(
            "I've added the task '{}' to your list.",
            field(result, parameters, "title")
        ),
        "list_tasks" => {
            let titles: Vec<&str> = result
                .get("tasks")
                .and_then(Value::as_array)
                .map(|tasks| tasks.iter().filter_map(|t| t.get("title")?.as_str()).collect())
                .unwrap_or_default();
            if titles.is_empty() {
                "You don't have any tasks.".into()
            } else {
                let lines: Vec<String> = titles.iter().map(|t| format!("- {t}")).collect();
                format!("Here are your tasks:\n{}", lines.join("\n"))
            }
        }
        "complete_task" => format!(
            "I've marked task {} as completed.",
            field(result, parameters, "task_id")
        ),
        "update_task" => format!("I've updated task {}.", field(result, parameters, "task_id")),
        "delete_task" => format!("I've deleted task {}.", field(result, parameters, "task_id")),
        "bulk_add_tasks" => format!("I've added {} tasks.", successful(result)),
        "bulk_update_tasks" => format!("I've updated {} tasks.", successful(result)),
        other => format!("Done: {other} completed successfully."),
    }
}

/// Reply used when no capability matched the instruction.
pub fn fallback(capabilities: &[String]) -> String {
    if capabilities.is_empty() {
        return "I'm not sure how to help with that, and no capabilities are available right now."
            .into();
    }
    format!(
        "I'm not sure how to help with that. I can help you manage tasks with: {}.",
        capabilities.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskrelay_core::envelope::{ErrorKind, InvocationError};

    fn params(value: Value) -> Parameters {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn add_reply_uses_title() {
        let reply = compose(
            "add_task",
            &params(json!({"title": "buy milk"})),
            &InvocationResult::ok(json!({"taskId": "1"})),
        );
        assert_eq!(reply, "I've added the task 'buy milk' to your list.");
    }

    #[test]
    fn list_reply_variants() {
        let empty = compose(
            "list_tasks",
            &Parameters::new(),
            &InvocationResult::ok(json!({"tasks": [], "count": 0})),
        );
        assert_eq!(empty, "You don't have any tasks.");

        let some = compose(
            "list_tasks",
            &Parameters::new(),
            &InvocationResult::ok(json!({"tasks": [{"title": "a"}, {"title": "b"}], "count": 2})),
        );
        assert_eq!(some, "Here are your tasks:\n- a\n- b");
    }

    #[test]
    fn id_based_replies() {
        let p = params(json!({"task_id": "t-9"}));
        let ok = InvocationResult::ok(json!({"message": "ok"}));
        assert_eq!(compose("complete_task", &p, &ok), "I've marked task t-9 as completed.");
        assert_eq!(compose("update_task", &p, &ok), "I've updated task t-9.");
        assert_eq!(compose("delete_task", &p, &ok), "I've deleted task t-9.");
    }

    #[test]
    fn bulk_and_generic_replies() {
        let summary = InvocationResult::ok(json!({"summary": {"successful": 3, "failed": 1}}));
        assert_eq!(compose("bulk_add_tasks", &Parameters::new(), &summary), "I've added 3 tasks.");
        assert_eq!(
            compose("get_task", &Parameters::new(), &InvocationResult::ok(json!({}))),
            "Done: get_task completed successfully."
        );
    }

    #[test]
    fn failure_reply_names_error() {
        let reply = compose(
            "list_tasks",
            &Parameters::new(),
            &InvocationResult::err(InvocationError::new(
                ErrorKind::NotFound,
                "Capability 'list_tasks' not found",
            )),
        );
        assert_eq!(
            reply,
            "Sorry, I couldn't list your tasks: Capability 'list_tasks' not found"
        );
    }

    #[test]
    fn fallback_is_deterministic() {
        let names = vec!["add_task".to_string(), "list_tasks".to_string()];
        assert_eq!(fallback(&names), fallback(&names));
        assert!(fallback(&names).contains("add_task, list_tasks"));
        assert!(fallback(&[]).contains("no capabilities"));
    }
}
