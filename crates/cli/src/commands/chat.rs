//! `taskrelay chat`: Interactive or single-message orchestration.

use std::io::Write;

use taskrelay_config::AppConfig;
use taskrelay_core::message::ConversationTurn;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use super::build_runtime;

fn is_exit(line: &str) -> bool {
    matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q")
}

pub async fn run(
    config: AppConfig,
    message: Option<String>,
    user: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = build_runtime(&config).await?;

    if let Some(msg) = message {
        let reply = runtime.orchestrator.handle(&msg, &[], &user).await;
        println!("{}", reply.reply);
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        taskrelay: Interactive Mode           ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  User:          {user}");
    println!("  Store:         {}", config.store.backend);
    println!(
        "  Capabilities:  {}",
        runtime.executor.registry().names().join(", ")
    );
    println!();
    println!("  Try \"add task buy milk\" or \"list tasks\".");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut history: Vec<ConversationTurn> = Vec::new();
    let mut lines = BufReader::new(io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if is_exit(line) {
            break;
        }

        let reply = runtime.orchestrator.handle(line, &history, &user).await;
        history.push(ConversationTurn::user(line));
        history.push(ConversationTurn::assistant(reply.reply.as_str()));

        println!();
        for reply_line in reply.reply.lines() {
            println!("  Assistant > {reply_line}");
        }
        println!();

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words() {
        for word in ["exit", "quit", "/exit", "/quit", ":q"] {
            assert!(is_exit(word));
        }
        assert!(!is_exit("exit now"));
        assert!(!is_exit("list tasks"));
    }
}
