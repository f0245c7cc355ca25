//! Interactive terminal chat with automatic continuation.

use std::io::Write;

use tokio::io::AsyncBufReadExt;

use parley_config::schema::ParleyConfig;
use parley_session::{ChatSession, TurnOutcome};

use crate::commands::build_gateway;

pub async fn cmd_chat(config: ParleyConfig, no_auto_continue: bool) -> parley_core::Result<()> {
    println!("Parley Interactive Chat");
    println!("   Type 'exit' or Ctrl+C to quit");
    println!("   Type '/clear' to reset the conversation");
    println!();

    let gateway = build_gateway(&config);
    let max_auto_continues = config.agent.max_auto_continues;
    let mut session = ChatSession::new(gateway, &config);

    let greeting = session.greet();
    print_agent_text(&greeting);
    println!();

    let stdin = tokio::io::stdin();
    let reader = tokio::io::BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        eprint!("\x1b[36myou>\x1b[0m ");
        std::io::stderr().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break, // EOF
            Err(_) => break,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "exit" || trimmed == "quit" || trimmed == "/exit" {
            println!("👋 Goodbye!");
            break;
        }
        if trimmed == "/clear" {
            session.clear_history();
            println!("\x1b[90m   conversation cleared\x1b[0m");
            continue;
        }

        let outcome = match session.submit(trimmed, !no_auto_continue).await {
            Ok(o) => o,
            Err(e) => {
                println!("\x1b[31m❌ {}\x1b[0m", e);
                continue;
            }
        };
        print_outcome(&outcome);

        // The model asked to keep going; feed it the canned prompt until it
        // yields or the per-input cap runs out.
        let mut should_continue = outcome.should_continue;
        let mut continues = 0u32;
        while should_continue && continues < max_auto_continues {
            continues += 1;
            eprintln!("\x1b[90m   ↻ continuing ({continues}/{max_auto_continues})\x1b[0m");
            match session.submit_continue().await {
                Ok(outcome) => {
                    print_outcome(&outcome);
                    should_continue = outcome.should_continue;
                }
                Err(e) => {
                    println!("\x1b[31m❌ {}\x1b[0m", e);
                    break;
                }
            }
        }

        println!();
    }

    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    if let Some(thoughts) = outcome.turn.thought_content() {
        eprintln!("\x1b[90m💭 {}\x1b[0m", thoughts);
    }

    let text = outcome.turn.text_content();
    if !text.trim().is_empty() {
        print_agent_text(&text);
    }

    if let Some(ref decision) = outcome.decision {
        eprintln!(
            "\x1b[90m   [next: {:?}: {}]\x1b[0m",
            decision.next_speaker, decision.reasoning
        );
    }
}

fn print_agent_text(text: &str) {
    eprint!("\x1b[32mparley>\x1b[0m ");
    println!("{}", text);
    std::io::stdout().flush().ok();
}
