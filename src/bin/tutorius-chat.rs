//! Interactive chat with the subject tutoring service.
//!
//! This binary provides a REPL interface that streams the tutor's replies as
//! they arrive.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! tutorius-chat
//!
//! # Point at another service and start on the physics tab
//! tutorius-chat --base-url http://tutor.internal:8001/ --subject physics
//!
//! # Read settings from a file and disable colors
//! tutorius-chat --config tutorius.yaml --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/tab <name|n>` - Switch subject
//! - `/examples`, `/example <n>` - List or ask example questions
//! - `/stream on|off` - Stream replies or wait for whole answers
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use tutorius::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, ChatView, Controls, PlainTextRenderer,
    ReplyMode, SendOutcome, TabTarget, help_text, parse_command,
};
use tutorius::{Subject, Transport, TutorClient};

const ANSI_DIM: &str = "\x1b[2m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

/// Main entry point for the tutorius-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("tutorius-chat [OPTIONS]");
    let config = ChatConfig::load(args)?;
    let use_color = config.use_color;

    let client = config.client()?;
    let mut session = ChatSession::new(client).with_mode(config.mode);
    let mut view = ChatView::for_subject(config.subject)
        .with_echo(PlainTextRenderer::with_color(use_color).with_user_echo(false));
    let mut rl = DefaultEditor::new()?;

    println!(
        "Tutor Chat (service: {}, subject: {})",
        session.transport().base_url(),
        active_subject(&view)
    );
    println!("Type /help for commands, /examples for ideas, /quit to exit\n");

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            view.clear();
                            print_info(use_color, "Conversation cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::ListTabs => {
                            print_tabs(&view);
                        }
                        ChatCommand::Tab(target) => {
                            let selected = match &target {
                                TabTarget::Index(n) => view.tabs_mut().select(n - 1),
                                TabTarget::Name(name) => view.tabs_mut().select_label(name),
                            };
                            if selected {
                                let subject = active_subject(&view);
                                view.examples_mut()
                                    .replace(subject.sample_questions().iter().copied());
                                print_info(
                                    use_color,
                                    &format!(
                                        "Subject changed to: {}",
                                        view.tabs().active_label().unwrap_or_default()
                                    ),
                                );
                                print_examples(&view);
                            } else {
                                print_error(use_color, "No such subject. Use /tab to list them.");
                            }
                        }
                        ChatCommand::Examples => {
                            print_examples(&view);
                        }
                        ChatCommand::Example(n) => {
                            let outcome = session.click_example(&mut view, n - 1).await;
                            if let SendOutcome::Ignored = outcome {
                                print_error(
                                    use_color,
                                    &format!("No example {n}. Use /examples to list them."),
                                );
                            }
                            report(use_color, &outcome);
                        }
                        ChatCommand::Stream(on) => {
                            if on {
                                session.set_mode(ReplyMode::Streaming);
                                print_info(use_color, "Replies will stream.");
                            } else {
                                session.set_mode(ReplyMode::Single);
                                print_info(use_color, "Replies will arrive whole.");
                            }
                        }
                        ChatCommand::Health => {
                            check_health(&session, use_color).await;
                        }
                        ChatCommand::Stats => {
                            print_stats(&session, &view);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&session, &view);
                        }
                        ChatCommand::Invalid(message) => {
                            print_error(use_color, &message);
                        }
                    }
                    continue;
                }

                // Regular message - send to the service
                view.set_input_text(line);
                let outcome = session.submit(&mut view).await;
                report(use_color, &outcome);
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                print_error(use_color, &format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn active_subject(view: &ChatView) -> Subject {
    Subject::resolve(view.tabs().active_label())
}

fn print_info(use_color: bool, message: &str) {
    if use_color {
        println!("{ANSI_DIM}{message}{ANSI_RESET}");
    } else {
        println!("{message}");
    }
}

fn print_error(use_color: bool, message: &str) {
    if use_color {
        eprintln!("{ANSI_RED}Error: {message}{ANSI_RESET}");
    } else {
        eprintln!("Error: {message}");
    }
}

/// The tutor's reply already carries the user-facing text; this adds the
/// underlying cause on stderr.
fn report(use_color: bool, outcome: &SendOutcome) {
    if let SendOutcome::Failed(err) = outcome {
        print_error(use_color, &err.to_string());
    }
}

async fn check_health(session: &ChatSession<TutorClient>, use_color: bool) {
    match session.transport().health().await {
        Ok(health) if health.is_healthy() => {
            print_info(use_color, &format!("Service is up: {}", health.message));
        }
        Ok(health) => {
            print_error(
                use_color,
                &format!("Service reports {}: {}", health.status, health.message),
            );
        }
        Err(err) => print_error(use_color, &format!("Health check failed: {}", err)),
    }
}

fn print_tabs(view: &ChatView) {
    println!("    Subjects:");
    for (i, tab) in view.tabs().tabs().iter().enumerate() {
        let marker = if tab.active { "*" } else { " " };
        println!("    {marker} {}. {}", i + 1, tab.label);
    }
}

fn print_examples(view: &ChatView) {
    println!("    Example questions:");
    for (i, example) in view.examples().items().iter().enumerate() {
        println!("      {}. {}", i + 1, example.label);
    }
}

fn print_stats(session: &ChatSession<TutorClient>, view: &ChatView) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Messages shown: {}", view.bubbles().len());
    println!(
        "      Sends: {} accepted, {} rejected",
        stats.accepted, stats.rejected
    );
    println!(
        "      Replies: {} completed, {} failed ({} rate limited)",
        stats.completed, stats.failed, stats.rate_limited
    );
    println!(
        "      Received: {} fragments, {} characters",
        stats.fragments, stats.characters
    );
}

fn print_config(session: &ChatSession<TutorClient>, view: &ChatView) {
    let client = session.transport();
    println!("    Current Configuration:");
    println!("      Service: {}", client.base_url());
    println!("      Timeout: {}s", client.timeout().as_secs());
    println!("      Subject: {}", active_subject(view));
    println!(
        "      Replies: {}",
        match session.mode() {
            ReplyMode::Streaming => "streaming",
            ReplyMode::Single => "whole",
        }
    );
}
