//! Ask the tutoring service one question from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Stream the answer to a maths question
//! tutorius-ask "What is a derivative?"
//!
//! # Ask a physics question and wait for the whole answer
//! tutorius-ask --subject physics --no-stream "Why is the sky blue?"
//! ```
//!
//! Exits with status 1 if the question could not be answered.

use arrrg::CommandLine;

use tutorius::chat::{ChatArgs, ChatConfig, ChatSession, ChatView, Controls, SendOutcome};
use tutorius::PlainTextRenderer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, words) = ChatArgs::from_command_line_relaxed("tutorius-ask [OPTIONS] <QUESTION>...");
    let question = words.join(" ");
    if question.trim().is_empty() {
        eprintln!("Error: Must specify a question");
        std::process::exit(1);
    }

    let config = ChatConfig::load(args)?;
    let session = ChatSession::new(config.client()?).with_mode(config.mode);
    let mut view = ChatView::for_subject(config.subject)
        .with_echo(PlainTextRenderer::with_color(config.use_color).with_user_echo(false));

    view.set_input_text(&question);
    match session.submit(&mut view).await {
        SendOutcome::Completed => Ok(()),
        SendOutcome::Failed(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
        SendOutcome::Ignored | SendOutcome::Rejected => {
            eprintln!("Error: question was not sent");
            std::process::exit(1);
        }
    }
}
