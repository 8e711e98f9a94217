//! Interactive read-eval-print loop
//!
//! Reads one line of input per iteration and drives the session. A
//! failed completion call is reported and the loop continues; only an
//! exit token or end of input ends the loop.

use parley_ollama_client::OllamaClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::render::{self, TerminalRenderer};
use crate::session::{ChatSession, Input};

/// Run the chat loop until an exit token or end of input
pub async fn run(client: &OllamaClient, mut session: ChatSession) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut renderer = TerminalRenderer::new();

    render::print_chat_banner();

    loop {
        render::print_prompt();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // EOF ends the loop like an exit token; retrying a
                // closed stdin would spin forever
                render::print_goodbye();
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                continue;
            }
        };

        match Input::from_line(&line) {
            Input::Empty => continue,
            Input::Exit => {
                render::print_goodbye();
                break;
            }
            Input::Message(text) => {
                if let Err(e) = session.run_turn(client, &text, &mut renderer).await {
                    render::print_turn_error(&e);
                }
            }
        }
    }

    Ok(())
}
