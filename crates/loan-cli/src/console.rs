//! A real customer at the terminal

use async_trait::async_trait;
use loan_agent::{ConversationState, Next, Node, NodeId, Result, Speaker};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Reads the customer's lines from stdin. EOF, `exit` or `quit` ends the conversation.
pub struct ConsoleUserNode {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleUserNode {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

#[async_trait]
impl Node for ConsoleUserNode {
    fn id(&self) -> NodeId {
        NodeId::User
    }

    async fn run(&self, state: &mut ConversationState) -> Result<()> {
        let mut lines = self.lines.lock().await;
        loop {
            print!("you> ");
            let _ = std::io::stdout().flush();

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    state.action = Next::End;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read stdin, ending conversation");
                    state.action = Next::End;
                    return Ok(());
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "exit" || line == "quit" {
                state.action = Next::End;
                return Ok(());
            }

            state.history.push(Speaker::User, line);
            state.advance_turn();
            state.action = Next::Node(NodeId::Router);
            return Ok(());
        }
    }
}
