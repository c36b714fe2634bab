//! Line-oriented chat loop.

use log::{debug, error};
use raven_rs_config::RavenConfig;
use raven_rs_core::Orchestrator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Speaker labels shown around each exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLabels {
    pub user: String,
    pub agent: String,
}

impl Default for ChatLabels {
    fn default() -> Self {
        Self {
            user: "USER".to_string(),
            agent: "RAVEN".to_string(),
        }
    }
}

impl From<&RavenConfig> for ChatLabels {
    fn from(config: &RavenConfig) -> Self {
        Self {
            user: config.user_name.clone(),
            agent: config.agent_name.clone(),
        }
    }
}

/// Read one line, print one reply, until `input` reaches end of file.
///
/// Blank lines re-prompt without starting a turn. A failed turn is reported on
/// stderr and the loop keeps reading.
pub async fn run_repl<R, W>(
    orchestrator: &Orchestrator,
    labels: &ChatLabels,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        output
            .write_all(format!("\n\n{}: ", labels.user).as_bytes())
            .await?;
        output.flush().await?;
        let Some(line) = lines.next_line().await? else {
            debug!("input closed; leaving chat loop");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }
        match orchestrator.run_turn(&line).await {
            Ok(result) => {
                output
                    .write_all(format!("\n\n{}: {}", labels.agent, result.response).as_bytes())
                    .await?;
            }
            Err(err) => {
                error!("turn failed (error={err})");
                eprintln!("error: {err}");
            }
        }
    }
}
