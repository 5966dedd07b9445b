//! Console command
//!
//! Usage: blueprint console [--config <FILE>]
//!
//! Reads one command per line from stdin until `exit` or end of input.

use std::path::PathBuf;

use blueprint_core::logging_facility::{self, Profile};
use blueprint_core::render::{render_status_card, status_message};
use blueprint_core::{BlueprintError, Orchestrator, OrchestratorStatus, Result, SubmitOutcome};
use clap::{Args, Parser};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::{follow_progress, simulated_orchestrator, RequestArgs};
use crate::config::AppConfig;
use crate::registry::{default_registry, render_help, CommandRegistry, ConsoleAction};

const PROMPT: &str = "blueprint> ";

#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// TOML file with [orchestrator] and [simulation] tables
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Emit JSON logs on stderr
    #[arg(long)]
    pub json_logs: bool,
}

/// Arguments of the in-console `blueprint` command
#[derive(Debug, Parser)]
#[command(name = "blueprint", no_binary_name = true)]
struct BlueprintLine {
    #[command(flatten)]
    request: RequestArgs,
}

/// Execute console command
///
/// # Errors
///
/// Configuration, runtime and stdio errors. Command errors are printed and
/// the session continues.
pub fn execute(args: ConsoleArgs) -> std::result::Result<(), Box<dyn std::error::Error>> {
    logging_facility::init(Profile::from_json_flag(args.json_logs));

    let config = AppConfig::load_or_default(args.config.as_deref())?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        run(&config, input, &mut stdout).await
    })?;
    Ok(())
}

enum Flow {
    Continue,
    Exit,
}

struct Session {
    registry: CommandRegistry,
    orchestrator: Orchestrator,
    config: AppConfig,
}

/// Drive a console session over `input` until `exit` or end of input
///
/// # Errors
///
/// Wiring errors and I/O errors on `input` or `out`.
pub async fn run<R, W>(config: &AppConfig, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = Session {
        registry: default_registry(),
        orchestrator: simulated_orchestrator(config)?,
        config: config.clone(),
    };

    tracing::debug!(
        component = module_path!(),
        op = "console",
        commands = session.registry.len(),
        "console ready"
    );
    write_out(out, "Blueprint console. Type 'help' for commands.\n").await?;

    let mut lines = input.lines();
    loop {
        write_out(out, PROMPT).await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let flow = match tokenize(&line) {
            Ok(tokens) if tokens.is_empty() => Ok(Flow::Continue),
            Ok(tokens) => session.dispatch(&tokens, out).await,
            Err(err) => Err(err),
        };

        match flow {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(err) => write_out(out, &format!("Error: {}\n", err)).await?,
        }
    }

    session.orchestrator.teardown();
    write_out(out, "Goodbye.\n").await
}

impl Session {
    async fn dispatch<W>(&mut self, tokens: &[String], out: &mut W) -> Result<Flow>
    where
        W: AsyncWrite + Unpin,
    {
        let action = self.registry.resolve(&tokens[0])?.action;
        let rest = &tokens[1..];

        match action {
            ConsoleAction::Help => {
                let help = render_help(&self.registry, rest.first().map(String::as_str))?;
                write_out(out, &help).await?;
            }
            ConsoleAction::Generate => self.generate(rest, out).await?,
            ConsoleAction::Status => {
                write_out(out, &render_status_card(&self.orchestrator.state())).await?;
            }
            ConsoleAction::Wait => {
                if self.orchestrator.state().status == OrchestratorStatus::Idle {
                    write_out(out, "Nothing to wait for.\n").await?;
                } else {
                    let state = follow_progress(self.orchestrator.watch(), out).await?;
                    write_out(out, &render_status_card(&state)).await?;
                }
            }
            ConsoleAction::Cancel => {
                let in_flight = self.orchestrator.active_cycle().is_some()
                    && !self.orchestrator.state().status.is_terminal();
                if in_flight {
                    self.orchestrator.cancel();
                    write_out(out, "Generation cancelled.\n").await?;
                } else {
                    write_out(out, "Nothing to cancel.\n").await?;
                }
            }
            ConsoleAction::Exit => return Ok(Flow::Exit),
        }

        Ok(Flow::Continue)
    }

    async fn generate<W>(&mut self, args: &[String], out: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let line = BlueprintLine::try_parse_from(args).map_err(|err| BlueprintError::InvalidInput {
            reason: err.to_string().trim_end().to_string(),
        })?;
        let request = line.request.to_request(&self.config.orchestrator);

        let message = match self.orchestrator.submit(&request) {
            SubmitOutcome::Dispatched => format!(
                "Generating blueprint for {}. Use 'wait' to follow it.\n",
                request.engagement_id.trim()
            ),
            SubmitOutcome::Deduplicated => format!(
                "Same request already in flight: {}\n",
                status_message(&self.orchestrator.state())
            ),
            SubmitOutcome::Rejected => format!("{}\n", status_message(&self.orchestrator.state())),
        };
        write_out(out, &message).await
    }
}

async fn write_out<W>(out: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

/// Split a console line on whitespace, honoring single and double quotes
///
/// # Errors
///
/// `InvalidInput` on an unterminated quote.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(BlueprintError::InvalidInput {
            reason: "unterminated quote".to_string(),
        });
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_sim::SimulationConfig;

    fn instant() -> AppConfig {
        AppConfig {
            simulation: SimulationConfig::instant(),
            ..AppConfig::default()
        }
    }

    async fn session(script: &str) -> String {
        let mut out = Vec::new();
        run(&instant(), script.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"bp acme-1 --win "fast POV" --risk 'budget freeze'"#).unwrap(),
            vec!["bp", "acme-1", "--win", "fast POV", "--risk", "budget freeze"]
        );
        assert_eq!(tokenize("  ").unwrap(), Vec::<String>::new());
        assert_eq!(tokenize(r#"blueprint """#).unwrap(), vec!["blueprint", ""]);
        assert!(tokenize(r#"bp "acme"#).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_and_wait() {
        let output = session("blueprint acme-1 --win \"fast POV\"\nwait\nexit\n").await;

        assert!(output.contains("Generating blueprint for acme-1."));
        assert!(output.contains("[READY] Blueprint generation complete!"));
        assert!(output.contains("Customer: Acme Financial"));
        assert!(output.ends_with("Goodbye.\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_request_is_deduplicated() {
        let output = session("bp acme-1\nbp acme-1\nexit\n").await;
        assert_eq!(output.matches("Generating blueprint for acme-1.").count(), 1);
        assert!(output.contains("Same request already in flight: "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_engagement_is_reported() {
        let output = session("blueprint \"\"\nstatus\n").await;
        assert!(output.contains("Engagement ID is required\n"));
        assert!(output.contains("[ERROR] Engagement ID is required"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_command_keeps_session_alive() {
        let output = session("deploy now\nhelp\n").await;
        assert!(output.contains("Error: Unknown command: deploy\n"));
        assert!(output.contains("Available commands:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_engagement_argument() {
        let output = session("blueprint\n").await;
        assert!(output.contains("Error: Invalid input: "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_idle_wait() {
        let output = session("wait\ncancel\nbp globex-7\ncancel\nstatus\n").await;
        assert!(output.contains("Nothing to wait for.\n"));
        assert!(output.contains("Nothing to cancel.\n"));
        assert!(output.contains("Generation cancelled.\n"));
        assert!(output.contains("[IDLE] Waiting for engagement input"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_ready_keeps_result() {
        let output = session("bp acme-1\nwait\ncancel\nstatus\n").await;
        assert!(output.contains("Nothing to cancel.\n"));
        assert!(!output.contains("Generation cancelled."));

        let status = output.rsplit("Nothing to cancel.\n").next().unwrap();
        assert!(status.contains("[READY] Blueprint generation complete!"));
    }
}
