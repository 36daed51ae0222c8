// Terminal front-end: one session per process, one goal per line.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::constants::{HISTORY_VIEW_LIMIT, INTRODUCTION};
use crate::planner::PlanningCoordinator;

const RULE: &str = "==================================================";

/// What a single line of chat input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    Goal(&'a str),
    History,
    Progress,
    Clear,
    Quit,
    Help,
}

pub fn parse_line(line: &str) -> ChatCommand<'_> {
    match line.trim() {
        "/quit" | "/exit" => ChatCommand::Quit,
        "/history" => ChatCommand::History,
        "/progress" => ChatCommand::Progress,
        "/clear" => ChatCommand::Clear,
        "/help" => ChatCommand::Help,
        _ => ChatCommand::Goal(line),
    }
}

/// Prints every plan for `goals` in order, then the progress report.
pub async fn run_batch<W>(session: &mut PlanningCoordinator, goals: &[String], out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    for goal in goals {
        write_line(out, &format!("\n{RULE}\n📚 Student's Goal: {goal}")).await?;
        match session.process_goal(goal).await {
            Ok(reply) => write_line(out, &format!("\n🧠 Professor's Plan:\n{}", reply.text)).await?,
            Err(e) => write_line(out, &format!("⚠️ {e}")).await?,
        }
    }
    write_line(out, &format!("\n{RULE}\n{}", session.memory().progress_report())).await
}

/// Reads goals from `input` until EOF or `/quit`.
pub async fn run_chat<R, W>(session: &mut PlanningCoordinator, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Starting chat session...");
    write_line(out, INTRODUCTION).await?;
    write_line(out, "(type /help for commands)").await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        match parse_line(&line) {
            ChatCommand::Quit => break,
            ChatCommand::Help => {
                write_line(out, "/history  /progress  /clear  /quit; anything else is a goal").await?
            }
            ChatCommand::Clear => write_line(out, "\x1B[2J\x1B[H").await?,
            ChatCommand::Progress => write_line(out, &session.memory().progress_report()).await?,
            ChatCommand::History => {
                let items = session.memory().history_view(HISTORY_VIEW_LIMIT);
                if items.is_empty() {
                    write_line(out, "🌟 No goals yet.").await?;
                }
                for item in items {
                    let marker = if item.failed { " (failed)" } else { "" };
                    write_line(
                        out,
                        &format!("🎯 Goal {}{}: {}\n{}\n", item.number, marker, item.goal_label, item.summary),
                    )
                    .await?;
                }
            }
            ChatCommand::Goal(goal) => {
                write_line(out, "🤔 Professor is thinking...").await?;
                match session.process_goal(goal).await {
                    Ok(reply) => write_line(out, &format!("\n{}\n", reply.text)).await?,
                    Err(e) => write_line(out, &format!("⚠️ {e}")).await?,
                }
            }
        }
    }
    info!("Chat session finished.");
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await.context("Failed to flush output")
}
