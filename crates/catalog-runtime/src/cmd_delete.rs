//! `catalog-admin delete <kind> <id>`: one-shot delete behind the same
//! confirmation gate the shell uses. The command arms the gate, and Enter
//! within the window confirms.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use catalog_client::CatalogApi;
use catalog_core::EntityKind;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::board::{BoardUpdate, DisarmReason, GateBoard};
use crate::invoker::Action;

/// Entry point for `catalog-admin delete`.
///
/// Returns an exit code:
/// - 0: deleted
/// - 1: declined, timed out, or the server refused
/// - 3: interrupted (Ctrl-C)
pub async fn cmd_delete<R, W>(
    api: Arc<dyn CatalogApi>,
    kind: EntityKind,
    id: i64,
    confirm_timeout: Duration,
    input: R,
    out: &mut W,
) -> anyhow::Result<i32>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let action = match kind {
        EntityKind::Album => Action::DeleteAlbum(id),
        EntityKind::Song => Action::DeleteSong(id),
    };
    let subject = action.subject();
    let mut board = GateBoard::new(api, confirm_timeout);
    let mut lines = input.lines();

    board.request(action.clone());
    let window = confirm_timeout.as_millis().div_ceil(1000);
    write!(
        out,
        "Delete {subject}? Press Enter within {window}s to confirm (anything else cancels): "
    )?;
    out.flush()?;

    let answer = tokio::select! {
        line = lines.next_line() => match line? {
            Some(reply) if is_yes(&reply) => match board.request(action) {
                BoardUpdate::Confirmed { .. } => Answer::Confirmed,
                // The window closed before the reply was read; the gate re-armed.
                _ => {
                    board.cancel(subject);
                    Answer::TimedOut
                }
            },
            _ => {
                board.cancel(subject);
                Answer::Declined
            }
        },
        Some(event) = board.next_event() => match board.handle_event(event) {
            BoardUpdate::Disarmed { reason: DisarmReason::Expired, .. } => Answer::TimedOut,
            other => anyhow::bail!("unexpected gate update: {other:?}"),
        },
        _ = tokio::signal::ctrl_c() => {
            writeln!(out)?;
            return Ok(3);
        }
    };

    match answer {
        Answer::Confirmed => {}
        Answer::Declined => {
            writeln!(out, "cancelled, nothing deleted")?;
            return Ok(1);
        }
        Answer::TimedOut => {
            writeln!(out, "\nconfirmation timed out, nothing deleted")?;
            return Ok(1);
        }
    }

    let update = tokio::select! {
        Some(event) = board.next_event() => board.handle_event(event),
        _ = tokio::signal::ctrl_c() => {
            writeln!(out)?;
            return Ok(3);
        }
    };
    match update {
        BoardUpdate::Succeeded(success) => {
            writeln!(out, "{}", success.summary)?;
            Ok(0)
        }
        BoardUpdate::Failed(failure) => {
            writeln!(out, "error: {}", failure.message)?;
            Ok(1)
        }
        other => anyhow::bail!("unexpected gate update: {other:?}"),
    }
}

enum Answer {
    Confirmed,
    Declined,
    TimedOut,
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes"
    )
}
