//! Drives admissions into a running registry.

use std::io::BufRead;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use usreg_core::events::{Channel, ChannelError, IntakeSender};
use usreg_core::messaging::{read_message, send_message};
use usreg_core::{Registry, RegistryError};

/// Send each identifier through the registry's intake, in order.
pub async fn admit_all(registry: &Registry, users: &[String]) -> Result<(), RegistryError> {
    for user in users {
        registry.admit(user.as_str()).await?;
    }
    Ok(())
}

/// Read standard input on a dedicated thread, one line per message.
///
/// A blocking thread keeps an unfinished read from holding up runtime
/// shutdown.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read standard input");
                    break;
                }
            }
        }
    });
    rx
}

/// Admit every identifier read from standard input until end of input.
///
/// Returns the number of identifiers admitted.
pub async fn admit_from_stdin(intake: IntakeSender) -> Result<usize, ChannelError> {
    admit_lines(&intake, stdin_lines()).await
}

/// Admit each non-empty line through `intake`. Trailing carriage returns are
/// stripped; everything else is kept byte for byte.
pub async fn admit_lines(
    intake: &IntakeSender,
    mut lines: mpsc::Receiver<String>,
) -> Result<usize, ChannelError> {
    let mut admitted = 0;
    while let Some(line) = lines.recv().await {
        let user = line.strip_suffix('\r').unwrap_or(&line);
        if user.is_empty() {
            continue;
        }
        debug!(user, "Admitting user from standard input");
        intake.send(user.to_string()).await?;
        admitted += 1;
    }
    Ok(admitted)
}

/// Pair the message helpers on a fresh channel; prints `hello`.
pub async fn greet() {
    let (tx, mut rx) = Channel::<String>::new().split();
    tokio::join!(send_message(&tx), read_message(&mut rx));
}
