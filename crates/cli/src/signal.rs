//! Exit signal: Enter on stdin, Ctrl+C / SIGTERM, or an optional deadline

use std::io::BufRead;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Resolve when the session should end
///
/// A closed stdin (EOF) does not end the session; it then runs until a
/// signal or the deadline.
pub async fn exit_signal(deadline: Option<Duration>) {
    let timer = async {
        match deadline {
            Some(deadline) => tokio::time::sleep(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = wait_for_enter() => info!("Enter pressed"),
        _ = setup_shutdown_signal() => warn!("Received shutdown signal"),
        _ = timer => info!("Session duration elapsed"),
    }
}

/// Wait for one line on stdin
///
/// Reads on a detached thread so a pending read never holds up runtime
/// shutdown.
async fn wait_for_enter() {
    let (tx, rx) = oneshot::channel();

    let spawned = std::thread::Builder::new()
        .name("stdin-exit".into())
        .spawn(move || {
            let mut line = String::new();
            match std::io::stdin().lock().read_line(&mut line) {
                Ok(n) if n > 0 => {
                    let _ = tx.send(());
                }
                Ok(_) => debug!("stdin closed, waiting for a signal instead"),
                Err(e) => debug!(error = %e, "stdin unreadable, waiting for a signal instead"),
            }
        });

    if let Err(e) = spawned {
        warn!(error = %e, "Failed to spawn stdin reader");
        return std::future::pending().await;
    }

    if rx.await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
