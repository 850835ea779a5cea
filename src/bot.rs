use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;
use tracing::{info, warn};

use flockbot_client::{Session, SessionState, Transport};

use crate::config::BotConfig;

/// Drive the session until the room is abandoned, the server hangs up, or
/// the user interrupts, then shut down cleanly.
///
/// The probe timer races the blocking read, so an idle connection still
/// requests a bitmap every interval and stays visibly alive to its peers.
pub async fn run<T: Transport>(mut session: Session<T>, config: &BotConfig) -> Result<()> {
    let probe_interval = Duration::from_secs(config.probe_interval_secs.max(1));
    let mut next_probe = Instant::now();

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let outcome = loop {
        if session.is_abandoned() {
            info!("whiteboard abandoned, leaving");
            break Ok(());
        }
        if session.state() == SessionState::Closed {
            info!("server closed the connection, leaving");
            break Ok(());
        }

        // drive() is safe to cancel here: queued frames and partial lines
        // live in the session, and a cancelled read has consumed nothing.
        tokio::select! {
            _ = &mut interrupt => {
                info!("interrupt received, leaving");
                break Ok(());
            }
            _ = tokio::time::sleep_until(next_probe) => {
                if let Err(err) = session.try_obtain_bitmap() {
                    break Err(err);
                }
                next_probe = Instant::now() + probe_interval;
            }
            result = drive(&mut session) => {
                if let Err(err) = result {
                    break Err(err);
                }
            }
        }
    };

    // A failed connection still gets the orderly path (flush, close the
    // write half, drain the peer) before its error surfaces.
    let shutdown = session.shutdown().await;
    match outcome {
        Ok(()) => shutdown,
        Err(err) => {
            if let Err(shutdown_err) = shutdown {
                warn!("orderly shutdown failed too: {shutdown_err:#}");
            }
            Err(err)
        }
    }
}

/// One cooperative step: transmit queued frames, and read only once the
/// queue is empty, so outbound traffic is never starved by a chatty peer.
async fn drive<T: Transport>(session: &mut Session<T>) -> Result<()> {
    session.try_send().await?;
    if !session.has_queued_frames() {
        session.try_receive().await?;
    }
    Ok(())
}
