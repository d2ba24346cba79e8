//! Collapses bursts of display-change notifications into one trigger.
//!
//! Every poke restarts the settle window; the callback fires once the window
//! elapses with no further pokes. Hot-plugging a monitor typically produces
//! several screen-parameter notifications in quick succession.

use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

/// Handle used to report raw change notifications.
#[derive(Debug, Clone)]
pub struct DebounceHandle {
    tx: Sender<()>,
}

impl DebounceHandle {
    pub fn poke(&self) {
        let _ = self.tx.send(());
    }
}

/// Spawns the debounce thread. The thread exits once every handle is dropped,
/// flushing a pending trigger first.
pub fn spawn<F>(
    window: Duration,
    mut on_settled: F,
) -> std::io::Result<(DebounceHandle, JoinHandle<()>)>
where
    F: FnMut() + Send + 'static,
{
    let (tx, rx) = channel::<()>();

    let thread = std::thread::Builder::new()
        .name("display-debounce".into())
        .spawn(move || {
            // Wait for the first event of a burst.
            while rx.recv().is_ok() {
                loop {
                    match rx.recv_timeout(window) {
                        Ok(()) => continue,
                        Err(RecvTimeoutError::Timeout) => {
                            log::debug!("Display changes settled after {:?}", window);
                            on_settled();
                            break;
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            on_settled();
                            return;
                        }
                    }
                }
            }
        })?;

    Ok((DebounceHandle { tx }, thread))
}
