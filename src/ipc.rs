//! Control socket: the presentation layer for a running DockSwitch.
//!
//! One command per connection, one line of reply. Reads are served from the
//! latest engine snapshot; edits are queued onto the engine's channel.
//!
//! ```text
//! status                          JSON snapshot
//! list                            JSON array of saved layouts
//! fingerprint                     current display fingerprint
//! save <bottom|left|right> [name] save the current layout and apply it
//! delete <index>                  delete a saved layout
//! quit                            stop DockSwitch
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_channel::Sender;

use crate::dock::DockPosition;
use crate::engine::{EngineEvent, Snapshot};

/// How long a connected client may take to send its command line.
const CLIENT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Latest snapshot published by the engine subscription.
pub type SharedSnapshot = Arc<RwLock<Snapshot>>;

pub fn socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("dockswitch.sock")
}

/// Handle the socket uses to read state and issue commands.
#[derive(Clone)]
pub struct Control {
    events: Sender<EngineEvent>,
    snapshot: SharedSnapshot,
}

impl Control {
    pub fn new(events: Sender<EngineEvent>, snapshot: SharedSnapshot) -> Self {
        Self { events, snapshot }
    }

    /// Parses and dispatches a single command line, returning the reply.
    pub fn handle_command(&self, command: &str) -> String {
        let trimmed = command.trim();
        let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
        let verb = parts.first().copied().unwrap_or("");
        let args = parts.get(1).copied().unwrap_or("").trim();

        match verb {
            "status" => self.handle_status(),
            "list" => self.handle_list(),
            "fingerprint" => self.read(|s| s.fingerprint.to_string()),
            "save" => self.handle_save(args),
            "delete" => self.handle_delete(args),
            "quit" => self.push(EngineEvent::Shutdown, "OK: quitting"),
            "" => "ERR: empty command".to_string(),
            other => format!("ERR: unknown command '{}'", other),
        }
    }

    fn handle_status(&self) -> String {
        self.read(|s| {
            let status = serde_json::json!({
                "version": crate::VERSION,
                "fingerprint": s.fingerprint,
                "status": s.status,
                "current": s.current.as_ref().map(|p| &p.name),
                "saved": s.preferences.len(),
            });
            status.to_string()
        })
    }

    fn handle_list(&self) -> String {
        self.read(|s| {
            let entries: Vec<serde_json::Value> = s
                .preferences
                .iter()
                .enumerate()
                .map(|(index, p)| {
                    serde_json::json!({
                        "index": index,
                        "id": p.fingerprint,
                        "name": p.name,
                        "dockPosition": p.position,
                        "current": p.fingerprint == s.fingerprint,
                    })
                })
                .collect();
            serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
        })
    }

    /// `save <position> [name ...]`
    fn handle_save(&self, args: &str) -> String {
        let (position, name) = match args.split_once(' ') {
            Some((position, name)) => (position, name.trim()),
            None => (args, ""),
        };
        if position.is_empty() {
            return "ERR: save requires <bottom|left|right> [name]".to_string();
        }
        let position = match position.parse::<DockPosition>() {
            Ok(position) => position,
            Err(e) => return format!("ERR: {}", e),
        };

        self.push(
            EngineEvent::SaveOrUpdate {
                name: name.to_string(),
                position,
            },
            "OK: saving",
        )
    }

    /// `delete <index>`
    fn handle_delete(&self, args: &str) -> String {
        if args.is_empty() {
            return "ERR: delete requires <index>".to_string();
        }
        let Ok(index) = args.parse::<usize>() else {
            return format!("ERR: invalid index '{}'", args);
        };
        let saved = self.read_len();
        if index >= saved {
            return format!("ERR: no saved layout at index {} ({} saved)", index, saved);
        }
        self.push(EngineEvent::Delete { index }, "OK: deleting")
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        match self.snapshot.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn read_len(&self) -> usize {
        self.read(|s| s.preferences.len())
    }

    fn push(&self, event: EngineEvent, ok: &str) -> String {
        match self.events.try_send(event) {
            Ok(()) => ok.to_string(),
            Err(_) => "ERR: engine is not running".to_string(),
        }
    }
}

/// Starts the control listener on a Unix socket, spawning a background thread.
///
/// Fails with `AddrInUse` when another instance already answers on the socket.
pub fn start_ipc_listener(socket_path: &Path, control: Control) -> std::io::Result<()> {
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::{UnixListener, UnixStream};

    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let listener = match UnixListener::bind(socket_path) {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            if UnixStream::connect(socket_path).is_ok() {
                return Err(err);
            }
            let _ = std::fs::remove_file(socket_path);
            UnixListener::bind(socket_path)?
        }
        Err(err) => return Err(err),
    };

    std::thread::Builder::new()
        .name("ipc".into())
        .spawn(move || {
            for stream in listener.incoming().flatten() {
                if let Err(e) = stream.set_read_timeout(Some(CLIENT_READ_TIMEOUT)) {
                    log::warn!("Failed to set control client timeout: {}", e);
                    continue;
                }
                let mut reader = BufReader::new(stream);
                let mut line = String::new();
                if let Err(e) = reader.read_line(&mut line) {
                    log::debug!("Dropping control client: {}", e);
                    continue;
                }
                let response = control.handle_command(&line);
                if let Ok(mut stream) = reader.into_inner().try_clone() {
                    let _ = writeln!(stream, "{}", response);
                }
            }
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Fingerprint;
    use crate::engine::Status;
    use crate::store::LayoutPreference;

    fn control_with(snapshot: Snapshot) -> (Control, async_channel::Receiver<EngineEvent>) {
        let (tx, rx) = async_channel::unbounded();
        (Control::new(tx, Arc::new(RwLock::new(snapshot))), rx)
    }

    fn sample() -> Snapshot {
        let prefs = vec![
            LayoutPreference {
                fingerprint: Fingerprint::from("A"),
                name: "Office".into(),
                position: DockPosition::Left,
            },
            LayoutPreference {
                fingerprint: Fingerprint::from("B"),
                name: "Home".into(),
                position: DockPosition::Bottom,
            },
        ];
        Snapshot {
            fingerprint: Fingerprint::from("B"),
            status: Status::Switched(DockPosition::Bottom),
            current: Some(prefs[1].clone()),
            preferences: prefs,
        }
    }

    // -- reads --------------------------------------------------------------

    #[test]
    fn status_returns_json() {
        let (control, _rx) = control_with(sample());
        let parsed: serde_json::Value =
            serde_json::from_str(&control.handle_command("status\n")).unwrap();
        assert_eq!(parsed["fingerprint"], "B");
        assert_eq!(parsed["status"], "switched to bottom");
        assert_eq!(parsed["current"], "Home");
        assert_eq!(parsed["saved"], 2);
    }

    #[test]
    fn list_returns_indexed_array() {
        let (control, _rx) = control_with(sample());
        let parsed: serde_json::Value =
            serde_json::from_str(&control.handle_command("list")).unwrap();
        let entries = parsed.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["index"], 0);
        assert_eq!(entries[0]["name"], "Office");
        assert_eq!(entries[0]["dockPosition"], "left");
        assert_eq!(entries[0]["current"], false);
        assert_eq!(entries[1]["current"], true);
    }

    #[test]
    fn list_empty() {
        let (control, _rx) = control_with(Snapshot::default());
        assert_eq!(control.handle_command("list"), "[]");
    }

    #[test]
    fn fingerprint_returns_raw_value() {
        let (control, _rx) = control_with(sample());
        assert_eq!(control.handle_command("fingerprint"), "B");
    }

    // -- save ---------------------------------------------------------------

    #[test]
    fn save_with_name_queues_event() {
        let (control, rx) = control_with(sample());
        assert_eq!(control.handle_command("save left Office desk"), "OK: saving");
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::SaveOrUpdate {
                name: "Office desk".into(),
                position: DockPosition::Left,
            }
        );
    }

    #[test]
    fn save_without_name() {
        let (control, rx) = control_with(sample());
        assert_eq!(control.handle_command("save right"), "OK: saving");
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::SaveOrUpdate {
                name: String::new(),
                position: DockPosition::Right,
            }
        );
    }

    #[test]
    fn save_missing_position() {
        let (control, rx) = control_with(sample());
        let resp = control.handle_command("save");
        assert!(resp.starts_with("ERR:"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn save_invalid_position() {
        let (control, rx) = control_with(sample());
        let resp = control.handle_command("save top Office");
        assert!(resp.starts_with("ERR:"));
        assert!(resp.contains("top"));
        assert!(rx.try_recv().is_err());
    }

    // -- delete -------------------------------------------------------------

    #[test]
    fn delete_queues_event() {
        let (control, rx) = control_with(sample());
        assert_eq!(control.handle_command("delete 1"), "OK: deleting");
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::Delete { index: 1 });
    }

    #[test]
    fn delete_rejects_bad_index() {
        let (control, rx) = control_with(sample());
        assert!(control.handle_command("delete").starts_with("ERR:"));
        assert!(control.handle_command("delete one").contains("invalid index"));
        assert!(control.handle_command("delete 2").contains("no saved layout"));
        assert!(rx.try_recv().is_err());
    }

    // -- misc ---------------------------------------------------------------

    #[test]
    fn quit_queues_shutdown() {
        let (control, rx) = control_with(sample());
        assert_eq!(control.handle_command("quit"), "OK: quitting");
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::Shutdown);
    }

    #[test]
    fn unknown_and_empty_commands() {
        let (control, _rx) = control_with(sample());
        assert_eq!(control.handle_command("frobnicate"), "ERR: unknown command 'frobnicate'");
        assert_eq!(control.handle_command("  \n"), "ERR: empty command");
    }

    #[test]
    fn closed_engine_reports_error() {
        let (control, rx) = control_with(sample());
        drop(rx);
        assert_eq!(control.handle_command("quit"), "ERR: engine is not running");
    }

    #[test]
    fn socket_round_trip() {
        use std::io::{BufRead, BufReader, Write};
        use std::os::unix::net::UnixStream;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dockswitch.sock");
        let (control, _rx) = control_with(sample());
        start_ipc_listener(&path, control).unwrap();

        let mut stream = UnixStream::connect(&path).unwrap();
        writeln!(stream, "fingerprint").unwrap();
        let mut reply = String::new();
        BufReader::new(stream).read_line(&mut reply).unwrap();
        assert_eq!(reply.trim(), "B");
    }

    #[test]
    fn silent_client_does_not_block_later_commands() {
        use std::io::{BufRead, BufReader, Write};
        use std::os::unix::net::UnixStream;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dockswitch.sock");
        let (control, _rx) = control_with(sample());
        start_ipc_listener(&path, control).unwrap();

        let _silent = UnixStream::connect(&path).unwrap();

        let mut stream = UnixStream::connect(&path).unwrap();
        stream
            .set_read_timeout(Some(CLIENT_READ_TIMEOUT * 5))
            .unwrap();
        writeln!(stream, "fingerprint").unwrap();
        let mut reply = String::new();
        BufReader::new(stream).read_line(&mut reply).unwrap();
        assert_eq!(reply.trim(), "B");
    }
}
