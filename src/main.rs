use std::sync::{Arc, RwLock};
use std::time::Duration;

use dockswitch::display::{self, SharedTopology};
use dockswitch::dock::{ActionExecutor, AppleScriptDock, AppleScriptPrompt, Remediation};
use dockswitch::engine::{EngineEvent, ReconciliationEngine};
use dockswitch::ipc::{self, Control, SharedSnapshot};
use dockswitch::persist::FileStore;
use dockswitch::store::PreferenceStore;
use dockswitch::{config, VERSION};

/// Removes the Unix socket file on process exit.
fn install_socket_cleanup(socket: std::path::PathBuf) {
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = std::fs::remove_file(&socket);
        std::process::exit(0);
    }) {
        log::warn!("Failed to install signal handler: {}", e);
    }
}

fn print_help() {
    println!(
        "dockswitch {}
Moves the macOS Dock to a saved screen edge whenever the display layout changes

USAGE:
    dockswitch [OPTIONS]

OPTIONS:
    -h, --help       Print this help message
    -v, --version    Print version information

ENVIRONMENT:
    RUST_LOG         Set log level (error, warn, info, debug, trace)

CONFIG:
    ~/.config/dockswitch/config.toml

CONTROL:
    dockswitch-msg status               Show the current layout and status
    dockswitch-msg save left Office     Save the Dock edge for this layout",
        VERSION
    );
}

fn init_logging() {
    // Flush each line for interactive debugging.
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    logger
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {:>5} {}] {}",
                chrono::Utc::now().to_rfc3339(),
                record.level(),
                record.target(),
                record.args()
            )?;
            buf.flush()
        })
        .init();
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if !args.is_empty() {
        // Only the first argument is processed (flags don't combine)
        match args[0].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-v" | "--version" => {
                println!("dockswitch {}", VERSION);
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[0]);
                eprintln!("Try 'dockswitch --help' for more information.");
                std::process::exit(1);
            }
        }
    }

    init_logging();
    log::info!("Starting DockSwitch v{}", VERSION);

    let config = config::load_config();

    let topology = SharedTopology::default();
    let Some(event_loop) = platform::EventLoop::init(&topology) else {
        log::error!("DockSwitch must be started on the main thread");
        std::process::exit(1);
    };

    let (events_tx, events_rx) = async_channel::unbounded::<EngineEvent>();

    let storage = FileStore::new(config::storage_dir(&config));
    log::info!("Saved layouts live in {:?}", storage.dir());
    let store = PreferenceStore::open(Box::new(storage));

    let dock = Arc::new(AppleScriptDock::new(Duration::from_secs(
        config.dock.script_timeout_secs,
    )));
    let remediation: Option<Box<dyn Remediation>> = if config.dock.permission_prompt {
        Some(Box::new(AppleScriptPrompt::new(config.dock.settings_url.clone())))
    } else {
        None
    };
    let executor = match ActionExecutor::new(dock, remediation, events_tx.clone()) {
        Ok(executor) => executor,
        Err(e) => {
            log::error!("Failed to start dock worker: {}", e);
            std::process::exit(1);
        }
    };

    let mut engine = ReconciliationEngine::new(store, Box::new(topology.clone()), executor);

    let snapshot: SharedSnapshot = Arc::new(RwLock::new(engine.snapshot()));
    let sink = Arc::clone(&snapshot);
    engine.subscribe(Box::new(move |s| {
        log::debug!("Status: {} ({} saved)", s.status, s.preferences.len());
        if let Ok(mut guard) = sink.write() {
            *guard = s.clone();
        }
    }));

    let socket = ipc::socket_path();
    match ipc::start_ipc_listener(&socket, Control::new(events_tx.clone(), snapshot)) {
        Ok(()) => log::info!("Control socket listening at {:?}", socket),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            eprintln!("DockSwitch is already running.");
            std::process::exit(0);
        }
        Err(err) => log::warn!("Failed to start control socket: {}", err),
    }
    install_socket_cleanup(socket.clone());

    let debounce_tx = events_tx.clone();
    let debounce_window = Duration::from_millis(config.general.debounce_ms);
    let (debounce, _debounce_thread) = match display::debounce::spawn(debounce_window, move || {
        let _ = debounce_tx.send_blocking(EngineEvent::TopologyChanged);
    }) {
        Ok(spawned) => spawned,
        Err(e) => {
            log::error!("Failed to start display debouncer: {}", e);
            std::process::exit(1);
        }
    };

    let engine_thread = match engine.spawn(events_rx) {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("Failed to start engine: {}", e);
            std::process::exit(1);
        }
    };
    let exit_socket = socket.clone();
    std::thread::spawn(move || {
        let _ = engine_thread.join();
        let _ = std::fs::remove_file(&exit_socket);
        log::info!("DockSwitch stopped");
        std::process::exit(0);
    });

    event_loop.run(topology, debounce);
}

#[cfg(target_os = "macos")]
mod platform {
    use objc2::MainThreadMarker;
    use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};

    use dockswitch::display::{monitor, screen, DebounceHandle, SharedTopology};

    /// The AppKit run loop that delivers screen-change notifications.
    pub struct EventLoop {
        mtm: MainThreadMarker,
    }

    impl EventLoop {
        /// Sets DockSwitch up as a background (menu-bar style) app and publishes
        /// the initial display list.
        pub fn init(topology: &SharedTopology) -> Option<Self> {
            let mtm = MainThreadMarker::new()?;
            let app = NSApplication::sharedApplication(mtm);
            let _ = app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);
            topology.replace(screen::current_displays(mtm));
            Some(Self { mtm })
        }

        pub fn run(self, topology: SharedTopology, debounce: DebounceHandle) {
            monitor::start_monitoring(self.mtm, topology, debounce);
            let app = NSApplication::sharedApplication(self.mtm);
            #[allow(unused_unsafe)]
            unsafe {
                app.run();
            }
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    use dockswitch::display::{DebounceHandle, SharedTopology};

    /// Without AppKit there are no display notifications; only the control
    /// socket is served.
    pub struct EventLoop;

    impl EventLoop {
        pub fn init(_topology: &SharedTopology) -> Option<Self> {
            log::warn!("Display monitoring requires macOS; running with an empty display list");
            Some(Self)
        }

        pub fn run(self, _topology: SharedTopology, debounce: DebounceHandle) {
            let _debounce = debounce;
            loop {
                std::thread::park();
            }
        }
    }
}
