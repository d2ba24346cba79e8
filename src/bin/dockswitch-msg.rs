//! Sends one command to a running DockSwitch and prints the reply

use std::env;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

use dockswitch::ipc::socket_path;

fn usage() -> ! {
    eprintln!("Usage: dockswitch-msg <command> [args...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status                          Current layout and status (JSON)");
    eprintln!("  list                            Saved layouts (JSON)");
    eprintln!("  fingerprint                     Fingerprint of the attached displays");
    eprintln!("  save <bottom|left|right> [name] Save the Dock edge for this layout");
    eprintln!("  delete <index>                  Delete a saved layout");
    eprintln!("  quit                            Stop DockSwitch");
    std::process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || matches!(args[0].as_str(), "-h" | "--help") {
        usage();
    }

    let command = args.join(" ");
    let socket = socket_path();

    let mut stream = match UnixStream::connect(&socket) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Failed to connect to DockSwitch at {:?}: {}", socket, e);
            eprintln!("Is DockSwitch running?");
            std::process::exit(1);
        }
    };

    if let Err(e) = writeln!(stream, "{}", command) {
        eprintln!("Failed to send command: {}", e);
        std::process::exit(1);
    }

    let mut response = String::new();
    if let Err(e) = BufReader::new(stream).read_line(&mut response) {
        eprintln!("Failed to read response: {}", e);
        std::process::exit(1);
    }

    let response = response.trim();
    println!("{}", response);
    if response.starts_with("ERR:") {
        std::process::exit(2);
    }
}
