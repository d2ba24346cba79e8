pub mod debounce;
pub mod fingerprint;
#[cfg(target_os = "macos")]
pub mod monitor;
#[cfg(target_os = "macos")]
pub mod screen;
pub mod topology;

pub use debounce::DebounceHandle;
pub use fingerprint::{compute as compute_fingerprint, Fingerprint};
pub use topology::{DisplayDescriptor, SharedTopology, TopologySource};
