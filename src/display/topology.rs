//! Attached-display descriptors and the sources that report them.

use std::sync::{Arc, RwLock};

/// One attached display as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDescriptor {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl DisplayDescriptor {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// Canonical `<name>_<width>x<height>` rendering used for fingerprinting.
    pub fn canonical(&self) -> String {
        format!("{}_{}x{}", self.name, self.width, self.height)
    }
}

/// Synchronous query for the current set of displays.
pub trait TopologySource: Send {
    fn displays(&self) -> Vec<DisplayDescriptor>;
}

/// Latest display list published by the thread that owns the OS screen API.
///
/// AppKit only answers screen queries on the main thread, so the monitor
/// refreshes this snapshot there and the engine reads it from its own thread.
#[derive(Debug, Clone, Default)]
pub struct SharedTopology {
    inner: Arc<RwLock<Vec<DisplayDescriptor>>>,
}

impl SharedTopology {
    pub fn replace(&self, displays: Vec<DisplayDescriptor>) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = displays;
        }
    }
}

impl TopologySource for SharedTopology {
    fn displays(&self) -> Vec<DisplayDescriptor> {
        self.inner.read().map(|v| v.clone()).unwrap_or_default()
    }
}
