//! Watches AppKit for screen-parameter changes (attach, detach, resolution).

use std::ptr::NonNull;

use block2::RcBlock;
use objc2::MainThreadMarker;
use objc2_foundation::{NSNotification, NSNotificationCenter, NSString};

use super::debounce::DebounceHandle;
use super::screen::current_displays;
use super::topology::SharedTopology;

/// Publishes the initial display list and subscribes to change notifications.
/// Must be called from the main thread before the application run loop starts.
pub fn start_monitoring(
    mtm: MainThreadMarker,
    topology: SharedTopology,
    debounce: DebounceHandle,
) {
    let initial = current_displays(mtm);
    log::info!("Initial display layout: {} screen(s)", initial.len());
    topology.replace(initial);

    let notification_center = NSNotificationCenter::defaultCenter();
    let name = NSString::from_str("NSApplicationDidChangeScreenParametersNotification");

    let block = RcBlock::new(move |_notification: NonNull<NSNotification>| {
        let displays = current_displays(mtm);
        log::debug!("Screen parameters changed: {} screen(s)", displays.len());
        topology.replace(displays);
        debounce.poke();
    });

    unsafe {
        let _ = notification_center.addObserverForName_object_queue_usingBlock(
            Some(&name),
            None,
            None,
            &block,
        );
    }

    log::info!("Display monitor started");
}
