use objc2::MainThreadMarker;
use objc2_app_kit::NSScreen;

use super::topology::DisplayDescriptor;

/// Reads every attached screen's localized name and frame size (in points).
pub fn current_displays(mtm: MainThreadMarker) -> Vec<DisplayDescriptor> {
    NSScreen::screens(mtm)
        .iter()
        .map(|screen| {
            let frame = screen.frame();
            DisplayDescriptor::new(
                screen.localizedName().to_string(),
                frame.size.width as u32,
                frame.size.height as u32,
            )
        })
        .collect()
}
