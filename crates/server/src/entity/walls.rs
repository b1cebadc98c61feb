//! Static wall layout.
//!
//! Four border walls sized from the map config plus a fixed interior
//! layout tuned for the default 600x400 map. Every passage is at least
//! 40px wide so a 30px player can always get through; spawn regions are
//! reachable by construction and this is not re-verified at runtime.

use crate::collision::Rect;
use crate::config::MapConfig;

/// Build the standard navigable wall layout.
pub fn standard_layout(map: &MapConfig) -> Vec<Rect> {
    let w = map.width;
    let h = map.height;
    let t = map.wall_thickness;

    vec![
        // Border walls
        Rect::new(0.0, 0.0, w, t),
        Rect::new(0.0, h - t, w, t),
        Rect::new(0.0, 0.0, t, h),
        Rect::new(w - t, 0.0, t, h),
        // Upper section
        Rect::new(60.0, 60.0, 100.0, t),
        Rect::new(220.0, 40.0, t, 70.0),
        Rect::new(320.0, 60.0, 100.0, t),
        Rect::new(480.0, 40.0, t, 70.0),
        // Upper-middle section
        Rect::new(80.0, 150.0, 80.0, t),
        Rect::new(260.0, 130.0, t, 50.0),
        Rect::new(340.0, 150.0, 100.0, t),
        // Middle section, staggered passages
        Rect::new(40.0, 210.0, 80.0, t),
        Rect::new(200.0, 190.0, t, 50.0),
        Rect::new(320.0, 210.0, 80.0, t),
        Rect::new(480.0, 190.0, t, 50.0),
        // Lower-middle section
        Rect::new(60.0, 270.0, 70.0, t),
        Rect::new(200.0, 290.0, t, 50.0),
        Rect::new(320.0, 270.0, 70.0, t),
        Rect::new(460.0, 290.0, t, 50.0),
        // Lower section
        Rect::new(100.0, 350.0, 70.0, t),
        Rect::new(260.0, 330.0, t, 30.0),
        Rect::new(380.0, 350.0, 80.0, t),
    ]
}
