/// Edge length of the tray icon in pixels (standard macOS menu bar size).
pub const ICON_SIZE: u32 = 22;

/// Icon variant for different states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconVariant {
    Normal,
    /// The last action was rejected or settings failed to load.
    Attention,
}

impl IconVariant {
    fn color(self) -> (u8, u8, u8) {
        match self {
            IconVariant::Normal => (40, 40, 40),
            IconVariant::Attention => (220, 90, 40),
        }
    }
}

/// Draws a ring with a vertical bar through its gap, a power-button glyph.
pub fn render_pixels(variant: IconVariant) -> Vec<u8> {
    let size = ICON_SIZE as i32;
    let mut pixels = vec![0u8; (size * size * 4) as usize];
    let (r, g, b) = variant.color();

    let mut draw_pixel = |x: i32, y: i32, alpha: u8| {
        if x >= 0 && x < size && y >= 0 && y < size {
            let idx = ((y * size + x) * 4) as usize;
            pixels[idx] = r;
            pixels[idx + 1] = g;
            pixels[idx + 2] = b;
            pixels[idx + 3] = alpha;
        }
    };

    // Ring, open at the top
    for angle in 0..360 {
        if (240..=300).contains(&angle) {
            continue;
        }
        let rad = (angle as f32).to_radians();
        for radius in [7.0f32, 8.0] {
            let x = 11 + (radius * rad.cos()).round() as i32;
            let y = 11 + (radius * rad.sin()).round() as i32;
            draw_pixel(x, y, 255);
        }
    }

    // Bar
    for y in 2..=11 {
        for x in 10..=11 {
            draw_pixel(x, y, 255);
        }
    }

    pixels
}

#[cfg(any(target_os = "macos", target_os = "windows"))]
pub fn create_icon(variant: IconVariant) -> anyhow::Result<tray_icon::Icon> {
    tray_icon::Icon::from_rgba(render_pixels(variant), ICON_SIZE, ICON_SIZE)
        .map_err(|e| anyhow::anyhow!("failed to create icon: {e}"))
}
