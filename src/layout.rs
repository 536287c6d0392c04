use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, Rectangle, RoundedRectangle};

use crate::framebuffer::Framebuffer;

/// Convert 8-bit RGB to Rgb565.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

// ── Background colors ───────────────────────────────────────────────

pub const BG_DASHBOARD: Rgb565 = rgb(27, 31, 39);
pub const BG_SPLASH: Rgb565 = rgb(20, 24, 32);

// ── Line / card colors ──────────────────────────────────────────────

pub const LINE_COLOR: Rgb565 = rgb(56, 63, 76);
pub const CARD_FILL_SERVICES: Rgb565 = rgb(20, 25, 35);
pub const CARD_BORDER_SERVICES: Rgb565 = rgb(63, 75, 95);

// ── Text colors ─────────────────────────────────────────────────────

pub const TEXT_CLOCK: Rgb565 = rgb(232, 235, 240);
pub const TEXT_DATE: Rgb565 = rgb(166, 208, 255);
pub const TEXT_PRIMARY: Rgb565 = rgb(225, 228, 233);
pub const TEXT_SECONDARY: Rgb565 = rgb(188, 196, 208);
pub const TEXT_OFFLINE: Rgb565 = rgb(255, 140, 120);
pub const TEXT_DEBUG: Rgb565 = rgb(140, 148, 160);
pub const TEXT_SPLASH_TITLE: Rgb565 = rgb(224, 228, 248);
pub const TEXT_SPLASH_STATUS: Rgb565 = rgb(98, 114, 112);

// ── Service state colors ────────────────────────────────────────────

pub const SERVICE_UP: Rgb565 = rgb(76, 217, 100);
pub const SERVICE_DOWN: Rgb565 = rgb(255, 69, 58);

// ── Layout constants ────────────────────────────────────────────────

pub const SCREEN_W: i32 = 320;
pub const SCREEN_H: i32 = 240;

pub const MARGIN: i32 = 8;

// Header: clock on the left, face on the right.
pub const CLOCK_BASELINE_Y: i32 = 36;
pub const DATE_X: i32 = 100;
pub const FACE_CENTER_X: i32 = SCREEN_W - 34;
pub const FACE_CENTER_Y: i32 = 27;
pub const FACE_DIAMETER: u32 = 44;
pub const HEADER_LINE_Y: i32 = 54;

// Service card
pub const SERVICES_CARD_Y: i32 = 60;
pub const SERVICES_CARD_H: i32 = 104;
pub const SERVICE_ROW_FIRST_BASELINE: i32 = 82;
pub const SERVICE_ROW_STRIDE: i32 = 24;
pub const SERVICE_DOT_X: i32 = 24;
pub const SERVICE_DOT_DIAMETER: u32 = 12;
pub const SERVICE_NAME_X: i32 = 40;

// Bottom text
pub const BOTTOM_LINE_BASELINE: i32 = 190;
pub const WORD_LINE_BASELINE: i32 = 212;

// Debug footer
pub const DEBUG_IP_BASELINE: i32 = 227;
pub const DEBUG_RENDER_BASELINE: i32 = 238;

// ── Helpers ─────────────────────────────────────────────────────────

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Fill a horizontal line across the full screen width.
pub fn draw_hline(fb: &mut Framebuffer, y: i32, color: Rgb565) {
    let style = PrimitiveStyleBuilder::new().fill_color(color).build();
    Rectangle::new(Point::new(0, y), Size::new(SCREEN_W as u32, 1))
        .into_styled(style)
        .draw(fb)
        .ok();
}

/// Draw a filled rounded rectangle with a 1px border (card style).
pub fn draw_card(fb: &mut Framebuffer, area: Rectangle, radius: u32, fill: Rgb565, border: Rgb565) {
    let style = PrimitiveStyleBuilder::new()
        .fill_color(fill)
        .stroke_color(border)
        .stroke_width(1)
        .build();
    RoundedRectangle::with_equal_corners(area, Size::new(radius, radius))
        .into_styled(style)
        .draw(fb)
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("abc", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("héllo wörld", 7), "héllo w");
        assert_eq!(truncate("", 5), "");
    }

    #[test]
    fn rows_fit_inside_the_services_card() {
        let last_baseline = SERVICE_ROW_FIRST_BASELINE + 3 * SERVICE_ROW_STRIDE;
        assert!(last_baseline < SERVICES_CARD_Y + SERVICES_CARD_H);
        assert!(SERVICES_CARD_Y + SERVICES_CARD_H < BOTTOM_LINE_BASELINE - 18);
        assert!(DEBUG_RENDER_BASELINE < SCREEN_H);
    }
}
