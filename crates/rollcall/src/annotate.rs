//! On-frame annotation for accepted matches: hollow box, filled label bar,
//! bitmap-font name.

use rollcall_core::FaceLocation;
use rollcall_hw::Frame;

use crate::font;

const BOX_COLOR: (u8, u8, u8) = (0, 220, 60);
const TEXT_COLOR: (u8, u8, u8) = (255, 255, 255);
const BOX_THICKNESS: i64 = 2;
const LABEL_BAR_HEIGHT: i64 = 24;
const TEXT_SCALE: u32 = 2;
const TEXT_INSET: i64 = 6;

/// Draw the face box and name label onto `frame`. `location` must already be
/// in the frame's own coordinate space; parts outside the frame are clipped.
pub fn draw_match(frame: &mut Frame, location: &FaceLocation, label: &str) {
    let left = location.left.round() as i64;
    let top = location.top.round() as i64;
    let right = location.right.round() as i64;
    let bottom = location.bottom.round() as i64;

    draw_box(frame, left, top, right, bottom);

    // Filled bar along the bottom edge, inside the box; widened when the
    // name would not fit.
    let bar_top = bottom - LABEL_BAR_HEIGHT;
    let text_w = font::text_width(label, TEXT_SCALE) as i64;
    let bar_right = right.max(left + TEXT_INSET + text_w + TEXT_INSET);
    fill_rect(frame, left, bar_top, bar_right, bottom, BOX_COLOR);

    let text_h = (font::GLYPH_HEIGHT as u32 * TEXT_SCALE) as i64;
    let text_y = bar_top + (LABEL_BAR_HEIGHT - text_h) / 2;
    draw_text(frame, left + TEXT_INSET, text_y, label, TEXT_COLOR, TEXT_SCALE);
}

fn draw_box(frame: &mut Frame, left: i64, top: i64, right: i64, bottom: i64) {
    fill_rect(frame, left, top, right, top + BOX_THICKNESS, BOX_COLOR);
    fill_rect(frame, left, bottom - BOX_THICKNESS, right, bottom, BOX_COLOR);
    fill_rect(frame, left, top, left + BOX_THICKNESS, bottom, BOX_COLOR);
    fill_rect(frame, right - BOX_THICKNESS, top, right, bottom, BOX_COLOR);
}

fn fill_rect(frame: &mut Frame, left: i64, top: i64, right: i64, bottom: i64, color: (u8, u8, u8)) {
    let x0 = left.clamp(0, frame.width as i64);
    let x1 = right.clamp(0, frame.width as i64);
    let y0 = top.clamp(0, frame.height as i64);
    let y1 = bottom.clamp(0, frame.height as i64);
    for y in y0..y1 {
        for x in x0..x1 {
            put_pixel(frame, x, y, color);
        }
    }
}

fn draw_text(frame: &mut Frame, x: i64, y: i64, text: &str, color: (u8, u8, u8), scale: u32) {
    let advance = ((font::GLYPH_WIDTH + font::GLYPH_SPACING) as u32 * scale) as i64;
    let mut cx = x;
    for c in text.chars() {
        draw_glyph(frame, cx, y, c, color, scale);
        cx += advance;
    }
}

fn draw_glyph(frame: &mut Frame, x: i64, y: i64, c: char, color: (u8, u8, u8), scale: u32) {
    let rows = font::glyph(c);
    let scale = scale as i64;
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..font::GLYPH_WIDTH {
            if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            let px = x + col as i64 * scale;
            let py = y + row as i64 * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    put_pixel(frame, px + dx, py + dy, color);
                }
            }
        }
    }
}

fn put_pixel(frame: &mut Frame, x: i64, y: i64, color: (u8, u8, u8)) {
    if x < 0 || y < 0 || x >= frame.width as i64 || y >= frame.height as i64 {
        return;
    }
    let i = ((y as u32 * frame.width + x as u32) * 3) as usize;
    frame.data[i] = color.0;
    frame.data[i + 1] = color.1;
    frame.data[i + 2] = color.2;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_frame(width: u32, height: u32) -> Frame {
        Frame {
            data: vec![0; (width * height * 3) as usize],
            width,
            height,
            sequence: 0,
        }
    }

    fn location(left: f32, top: f32, right: f32, bottom: f32) -> FaceLocation {
        FaceLocation {
            top,
            right,
            bottom,
            left,
            confidence: 1.0,
        }
    }

    #[test]
    fn test_box_edges_painted() {
        let mut frame = black_frame(200, 200);
        draw_match(&mut frame, &location(40.0, 40.0, 160.0, 160.0), "A");
        assert_eq!(frame.pixel(100, 40), BOX_COLOR); // top edge
        assert_eq!(frame.pixel(40, 100), BOX_COLOR); // left edge
        assert_eq!(frame.pixel(159, 100), BOX_COLOR); // right edge
    }

    #[test]
    fn test_label_bar_filled() {
        let mut frame = black_frame(200, 200);
        draw_match(&mut frame, &location(40.0, 40.0, 160.0, 160.0), "A");
        // Middle of the bar region, away from the glyph.
        assert_eq!(frame.pixel(150, 150), BOX_COLOR);
    }

    #[test]
    fn test_label_text_painted_white() {
        let mut frame = black_frame(200, 200);
        draw_match(&mut frame, &location(40.0, 40.0, 160.0, 160.0), "H");
        // 'H' has its full left column set; with inset 6 and scale 2 the
        // glyph starts at x = 46 inside the bar.
        let bar_top = 160 - 24;
        let text_y = bar_top + (24 - 14) / 2;
        assert_eq!(frame.pixel(46, text_y as u32), TEXT_COLOR);
    }

    #[test]
    fn test_interior_left_untouched() {
        let mut frame = black_frame(200, 200);
        draw_match(&mut frame, &location(40.0, 40.0, 160.0, 160.0), "A");
        // Center of the box, above the label bar, stays black.
        assert_eq!(frame.pixel(100, 100), (0, 0, 0));
    }

    #[test]
    fn test_fully_out_of_bounds_location_no_panic() {
        let mut frame = black_frame(64, 64);
        draw_match(&mut frame, &location(-500.0, -500.0, -400.0, -400.0), "LONG NAME");
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_partially_visible_location_is_clipped() {
        let mut frame = black_frame(64, 64);
        // Box hangs off the left and right edges; only its top row is visible.
        draw_match(&mut frame, &location(-50.0, -1.0, 300.0, 300.0), "LONG NAME");
        assert_eq!(frame.pixel(10, 0), BOX_COLOR);
    }

    #[test]
    fn test_degenerate_box_no_panic() {
        let mut frame = black_frame(64, 64);
        draw_match(&mut frame, &location(10.0, 10.0, 10.0, 10.0), "A");
    }
}
