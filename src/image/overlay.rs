use crate::recognition::HandDetection;
use crate::utils::error::SignError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// 手部骨架连接（21 点拓扑）
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (0, 17), (17, 18), (18, 19), (19, 20),
];

const POINT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const POINT_RADIUS: i32 = 2;
const LINE_THICKNESS: i32 = 2;
/// 画布外保留的像素边距，越界点收敛到此处后不可见
const CLIP_MARGIN: f32 = (POINT_RADIUS + 1) as f32;

/// 在副本上绘制关键点（绿色）与连接线（红色），原图不变
pub fn draw_overlay(image: &RgbImage, hands: &[HandDetection]) -> RgbImage {
    let mut canvas = image.clone();
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);

    for hand in hands {
        let pixels: Vec<Option<(i32, i32)>> = hand
            .landmarks
            .iter()
            .map(|p| Some((project(p.x, w)?, project(p.y, h)?)))
            .collect();

        for &(a, b) in HAND_CONNECTIONS.iter() {
            if let (Some(from), Some(to)) = (pixels[a], pixels[b]) {
                draw_line(&mut canvas, from, to, LINE_COLOR);
            }
        }
        for point in pixels.iter().flatten() {
            fill_disc(&mut canvas, *point, POINT_RADIUS, POINT_COLOR);
        }
    }

    canvas
}

/// JPEG 编码为 `data:image/jpeg;base64,...`
pub fn encode_data_url(image: &RgbImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| SignError::Internal(format!("Failed to encode annotated image: {}", e)))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(buffer.into_inner());
    Ok(format!("data:image/jpeg;base64,{}", encoded))
}

/// 归一化坐标转像素；非有限值丢弃，其余限制在画布外一圈边距内
fn project(value: f32, extent: f32) -> Option<i32> {
    if !value.is_finite() {
        return None;
    }
    Some((value * extent).round().clamp(-CLIP_MARGIN, extent + CLIP_MARGIN) as i32)
}

fn put(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_disc(canvas: &mut RgbImage, (cx, cy): (i32, i32), radius: i32, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(canvas, cx + dx, cy + dy, color);
            }
        }
    }
}

// Bresenham
fn draw_line(canvas: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let half = LINE_THICKNESS / 2;

    loop {
        fill_disc(canvas, (x, y), half, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
