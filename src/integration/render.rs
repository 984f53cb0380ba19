//! Annotated copies of input frames.

use image::{ImageBuffer, Luma, Pixel, Rgb, Rgba};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as DrawRect;

use crate::frame::Frame;
use crate::tracker::Identity;

use super::adapter::RawBox;

const PALETTE: [[u8; 3]; 8] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
];

const UNASSIGNED: [u8; 3] = [128, 128, 128];

/// Box outline thickness in pixels.
const THICKNESS: i32 = 2;

fn color_for(identity: Identity) -> [u8; 3] {
    match identity {
        Identity::Assigned(id) => PALETTE[(id % PALETTE.len() as u64) as usize],
        Identity::None => UNASSIGNED,
    }
}

fn draw<P>(
    img: &mut ImageBuffer<P, Vec<u8>>,
    boxes: &[RawBox],
    identities: &[Identity],
    pixel: impl Fn([u8; 3]) -> P,
) where
    P: Pixel<Subpixel = u8>,
{
    // Anything further out than this is invisible anyway.
    let margin = (THICKNESS + 1) as f32;
    let (width, height) = (img.width() as f32, img.height() as f32);
    let clamp_x = |v: f32| v.round().clamp(-margin, width + margin) as i32;
    let clamp_y = |v: f32| v.round().clamp(-margin, height + margin) as i32;

    for (bbox, identity) in boxes.iter().zip(identities) {
        let color = pixel(color_for(*identity));
        let left = clamp_x(bbox.cx - bbox.w / 2.0);
        let top = clamp_y(bbox.cy - bbox.h / 2.0);
        let right = clamp_x(bbox.cx + bbox.w / 2.0);
        let bottom = clamp_y(bbox.cy + bbox.h / 2.0);
        let w = (right - left).max(1) as u32;
        let h = (bottom - top).max(1) as u32;

        for offset in 0..THICKNESS {
            let grow = 2 * offset as u32;
            let rect = DrawRect::at(left - offset, top - offset).of_size(w + grow, h + grow);
            draw_hollow_rect_mut(img, rect, color);
        }
        draw_cross_mut(img, color, clamp_x(bbox.cx), clamp_y(bbox.cy));
    }
}

/// Copy of `frame` with every box outlined and its center marked.
///
/// Colors follow the identity; unassigned boxes are grey. Boxes may extend
/// past the frame, drawing is clipped.
pub fn annotate(frame: &Frame, boxes: &[RawBox], identities: &[Identity]) -> Frame {
    let (width, height) = (frame.width(), frame.height());
    let data = frame.data().to_vec();

    match frame.channels() {
        3 => match ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data) {
            Some(mut img) => {
                draw(&mut img, boxes, identities, Rgb);
                Frame::from(img)
            }
            None => frame.clone(),
        },
        4 => match ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, data) {
            Some(mut img) => {
                draw(&mut img, boxes, identities, |[r, g, b]| Rgba([r, g, b, 255]));
                Frame::from(img)
            }
            None => frame.clone(),
        },
        1 => match ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data) {
            Some(mut img) => {
                draw(&mut img, boxes, identities, |c| Rgb(c).to_luma());
                Frame::from(img)
            }
            None => frame.clone(),
        },
        _ => frame.clone(),
    }
}
