use crate::frame::Frame;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompositeError {
    #[error(
        "frame {frame_width}x{frame_height} is too small for padding {padding}; check the frame asset and FRAME_PADDING"
    )]
    InsufficientFrameSize {
        frame_width: u32,
        frame_height: u32,
        padding: u32,
    },
    #[error("user image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Where the scaled user image lands on the frame-sized canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    pub scale: f64,
}

/// Largest area inside the frame that user content may occupy.
pub fn content_area(
    frame_width: u32,
    frame_height: u32,
    padding: u32,
) -> Result<(u32, u32), CompositeError> {
    let inset = 2 * i64::from(padding);
    let max_width = i64::from(frame_width) - inset;
    let max_height = i64::from(frame_height) - inset;

    if max_width <= 0 || max_height <= 0 {
        return Err(CompositeError::InsufficientFrameSize {
            frame_width,
            frame_height,
            padding,
        });
    }

    // Both are positive and no larger than the frame dimensions.
    Ok((max_width as u32, max_height as u32))
}

/// Uniform scale-to-fit of `user_width × user_height` into the padded
/// interior of the frame, centered on the full frame.
pub fn plan_placement(
    user_width: u32,
    user_height: u32,
    frame_width: u32,
    frame_height: u32,
    padding: u32,
) -> Result<Placement, CompositeError> {
    let (max_width, max_height) = content_area(frame_width, frame_height, padding)?;

    if user_width == 0 || user_height == 0 {
        return Err(CompositeError::EmptyImage {
            width: user_width,
            height: user_height,
        });
    }

    let (uw, uh) = (u64::from(user_width), u64::from(user_height));
    let (mw, mh) = (u64::from(max_width), u64::from(max_height));

    // Cross-multiplied comparison of mw/uw against mh/uh keeps the bound
    // axis exact instead of going through a rounded float.
    let (width, height) = if mw * uh <= mh * uw {
        (mw, uh * mw / uw)
    } else {
        (uw * mh / uh, mh)
    };
    let width = width.max(1) as u32;
    let height = height.max(1) as u32;

    let scale = (f64::from(max_width) / f64::from(user_width))
        .min(f64::from(max_height) / f64::from(user_height));

    Ok(Placement {
        width,
        height,
        x: (frame_width - width) / 2,
        y: (frame_height - height) / 2,
        scale,
    })
}

/// Scales `user` to fit inside the padded frame interior and pastes it,
/// centered, onto a transparent canvas with the frame's bounds.
pub fn place_on_frame(
    user: &DynamicImage,
    frame: &Frame,
    padding: u32,
) -> Result<RgbaImage, CompositeError> {
    let placement = plan_placement(
        user.width(),
        user.height(),
        frame.width(),
        frame.height(),
        padding,
    )?;
    debug!(
        "Placing {}x{} photo as {}x{} at ({}, {}), scale {:.4}",
        user.width(),
        user.height(),
        placement.width,
        placement.height,
        placement.x,
        placement.y,
        placement.scale
    );

    let resized = imageops::resize(
        &user.to_rgba8(),
        placement.width,
        placement.height,
        FilterType::Lanczos3,
    );

    let mut canvas = RgbaImage::new(frame.width(), frame.height());
    imageops::replace(
        &mut canvas,
        &resized,
        i64::from(placement.x),
        i64::from(placement.y),
    );

    Ok(canvas)
}

/// Copies the placement canvas onto a fresh canvas, then alpha-blends the
/// frame over it. Transparent regions of the frame reveal the photo.
pub fn merge_with_frame(placed: &RgbaImage, frame: &Frame) -> RgbaImage {
    let mut merged = RgbaImage::new(frame.width(), frame.height());
    imageops::replace(&mut merged, placed, 0, 0);
    imageops::overlay(&mut merged, frame.image(), 0, 0);
    merged
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
