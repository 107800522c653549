//! Image adjustments
//!
//! Pure transforms over a list of submissions: the target entry is rebuilt,
//! every other entry is carried over as the same `Arc`. PDFs carry no
//! adjustments and are left untouched; callers check the kind first and
//! report [`Error::RotationUnsupported`](crate::error::Error::RotationUnsupported).
//!
//! [`rotate_image`] turns the pixels themselves, for payloads that must be
//! re-encoded upright.

use crate::error::{Error, Result};
use crate::types::{Adjustments, PendingSubmission, SubmissionId};
use bytes::Bytes;
use chrono::Utc;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::sync::Arc;

/// Inclusive range accepted for brightness, contrast and saturation
pub const TONE_RANGE: std::ops::RangeInclusive<u16> = 0..=200;

impl Adjustments {
    /// Check tone values against [`TONE_RANGE`]
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ] {
            if !TONE_RANGE.contains(&value) {
                return Err(Error::InvalidAdjustment(format!(
                    "{name} must be within {}..={}, got {value}",
                    TONE_RANGE.start(),
                    TONE_RANGE.end()
                )));
            }
        }
        if self.rotation >= 360 {
            return Err(Error::InvalidAdjustment(format!(
                "rotation must be below 360, got {}",
                self.rotation
            )));
        }
        Ok(())
    }
}

/// Add `degrees` to a rotation, wrapping into `0..360`
pub fn normalize_rotation(rotation: u16, degrees: i32) -> u16 {
    let turned = (i64::from(rotation) + i64::from(degrees)).rem_euclid(360);
    // rem_euclid(360) is always in 0..360
    u16::try_from(turned).unwrap_or_default()
}

/// Rotate the image matching `id` by `degrees` (clockwise when positive)
pub fn rotate(
    list: &[Arc<PendingSubmission>],
    id: SubmissionId,
    degrees: i32,
) -> Vec<Arc<PendingSubmission>> {
    map_adjustments(list, id, |current| Adjustments {
        rotation: normalize_rotation(current.rotation, degrees),
        ..current
    })
}

/// Replace the adjustments of the image matching `id`
pub fn with_adjustments(
    list: &[Arc<PendingSubmission>],
    id: SubmissionId,
    adjustments: Adjustments,
) -> Vec<Arc<PendingSubmission>> {
    map_adjustments(list, id, |_| adjustments)
}

/// Rotate an encoded JPEG or PNG clockwise by a multiple of 90 degrees
///
/// The result is re-encoded in the input format. A full turn returns the
/// payload unchanged.
pub fn rotate_image(payload: &Bytes, mime_type: &str, degrees: i32) -> Result<Bytes> {
    let format = match mime_type {
        "image/jpeg" | "image/jpg" => ImageFormat::Jpeg,
        "image/png" => ImageFormat::Png,
        other => {
            return Err(Error::RotationUnsupported(format!(
                "cannot rotate {other} pixels"
            )));
        }
    };

    let turn = normalize_rotation(0, degrees);
    if turn % 90 != 0 {
        return Err(Error::InvalidAdjustment(format!(
            "pixel rotation needs a multiple of 90 degrees, got {degrees}"
        )));
    }
    if turn == 0 {
        return Ok(payload.clone());
    }

    let decoded = image::load_from_memory_with_format(payload, format)?;
    let rotated = match turn {
        90 => decoded.rotate90(),
        180 => decoded.rotate180(),
        _ => decoded.rotate270(),
    };
    // JPEG has no alpha channel
    let rotated = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(rotated.to_rgb8())
    } else {
        rotated
    };

    let mut encoded = Cursor::new(Vec::new());
    rotated.write_to(&mut encoded, format)?;
    Ok(Bytes::from(encoded.into_inner()))
}

fn map_adjustments(
    list: &[Arc<PendingSubmission>],
    id: SubmissionId,
    f: impl Fn(Adjustments) -> Adjustments,
) -> Vec<Arc<PendingSubmission>> {
    list.iter()
        .map(|submission| match submission.adjustments {
            Some(current) if submission.id == id => {
                let mut next = PendingSubmission::clone(submission);
                next.adjustments = Some(f(current));
                next.last_updated_at = Utc::now();
                Arc::new(next)
            }
            _ => Arc::clone(submission),
        })
        .collect()
}
