//! Utility functions for vision processing

use crate::error::VisionError;
use opencv::core::{Mat, Vec3f, CV_32FC3};
use opencv::prelude::*;

/// Repack an interleaved 3-channel float Mat (HWC) into planar CHW order
pub fn mat_to_chw_tensor(mat: &Mat) -> Result<Vec<f32>, VisionError> {
    if mat.typ() != CV_32FC3 {
        return Err(VisionError::OpenCv(format!(
            "Expected a CV_32FC3 Mat, got type {}",
            mat.typ()
        )));
    }

    let (width, height) = (mat.cols(), mat.rows());
    if width <= 0 || height <= 0 {
        return Err(VisionError::EmptyFrame);
    }

    let plane = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| VisionError::OpenCv("Image dimensions overflow".to_string()))?;

    let continuous;
    let source = if mat.is_continuous() {
        mat
    } else {
        continuous = mat.try_clone()?;
        &continuous
    };
    let pixels = source.data_typed::<Vec3f>()?;

    let mut chw = vec![0.0f32; plane * 3];
    for (idx, pixel) in pixels.iter().enumerate().take(plane) {
        chw[idx] = pixel[0];
        chw[plane + idx] = pixel[1];
        chw[2 * plane + idx] = pixel[2];
    }

    Ok(chw)
}
