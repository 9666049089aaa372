//! YOLO object detection model

use crate::config::VisionConfig;
use crate::detection::{BoundingBox, ClassLabelMap, Detection};
use crate::error::VisionError;
use crate::models::detector::Detector;
use crate::utils::mat_to_chw_tensor;
use opencv::core::{Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use tracing::{debug, info, warn};

/// Inference parameters for [`YoloModel`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloParams {
    /// Square input edge in pixels
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        }
    }
}

impl YoloParams {
    pub fn from_config(config: &VisionConfig) -> Self {
        Self {
            input_size: config.input_size,
            confidence_threshold: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
        }
    }
}

/// YOLOv8-style ONNX detector
pub struct YoloModel {
    session: Session,
    class_labels: ClassLabelMap,
    params: YoloParams,
}

impl YoloModel {
    /// Create a new YOLO model
    pub fn new(
        model_path: &Path,
        class_labels: ClassLabelMap,
        params: YoloParams,
    ) -> Result<Self, VisionError> {
        if !model_path.is_file() {
            return Err(VisionError::Model(format!("YOLO model not found at {:?}", model_path)));
        }

        let session = Session::builder()
            .map_err(|e| VisionError::Ort(format!("Failed to create session builder: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| VisionError::Model(format!("Failed to load YOLO model: {}", e)))?;

        info!(
            "YOLO model loaded from {:?} ({} classes, {}px input)",
            model_path,
            class_labels.len(),
            params.input_size
        );

        Ok(Self {
            session,
            class_labels,
            params,
        })
    }

    /// Load the model and class names named by `config`
    pub fn from_config(config: &VisionConfig) -> Result<Self, VisionError> {
        let class_labels = match &config.class_names_path {
            Some(path) => ClassLabelMap::from_file(path)?,
            None => ClassLabelMap::coco(),
        };
        Self::new(&config.model_path, class_labels, YoloParams::from_config(config))
    }

    /// Resize, BGR to RGB, scale to [0, 1], pack as NCHW
    fn preprocess(&self, frame: &Mat) -> Result<Tensor<f32>, VisionError> {
        let size = self.params.input_size as i32;

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(size, size),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let mut float_mat = Mat::default();
        rgb.convert_to(&mut float_mat, opencv::core::CV_32F, 1.0 / 255.0, 0.0)?;

        let data = mat_to_chw_tensor(&float_mat)?;
        let shape = [1usize, 3, size as usize, size as usize];
        Tensor::from_array((shape, data.into_boxed_slice()))
            .map_err(|e| VisionError::Ort(format!("Failed to create input tensor: {}", e)))
    }
}

impl Detector for YoloModel {
    type Frame = Mat;

    fn name(&self) -> &str {
        "yolo"
    }

    fn class_labels(&self) -> &ClassLabelMap {
        &self.class_labels
    }

    /// Detect objects in frame
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Detection>, VisionError> {
        let input = self.preprocess(frame)?;
        let params = self.params;
        let frame_size = (frame.cols() as f32, frame.rows() as f32);

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| VisionError::Detection(format!("YOLO inference failed: {}", e)))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                VisionError::Detection(format!("Failed to extract output tensor: {}", e))
            })?;
        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();

        let candidates = decode_output(data, &dims, self.class_labels.len(), frame_size, &params)?;
        let detections = non_max_suppression(candidates, params.iou_threshold);

        if let Some(max_id) = detections.iter().map(|d| d.class_id).max() {
            if max_id >= self.class_labels.len() {
                warn!(
                    "Model emitted class id {} but only {} class names are loaded",
                    max_id,
                    self.class_labels.len()
                );
            }
        }

        Ok(detections)
    }
}

/// Decode a YOLOv8 head, `[1, 4 + classes, anchors]` or the transposed
/// `[1, anchors, 4 + classes]`, into boxes in original-frame pixels
pub fn decode_output(
    data: &[f32],
    dims: &[usize],
    num_classes: usize,
    frame_size: (f32, f32),
    params: &YoloParams,
) -> Result<Vec<Detection>, VisionError> {
    if dims.len() != 3 || dims[0] != 1 {
        return Err(VisionError::Detection(format!("Unexpected YOLO output shape {:?}", dims)));
    }

    let expected = dims[1]
        .checked_mul(dims[2])
        .ok_or_else(|| VisionError::Detection("YOLO output shape overflows".to_string()))?;
    if data.len() < expected {
        return Err(VisionError::Detection(format!(
            "YOLO output holds {} values, shape {:?} needs {}",
            data.len(),
            dims,
            expected
        )));
    }

    // Fall back to "anchors outnumber attributes" when the class count
    // does not match either axis.
    let (attributes, anchors, channels_first) = if dims[1] == num_classes + 4 {
        (dims[1], dims[2], true)
    } else if dims[2] == num_classes + 4 {
        (dims[2], dims[1], false)
    } else if dims[1] <= dims[2] {
        (dims[1], dims[2], true)
    } else {
        (dims[2], dims[1], false)
    };
    if attributes <= 4 {
        return Err(VisionError::Detection(format!(
            "YOLO output shape {:?} has no class scores",
            dims
        )));
    }

    let at = |anchor: usize, attribute: usize| {
        if channels_first {
            data[attribute * anchors + anchor]
        } else {
            data[anchor * attributes + attribute]
        }
    };

    let scale_x = frame_size.0 / params.input_size as f32;
    let scale_y = frame_size.1 / params.input_size as f32;
    let mut detections = Vec::new();

    for anchor in 0..anchors {
        let (class_id, score) = (4..attributes)
            .map(|attribute| (attribute - 4, at(anchor, attribute)))
            .filter(|(_, score)| score.is_finite())
            .fold((0usize, f32::MIN), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            });

        if score < params.confidence_threshold {
            continue;
        }

        let bbox = BoundingBox::from_center(
            at(anchor, 0) * scale_x,
            at(anchor, 1) * scale_y,
            at(anchor, 2) * scale_x,
            at(anchor, 3) * scale_y,
        )
        .clamp_to(frame_size.0, frame_size.1);

        if !bbox.is_finite() || bbox.area() <= 0.0 {
            continue;
        }

        detections.push(Detection::new(class_id, score, bbox));
    }

    debug!("YOLO decoded {} candidates above threshold", detections.len());
    Ok(detections)
}

/// Per-class non-maximum suppression; output sorted by descending confidence
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.retain(|d| d.confidence.is_finite());
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = keep.iter().any(|kept| {
            kept.class_id == candidate.class_id && kept.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            keep.push(candidate);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> YoloParams {
        YoloParams {
            input_size: 640,
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
        }
    }

    /// Channels-first head with 2 classes: rows cx, cy, w, h, class0, class1
    fn head(anchors: &[[f32; 6]]) -> (Vec<f32>, Vec<usize>) {
        let n = anchors.len();
        let mut data = vec![0.0; 6 * n];
        for (i, anchor) in anchors.iter().enumerate() {
            for (attr, value) in anchor.iter().enumerate() {
                data[attr * n + i] = *value;
            }
        }
        (data, vec![1, 6, n])
    }

    #[test]
    fn test_decode_scales_to_frame() {
        let (data, dims) = head(&[
            [320.0, 320.0, 64.0, 128.0, 0.1, 0.9],
            [100.0, 100.0, 20.0, 20.0, 0.2, 0.3],
        ]);
        let detections = decode_output(&data, &dims, 2, (1280.0, 640.0), &params()).unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 1);
        assert!((detections[0].confidence - 0.9).abs() < 1e-6);
        assert_eq!(detections[0].bbox, BoundingBox::new(576.0, 256.0, 704.0, 384.0));
    }

    #[test]
    fn test_decode_transposed_layout() {
        let anchors: Vec<[f32; 6]> = (0..8)
            .map(|i| [40.0 * i as f32 + 20.0, 50.0, 10.0, 10.0, 0.8, 0.0])
            .collect();
        let data: Vec<f32> = anchors.iter().flatten().copied().collect();

        let detections = decode_output(&data, &[1, 8, 6], 2, (640.0, 640.0), &params()).unwrap();
        assert_eq!(detections.len(), 8);
        assert!(detections.iter().all(|d| d.class_id == 0));
        assert_eq!(detections[3].bbox, BoundingBox::new(135.0, 45.0, 145.0, 55.0));
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        assert!(decode_output(&[0.0; 12], &[1, 12], 2, (640.0, 640.0), &params()).is_err());
        assert!(decode_output(&[0.0; 4], &[1, 6, 2], 2, (640.0, 640.0), &params()).is_err());
        assert!(decode_output(&[0.0; 8], &[1, 4, 2], 2, (640.0, 640.0), &params()).is_err());
    }

    #[test]
    fn test_nms_suppresses_same_class_overlap() {
        let detections = vec![
            Detection::new(0, 0.6, BoundingBox::new(12.0, 12.0, 62.0, 62.0)),
            Detection::new(0, 0.9, BoundingBox::new(10.0, 10.0, 60.0, 60.0)),
            Detection::new(2, 0.7, BoundingBox::new(10.0, 10.0, 60.0, 60.0)),
            Detection::new(0, 0.5, BoundingBox::new(300.0, 300.0, 350.0, 350.0)),
        ];
        let kept = non_max_suppression(detections, 0.45);

        let summary: Vec<(usize, f32)> = kept.iter().map(|d| (d.class_id, d.confidence)).collect();
        assert_eq!(summary, vec![(0, 0.9), (2, 0.7), (0, 0.5)]);
    }

    #[test]
    fn test_nms_empty() {
        assert!(non_max_suppression(Vec::new(), 0.45).is_empty());
    }

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = YoloModel::new(
            &dir.path().join("missing.onnx"),
            ClassLabelMap::coco(),
            YoloParams::default(),
        );
        assert!(matches!(result, Err(VisionError::Model(_))));
    }
}
