//! Label, count and annotation behavior of the frame pipeline

mod common;

use common::{detection, pipeline, TestFrame};
use proptest::prelude::*;
use vantage_eye::{
    BoundingBox, ClassLabelMap, Detection, FrameCounts, Label, TrackedClass, VisionError,
};

#[test]
fn test_two_persons_and_a_car() {
    let labels = ClassLabelMap::coco();
    let detections = vec![detection(0, 0.91), detection(0, 0.40), detection(2, 0.77)];
    let frame = TestFrame::new(1);

    let processed = pipeline().process(&frame, &detections, &labels).unwrap();

    let rendered: Vec<String> = processed.labels.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["person 0.91", "person 0.40", "car 0.77"]);
    assert_eq!(processed.counts.get("person"), Some(2));
    assert_eq!(processed.counts.get("car"), Some(1));
    assert_eq!(processed.counts.get("airplane"), Some(0));
    assert_eq!(processed.summary, "Persons: 2, Cars: 1, Airplanes: 0");
    assert_eq!(
        processed.frame.ops,
        vec![
            "box 0 person 0.91",
            "box 0 person 0.40",
            "box 2 car 0.77",
            "summary Persons: 2, Cars: 1, Airplanes: 0",
        ]
    );
    assert!(frame.ops.is_empty());
}

#[test]
fn test_no_detections_still_draws_summary() {
    let processed = pipeline()
        .process(&TestFrame::new(1), &[], &ClassLabelMap::coco())
        .unwrap();

    assert!(processed.labels.is_empty());
    assert_eq!(processed.counts.total(), 0);
    assert_eq!(processed.frame.ops, vec!["summary Persons: 0, Cars: 0, Airplanes: 0"]);
}

#[test]
fn test_untracked_classes_are_drawn_not_counted() {
    let detections = vec![detection(16, 0.88), detection(9, 0.51)];

    let processed = pipeline()
        .process(&TestFrame::new(1), &detections, &ClassLabelMap::coco())
        .unwrap();

    assert_eq!(processed.labels[0].to_string(), "dog 0.88");
    assert_eq!(processed.labels[1].to_string(), "traffic light 0.51");
    assert_eq!(processed.frame.ops.len(), 3);
    assert_eq!(processed.counts.total(), 0);
}

#[test]
fn test_rendered_labels_count_like_structured_ones() {
    let tracked = vec![TrackedClass::new("person"), TrackedClass::new("traffic light")];
    let mut counts = FrameCounts::new(&tracked);

    assert!(counts.tally_rendered("person 0.91").unwrap());
    assert!(counts.tally_rendered("traffic light 0.66").unwrap());
    assert!(!counts.tally_rendered("dog 0.20").unwrap());

    assert_eq!(counts.get("person"), Some(1));
    assert_eq!(counts.get("traffic light"), Some(1));
}

#[test]
fn test_malformed_rendered_label_is_reported() {
    let mut counts = FrameCounts::new(&[TrackedClass::new("person")]);

    for text in ["person", "person 0,91", " 0.5", "person 1.5"] {
        match counts.tally_rendered(text) {
            Err(VisionError::LabelParse { label, .. }) => assert_eq!(label, text),
            other => panic!("Expected LabelParse for {:?}, got {:?}", text, other),
        }
    }
    assert_eq!(counts.total(), 0);
}

#[test]
fn test_custom_tracked_classes_and_captions() {
    let tracked = vec![
        TrackedClass::with_caption("bus", "Buses"),
        TrackedClass::new("person"),
    ];
    let pipeline = vantage_eye::FramePipeline::new(common::RecordingAnnotator::default(), tracked);
    let detections = vec![detection(5, 0.7), detection(5, 0.6), detection(0, 0.9)];

    let processed = pipeline
        .process(&TestFrame::new(1), &detections, &ClassLabelMap::coco())
        .unwrap();

    assert_eq!(processed.summary, "Buses: 2, Persons: 1");
}

fn class_name() -> impl Strategy<Value = String> {
    "[a-z]{1,10}( [a-z]{1,10})?"
}

fn coco_detections() -> impl Strategy<Value = Vec<Detection>> {
    prop::collection::vec(
        (0usize..80, 0.0f32..=1.0f32).prop_map(|(class_id, confidence)| {
            Detection::new(class_id, confidence, BoundingBox::new(0.0, 0.0, 50.0, 50.0))
        }),
        0..40,
    )
}

proptest! {
    #[test]
    fn test_label_round_trip(name in class_name(), confidence in 0.0f32..=1.0f32) {
        let rendered = Label::new(name.clone(), confidence).to_string();
        let parsed: Label = rendered.parse().unwrap();

        prop_assert_eq!(parsed.class_name, name);
        prop_assert!((parsed.confidence - confidence).abs() <= 0.01);
    }

    #[test]
    fn test_labels_align_with_detections(detections in coco_detections()) {
        let labels = ClassLabelMap::coco();
        let processed = pipeline().process(&TestFrame::new(1), &detections, &labels).unwrap();

        prop_assert_eq!(processed.labels.len(), detections.len());
        for (label, detection) in processed.labels.iter().zip(&detections) {
            prop_assert_eq!(Some(label.class_name.as_str()), labels.get(detection.class_id));
        }
    }

    #[test]
    fn test_counts_match_detections(detections in coco_detections()) {
        let labels = ClassLabelMap::coco();
        let processed = pipeline().process(&TestFrame::new(1), &detections, &labels).unwrap();

        for (name, count) in processed.counts.iter() {
            let expected = detections
                .iter()
                .filter(|d| labels.get(d.class_id) == Some(name))
                .count() as u32;
            prop_assert_eq!(count, expected);
        }
        let tracked_total = detections
            .iter()
            .filter(|d| [0, 2, 4].contains(&d.class_id))
            .count() as u32;
        prop_assert_eq!(processed.counts.total(), tracked_total);
    }

    #[test]
    fn test_processing_is_repeatable(detections in coco_detections()) {
        let labels = ClassLabelMap::coco();
        let pipeline = pipeline();
        let frame = TestFrame::new(1);

        let first = pipeline.process(&frame, &detections, &labels).unwrap();
        let second = pipeline.process(&frame, &detections, &labels).unwrap();

        prop_assert_eq!(first.counts, second.counts);
        prop_assert_eq!(first.summary, second.summary);
        prop_assert_eq!(first.frame, second.frame);
    }
}
