mod common;

use common::{age_scores, gender_scores, pipeline, StubModel};
use image::{DynamicImage, ImageBuffer, LumaA, Rgb, RgbImage};
use onnx_age_gender::{config::Config, models::ModelManager, AnnotateError};

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
}

#[test]
fn no_faces_returns_original_image() {
    let gender = gender_scores();
    let age = age_scores();
    let pipeline = pipeline(
        StubModel::detections(&[[0.0, 1.0, 0.3, 0.1, 0.1, 0.4, 0.4]]),
        gender.clone(),
        age.clone(),
    );
    let image = gradient(120, 90);

    let result = pipeline.annotate(&image).unwrap();

    assert!(result.is_empty());
    assert_eq!(result.image, image);
    assert_eq!(gender.calls(), 0);
    assert_eq!(age.calls(), 0);
}

#[test]
fn every_face_is_classified_in_detection_order() {
    let gender = gender_scores();
    let age = age_scores();
    let pipeline = pipeline(
        StubModel::detections(&[
            [0.0, 1.0, 0.99, 0.5, 0.5, 0.9, 0.9],
            [0.0, 1.0, 0.10, 0.0, 0.0, 0.2, 0.2],
            [0.0, 1.0, 0.85, 0.1, 0.1, 0.3, 0.3],
        ]),
        gender.clone(),
        age.clone(),
    );
    let image = gradient(200, 200);

    let result = pipeline.annotate(&image).unwrap();

    assert_eq!(result.face_count(), 2);
    assert_eq!(gender.calls(), 2);
    assert_eq!(age.calls(), 2);

    let first = &result.faces[0];
    assert_eq!(
        (first.bounding_box.x1, first.bounding_box.y1, first.bounding_box.x2, first.bounding_box.y2),
        (100, 100, 180, 180)
    );
    assert_eq!(first.gender.label, "Female");
    assert!((first.gender.confidence - 80.0).abs() < 1e-3);
    assert_eq!(first.age.label, "~25-30");
    assert!((first.age.confidence - 60.0).abs() < 1e-3);
    assert_eq!(first.label(), "Female,~25-30");

    let second = &result.faces[1];
    assert_eq!((second.bounding_box.x1, second.bounding_box.y1), (20, 20));

    // 两个框画在同一张图上
    assert_eq!(result.image.get_pixel(100, 100), &Rgb([0, 255, 0]));
    assert_eq!(result.image.get_pixel(20, 20), &Rgb([0, 255, 0]));
    assert_ne!(result.image, image);
    assert_eq!(image.get_pixel(100, 100), &Rgb([100, 100, 128]));
}

#[test]
fn boxes_always_lie_inside_the_image() {
    let pipeline = pipeline(
        StubModel::detections(&[
            [0.0, 1.0, 0.9, -0.5, -0.5, 0.5, 0.5],
            [0.0, 1.0, 0.9, 0.6, 0.6, 1.4, 1.2],
        ]),
        gender_scores(),
        age_scores(),
    );

    let result = pipeline.annotate(&gradient(80, 60)).unwrap();

    assert_eq!(result.face_count(), 2);
    for face in &result.faces {
        assert!(face.bounding_box.is_within(80, 60), "{:?}", face.bounding_box);
    }
}

#[test]
fn repeated_runs_are_identical() {
    let pipeline = pipeline(
        StubModel::detections(&[[0.0, 1.0, 0.95, 0.2, 0.2, 0.6, 0.7]]),
        gender_scores(),
        age_scores(),
    );
    let image = gradient(150, 100);

    let first = pipeline.annotate(&image).unwrap();
    let second = pipeline.annotate(&image).unwrap();

    assert_eq!(first.faces, second.faces);
    assert_eq!(first.image, second.image);
}

#[test]
fn classifier_failure_aborts_without_partial_results() {
    let pipeline = pipeline(
        StubModel::detections(&[[0.0, 1.0, 0.95, 0.2, 0.2, 0.6, 0.7]]),
        gender_scores(),
        StubModel::scores("bad-age", &[0.5, 0.5]),
    );

    match pipeline.annotate(&gradient(100, 100)) {
        Err(AnnotateError::LabelMismatch { expected, actual }) => {
            assert_eq!((expected, actual), (8, 2));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(result) => panic!("expected failure, got {} faces", result.face_count()),
    }
}

#[test]
fn detector_failure_is_model_unavailable() {
    let pipeline = pipeline(StubModel::failing("face"), gender_scores(), age_scores());

    assert!(matches!(
        pipeline.annotate(&gradient(64, 64)),
        Err(AnnotateError::ModelUnavailable(_))
    ));
}

#[test]
fn per_call_threshold_overrides_default() {
    let pipeline = pipeline(
        StubModel::detections(&[[0.0, 1.0, 0.5, 0.2, 0.2, 0.6, 0.7]]),
        gender_scores(),
        age_scores(),
    );
    let image = gradient(100, 100);

    assert_eq!(pipeline.annotate(&image).unwrap().face_count(), 0);
    assert_eq!(pipeline.annotate_with_threshold(&image, 0.4).unwrap().face_count(), 1);
    assert!(matches!(
        pipeline.annotate_with_threshold(&image, 1.2),
        Err(AnnotateError::InvalidInput(_))
    ));
}

#[test]
fn dynamic_images_are_normalized_first() {
    let pipeline = pipeline(
        StubModel::detections(&[[0.0, 1.0, 0.95, 0.2, 0.2, 0.6, 0.7]]),
        gender_scores(),
        age_scores(),
    );

    let gray = DynamicImage::ImageLuma8(image::GrayImage::new(64, 64));
    assert_eq!(pipeline.annotate_dynamic(gray).unwrap().face_count(), 1);

    let luma_alpha = DynamicImage::ImageLumaA8(ImageBuffer::from_pixel(64, 64, LumaA([0, 255])));
    assert!(matches!(
        pipeline.annotate_dynamic(luma_alpha),
        Err(AnnotateError::UnsupportedImage(_))
    ));
}

#[test]
fn missing_model_files_fail_at_load() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let config = Config::new(
        "127.0.0.1:0".to_string(),
        dir.path().to_string_lossy().into_owned(),
        None,
        false,
        Default::default(),
    )?;

    assert!(matches!(
        ModelManager::load(config),
        Err(AnnotateError::ModelUnavailable(_))
    ));
    Ok(())
}
