use std::collections::HashSet;
use std::sync::Arc;

use scanmap_optics::{
    CameraParams, FisheyeDistortion, Intrinsics, PixelMapping, Resolution, SteeringAssembly,
    SteeringParams,
};
use scanmap_roi::{RoiMapping, RoiRequest, REFERENCE_ROI_ROWS};
use scanmap_core::RoiRows;

const A2A: [f64; 4] = [
    45.439334676855,
    -0.238209222626,
    0.0002051934385,
    -0.000000285,
];

fn lab_mapping() -> RoiMapping {
    let pixels = PixelMapping::new(CameraParams {
        intrinsics: Intrinsics {
            fx: 325.0,
            fy: 325.0,
            cx: 319.5,
            cy: 239.5,
        },
        distortion: FisheyeDistortion {
            k1: -0.20193899,
            k2: 0.09003341,
            k3: 0.0,
            k4: 0.0,
        },
        resolution: Resolution::default(),
    })
    .expect("pixels");
    let steering = SteeringAssembly::new(SteeringParams::default()).expect("steering");
    RoiMapping::new(A2A.to_vec(), Arc::new(pixels), Arc::new(steering)).expect("mapping")
}

#[test]
fn field_of_view_sweep_produces_valid_pairs() {
    let mapping = lab_mapping();
    let angles: Vec<f64> = (-30..=30).map(f64::from).collect();
    for roi_rows in [4, REFERENCE_ROI_ROWS, 50] {
        let request = RoiRequest::from_angles(angles.clone())
            .with_roi_rows(RoiRows::new(roi_rows).expect("roi rows"));
        let selection = mapping.map(&request).expect("map");

        assert_eq!(selection.orders.len(), selection.rows.len());
        assert_eq!(
            selection.len() + selection.dropped_out_of_bounds,
            angles.len()
        );
        let (lo, hi) = mapping.steering().order_bounds();
        for (order, row) in selection.pairs() {
            assert!((lo..=hi).contains(&order));
            assert!(row <= 480 - roi_rows);
        }
    }
}

#[test]
fn trimmed_sweep_has_unique_orders_in_first_seen_order() {
    let mapping = lab_mapping();
    let angles: Vec<f64> = (0..200).map(|i| -25.0 + 0.25 * f64::from(i)).collect();
    let full = mapping
        .map(&RoiRequest::from_angles(angles.clone()))
        .expect("map");
    let trimmed = mapping
        .map(&RoiRequest::from_angles(angles).with_trim_duplicates(true))
        .expect("map");

    let unique: HashSet<i32> = trimmed.order_values().into_iter().collect();
    assert_eq!(unique.len(), trimmed.len());
    assert_eq!(trimmed.len() + trimmed.dropped_duplicates, full.len());

    let mut seen = HashSet::new();
    let first_seen: Vec<(i32, u32)> = full.pairs().filter(|(o, _)| seen.insert(*o)).collect();
    assert_eq!(trimmed.pairs().collect::<Vec<_>>(), first_seen);
}

#[test]
fn row_requests_ignore_the_camera_table() {
    let mapping = lab_mapping();
    let selection = mapping
        .map(&RoiRequest::from_rows([20, 40, 50]))
        .expect("map");
    assert_eq!(selection.row_values(), vec![20, 40, 50]);
    for (order, row) in selection.pairs() {
        let expected = mapping
            .order_for_row(i64::from(row))
            .map(|o| mapping.steering().clamp_order(o))
            .expect("order");
        assert_eq!(order, expected);
    }
}
