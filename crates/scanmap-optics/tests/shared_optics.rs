use std::sync::Arc;

use scanmap_optics::{
    CameraParams, FisheyeDistortion, Intrinsics, PixelMapping, Resolution, SteeringAssembly,
    SteeringParams,
};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn optics_are_shareable_across_threads() {
    assert_send_sync::<PixelMapping>();
    assert_send_sync::<SteeringAssembly>();

    let pixels = Arc::new(
        PixelMapping::new(CameraParams {
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
        .expect("pixels"),
    );
    let steering = Arc::new(SteeringAssembly::new(SteeringParams::default()).expect("steering"));

    let reference: Vec<u32> = (-30..=30)
        .map(|d| pixels.nearest_row_for_angle(f64::from(d).to_radians()))
        .collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let pixels = Arc::clone(&pixels);
            let steering = Arc::clone(&steering);
            let reference = &reference;
            scope.spawn(move || {
                let rows: Vec<u32> = (-30..=30)
                    .map(|d| pixels.nearest_row_for_angle(f64::from(d).to_radians()))
                    .collect();
                assert_eq!(&rows, reference);
                assert!(steering.order_to_angle(10).is_some());
            });
        }
    });
}

#[test]
fn elevation_falls_monotonically_down_the_centre_column() {
    let pixels = PixelMapping::new(CameraParams {
        intrinsics: Intrinsics {
            fx: 325.0,
            fy: 325.0,
            cx: 319.5,
            cy: 239.5,
        },
        distortion: FisheyeDistortion::default(),
        resolution: Resolution::default(),
    })
    .expect("pixels");
    let a2a = pixels.generate_a2a_arrays();
    assert_eq!(a2a.len(), 480);
    assert!(a2a.windows(2).all(|w| w[0].angle > w[1].angle));
}
