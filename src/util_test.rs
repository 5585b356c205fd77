use super::*;

#[test]
fn test_vector_distance() {
    let origin = Vector3::new(0.0, 0.0, 0.0);
    let point = Vector3::new(3.0, 4.0, 0.0);
    assert_eq!(origin.distance(&point), 5.0);
    assert_eq!(point.distance(&origin), 5.0);
}

#[test]
fn test_view_angles_forward() {
    let straight = ViewAngles {
        pitch: 0.0,
        yaw: 0.0,
    };
    let forward = straight.forward();
    assert!((forward.x - 1.0).abs() < 1e-6);
    assert!(forward.y.abs() < 1e-6);

    let down = ViewAngles {
        pitch: 90.0,
        yaw: 0.0,
    };
    assert!((down.forward().z + 1.0).abs() < 1e-6);
}

#[test]
fn test_weighted_mean() {
    assert_eq!(weighted_mean(&[(100.0, 1.0), (0.0, 1.0)]), 50.0);
    assert_eq!(weighted_mean(&[(80.0, 3.0), (40.0, 1.0)]), 70.0);
    assert_eq!(weighted_mean(&[]), 0.0);
    assert_eq!(weighted_mean(&[(10.0, 0.0)]), 0.0);
}

#[test]
fn test_percentages() {
    assert_eq!(percentage(1.0, 4.0), 25.0);
    assert_eq!(percentage(1.0, 0.0), 0.0);
    assert_eq!(normalize_to_percent(2.0, 1.0), 100.0);
    assert_eq!(normalize_to_percent(-3.0, 1.0), 0.0);
    assert_eq!(normalize_to_percent(0.5, 1.0), 50.0);
}

#[test]
fn test_tick_conversions() {
    assert_eq!(seconds_to_ticks(4.5, 64.0), 288);
    assert_eq!(ticks_to_seconds(128, 64.0), 2.0);
    assert_eq!(ticks_to_seconds(128, 0.0), 0.0);
}

#[test]
fn test_find_update_in_direction() {
    let items = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
    let current_index = 4; // Starting search from number 5
    let predicate = |&x: &i32| if x % 2 == 0 { Some(x) } else { None };

    let result_forward =
        util::find_in_direction(&items, current_index, SearchDirection::Forward, predicate);
    assert_eq!(result_forward, Some((5, 6)));

    let result_backward =
        util::find_in_direction(&items, current_index, SearchDirection::Backward, predicate);
    assert_eq!(result_backward, Some((3, 4)));
}

#[test]
fn test_nearest_by_tick_prefers_earlier_on_tie() {
    let ticks = [100, 200, 300];
    assert_eq!(nearest_by_tick(ticks.iter(), 250, |t| **t), Some(&200));
    assert_eq!(nearest_by_tick(ticks.iter(), 290, |t| **t), Some(&300));
    assert_eq!(nearest_by_tick(std::iter::empty::<&i64>(), 10, |t| **t), None);
}
