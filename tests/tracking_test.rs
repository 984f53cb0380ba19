use perception_track::{ByteTracker, Detection, Identity, TrackerConfig};

#[test]
fn test_basic_tracking() {
    let mut tracker = ByteTracker::new(TrackerConfig::default());

    // Frame 1: one detection, confirmed straight away on the first frame.
    let tracks1 = tracker.update(vec![Detection::new(100.0, 100.0, 200.0, 200.0, 0.9)]);
    assert_eq!(tracks1.len(), 1);
    let id1 = tracks1[0].track_id;
    assert_eq!(id1, 1);

    // Frame 2: same object moved slightly.
    let tracks2 = tracker.update(vec![Detection::new(105.0, 105.0, 205.0, 205.0, 0.9)]);
    assert_eq!(tracks2.len(), 1);
    assert_eq!(tracks2[0].track_id, id1);

    // Frame 3: occluded, low score; recovered by the second association.
    let tracks3 = tracker.update(vec![Detection::new(110.0, 110.0, 210.0, 210.0, 0.2)]);
    assert_eq!(tracks3.len(), 1);
    assert_eq!(tracks3[0].track_id, id1);

    // Frame 4: gone.
    let tracks4 = tracker.update(vec![]);
    assert_eq!(tracks4.len(), 0);

    // Frame 5: back within the track buffer, re-found under the old id.
    let tracks5 = tracker.update(vec![Detection::new(115.0, 115.0, 215.0, 215.0, 0.9)]);
    assert_eq!(tracks5.len(), 1);
    assert_eq!(tracks5[0].track_id, id1);
}

#[test]
fn test_trackers_issue_ids_independently() {
    let mut a = ByteTracker::default();
    let mut b = ByteTracker::default();

    let ids_a = a.assign(vec![Detection::new(0.0, 0.0, 50.0, 50.0, 0.9)]);
    let ids_b = b.assign(vec![
        Detection::new(0.0, 0.0, 50.0, 50.0, 0.9),
        Detection::new(200.0, 0.0, 250.0, 50.0, 0.9),
    ]);

    assert_eq!(ids_a, vec![Identity::Assigned(1)]);
    assert_eq!(ids_b, vec![Identity::Assigned(1), Identity::Assigned(2)]);
}

#[test]
fn test_new_ids_increase() {
    let mut tracker = ByteTracker::default();
    tracker.assign(vec![Detection::new(0.0, 0.0, 50.0, 50.0, 0.9)]);

    // A second object shows up far away and gets confirmed on its second frame.
    let mut seen = Vec::new();
    for step in 0..3 {
        let dx = step as f32;
        let ids = tracker.assign(vec![
            Detection::new(dx, 0.0, 50.0 + dx, 50.0, 0.9),
            Detection::new(400.0, 400.0, 450.0, 450.0, 0.9),
        ]);
        assert_eq!(ids[0], Identity::Assigned(1));
        if let Identity::Assigned(id) = ids[1] {
            seen.push(id);
        }
    }

    assert!(!seen.is_empty());
    assert!(seen.iter().all(|&id| id > 1));
    assert!(seen.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_lost_track_expires() {
    let config = TrackerConfig {
        track_buffer: 2,
        ..TrackerConfig::default()
    };
    let mut tracker = ByteTracker::new(config);
    let first = tracker.assign(vec![Detection::new(0.0, 0.0, 50.0, 50.0, 0.9)]);
    assert_eq!(first, vec![Identity::Assigned(1)]);

    for _ in 0..4 {
        tracker.assign(vec![]);
    }

    // Too late to be re-found: a fresh, unconfirmed track takes its place.
    let again = tracker.assign(vec![Detection::new(0.0, 0.0, 50.0, 50.0, 0.9)]);
    assert_eq!(again, vec![Identity::None]);
    let confirmed = tracker.assign(vec![Detection::new(1.0, 0.0, 51.0, 50.0, 0.9)]);
    assert_eq!(confirmed, vec![Identity::Assigned(2)]);
}

#[test]
fn test_moving_object_refound_after_occlusion() {
    let mut tracker = ByteTracker::default();
    let at = |step: u32| {
        let x = 100.0 + 8.0 * step as f32;
        Detection::new(x, 100.0, x + 50.0, 200.0, 0.9)
    };

    for step in 0..20 {
        assert_eq!(tracker.assign(vec![at(step)]), vec![Identity::Assigned(1)]);
    }

    // Hidden for ten frames while it keeps moving at the same pace.
    for _ in 20..30 {
        assert!(tracker.update(vec![]).is_empty());
    }

    assert_eq!(tracker.assign(vec![at(30)]), vec![Identity::Assigned(1)]);
    assert_eq!(tracker.assign(vec![at(31)]), vec![Identity::Assigned(1)]);
}
