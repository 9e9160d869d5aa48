//! Track lifecycle scenarios driven through the public TrackManager API

mod common;

use std::collections::HashSet;

use common::{frame_time, make_manager, pt, run_frames, straight_path, tracker_config};
use speedtrap::prelude::*;

#[test]
fn test_single_track_persists_across_frames() {
    let mut mgr = make_manager(5.0, 3);
    let frames = vec![vec![pt(10.0, 10.0)], vec![pt(12.0, 10.0)], vec![pt(14.0, 10.0)]];

    let summaries = run_frames(&mut mgr, &frames);

    assert_eq!(summaries[0].created, vec![TrackId(1)]);
    assert!(summaries[1].created.is_empty());
    assert!(summaries[2].created.is_empty());
    assert_eq!(summaries[2].matched, 1);
    assert_eq!(mgr.len(), 1);

    let track = mgr.get(TrackId(1)).unwrap();
    assert_eq!(track.trajectory().len(), 3);
    assert_eq!(track.hits(), 3);
}

#[test]
fn test_track_destroyed_exactly_past_miss_ceiling() {
    let max_misses = 3;
    let mut mgr = make_manager(5.0, max_misses);
    mgr.update(&[pt(50.0, 50.0)], frame_time(0)).unwrap();

    // Detections far outside the gate count as misses
    for k in 1..=max_misses as usize {
        let summary = mgr.update(&[pt(400.0, 400.0 + 50.0 * k as f64)], frame_time(k)).unwrap();
        assert!(
            !summary.destroyed.iter().any(|(id, _)| *id == TrackId(1)),
            "destroyed early at frame {k}"
        );
        assert_eq!(mgr.get(TrackId(1)).unwrap().consecutive_misses(), k as u32);
    }

    let k = max_misses as usize + 1;
    let summary = mgr.update(&[], frame_time(k)).unwrap();
    assert!(summary
        .destroyed
        .contains(&(TrackId(1), RetireReason::Stale)));
    assert!(mgr.get(TrackId(1)).is_none());
}

#[test]
fn test_misses_reset_by_late_match() {
    let mut mgr = make_manager(10.0, 2);
    mgr.update(&[pt(100.0, 100.0)], frame_time(0)).unwrap();
    mgr.update(&[], frame_time(1)).unwrap();
    mgr.update(&[], frame_time(2)).unwrap();
    assert_eq!(mgr.get(TrackId(1)).unwrap().consecutive_misses(), 2);

    let summary = mgr.update(&[pt(101.0, 100.0)], frame_time(3)).unwrap();
    assert_eq!(summary.matched, 1);
    assert_eq!(mgr.get(TrackId(1)).unwrap().consecutive_misses(), 0);
}

#[test]
fn test_optimal_assignment_swaps_greedy_pairing() {
    let mut mgr = make_manager(20.0, 3);
    mgr.update(&[pt(0.0, 0.0), pt(4.0, 0.0)], frame_time(0)).unwrap();

    // Greedy pairs track 1 with (1, 0) and track 2 with (-3, 0) for a total of
    // 8; swapping costs 3 + 3 = 6.
    let summary = mgr.update(&[pt(1.0, 0.0), pt(-3.0, 0.0)], frame_time(1)).unwrap();

    assert_eq!(summary.matched, 2);
    assert!(summary.created.is_empty());
    assert!(mgr.get(TrackId(1)).unwrap().position().x < 0.0);
    assert!(mgr.get(TrackId(2)).unwrap().position().x < 4.0);
    assert!(mgr.get(TrackId(2)).unwrap().position().x > 1.0);
}

#[test]
fn test_empty_frame_ages_all_tracks() {
    let mut mgr = make_manager(5.0, 3);
    mgr.update(&[pt(0.0, 0.0), pt(100.0, 0.0)], frame_time(0)).unwrap();

    let summary = mgr.update(&[], frame_time(1)).unwrap();

    assert_eq!(summary.unmatched, 2);
    assert!(mgr.tracks().all(|t| t.consecutive_misses() == 1));
    assert!(mgr.tracks().all(|t| t.age() == 2));
}

#[test]
fn test_live_count_matches_summary() {
    let mut mgr = make_manager(15.0, 1);
    let frames = vec![
        vec![pt(10.0, 10.0), pt(200.0, 10.0)],
        vec![pt(14.0, 10.0), pt(300.0, 300.0), pt(500.0, 10.0)],
        vec![pt(18.0, 10.0)],
        vec![],
        vec![pt(22.0, 10.0), pt(600.0, 400.0)],
        vec![],
        vec![],
    ];

    let mut live_before = 0usize;
    for (k, detections) in frames.iter().enumerate() {
        let s = mgr.update(detections, frame_time(k)).unwrap();

        assert_eq!(s.matched + s.unmatched, live_before);
        assert_eq!(
            mgr.len(),
            s.matched + s.unmatched - s.destroyed.len() + s.created.len(),
            "frame {k}"
        );
        assert!(s
            .destroyed
            .iter()
            .all(|(_, reason)| *reason == RetireReason::Stale));
        live_before = mgr.len();
    }
}

#[test]
fn test_ids_unique_and_never_reused() {
    let mut mgr = make_manager(5.0, 0);
    let mut seen = HashSet::new();

    // Each frame the previous detections vanish and new ones appear far away,
    // so every frame retires the old tracks and creates fresh ones.
    for k in 0..10 {
        let offset = 100.0 * k as f64;
        let s = mgr
            .update(&[pt(offset, 0.0), pt(offset, 50.0)], frame_time(k))
            .unwrap();
        for id in &s.created {
            assert!(seen.insert(*id), "id {id} reused");
        }
        let live: HashSet<TrackId> = mgr.tracks().map(Track::id).collect();
        assert_eq!(live.len(), mgr.len());
    }
    assert_eq!(seen.len(), 20);
    assert_eq!(mgr.next_id(), TrackId(21));
}

#[test]
fn test_trajectory_bounded_fifo() {
    let mut mgr = TrackManager::new(TrackerConfig {
        max_trajectory_len: 3,
        ..tracker_config(10.0, 3)
    })
    .unwrap();

    let path = straight_path(pt(0.0, 0.0), pt(2.0, 0.0), 8);
    for (k, &p) in path.iter().enumerate() {
        mgr.update(&[p], frame_time(k)).unwrap();
        let track = mgr.get(TrackId(1)).unwrap();
        assert!(track.trajectory().len() <= 3);
        assert!(!track.trajectory().is_empty());
    }

    let track = mgr.get(TrackId(1)).unwrap();
    let xs: Vec<f64> = track.trajectory().iter().map(|p| p.x).collect();
    assert_eq!(xs.len(), 3);
    assert!(xs.windows(2).all(|w| w[0] < w[1]), "not oldest-first: {xs:?}");
    assert_eq!(track.trajectory().latest().unwrap().x, track.position().x);
}

#[test]
fn test_runs_are_deterministic() {
    let frames: Vec<Vec<Point2>> = (0..15)
        .map(|k| {
            let k = k as f64;
            let mut dets = vec![pt(100.0, 10.0 + 6.0 * k), pt(300.0, 20.0 + 4.0 * k)];
            if (k as usize) % 4 == 0 {
                dets.push(pt(500.0, 5.0 * k));
            }
            dets
        })
        .collect();

    let run = || {
        let mut mgr = make_manager(30.0, 2);
        run_frames(&mut mgr, &frames);
        mgr.tracks()
            .map(|t| (t.id(), t.position().x.to_bits(), t.position().y.to_bits()))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_matches_never_exceed_threshold() {
    let threshold = 5.0;
    let mut mgr = make_manager(threshold, 3);
    mgr.update(&[pt(0.0, 0.0), pt(100.0, 0.0)], frame_time(0)).unwrap();

    // 5.5 px away from both predictions
    let s = mgr.update(&[pt(5.5, 0.0), pt(94.5, 0.0)], frame_time(1)).unwrap();

    assert_eq!(s.matched, 0);
    assert_eq!(s.created, vec![TrackId(3), TrackId(4)]);
}
