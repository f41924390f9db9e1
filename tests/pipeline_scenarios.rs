//! End-to-end scenarios against the full pipeline: synthetic RGBA frames in,
//! tracked-object reports and one-shot alerts out, with a simulated clock.

use sentinel_vision::{
    AlertSink, Frame, MotionPipeline, MotionSettings, PipelineConfig, SinkError, ThreatAlert,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const WIDTH: u32 = 256;
const HEIGHT: u32 = 256;

fn blank_frame() -> Frame {
    let mut data = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
    for chunk in data.chunks_exact_mut(4) {
        chunk[3] = 255;
    }
    Frame::from_rgba(WIDTH, HEIGHT, data).unwrap()
}

/// A black frame with one opaque white square.
fn frame_with_square(x1: u32, y1: u32, x2: u32, y2: u32) -> Frame {
    let mut data = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
    for chunk in data.chunks_exact_mut(4) {
        chunk[3] = 255;
    }
    for y in y1..=y2 {
        for x in x1..=x2 {
            let offset = ((y * WIDTH + x) * 4) as usize;
            data[offset..offset + 3].copy_from_slice(&[255, 255, 255]);
        }
    }
    Frame::from_rgba(WIDTH, HEIGHT, data).unwrap()
}

/// A black frame with two opaque white squares.
fn frame_with_two_squares(a: (u32, u32, u32, u32), b: (u32, u32, u32, u32)) -> Frame {
    let first = frame_with_square(a.0, a.1, a.2, a.3);
    let mut data = first.data().to_vec();
    for y in b.1..=b.3 {
        for x in b.0..=b.2 {
            let offset = ((y * WIDTH + x) * 4) as usize;
            data[offset..offset + 3].copy_from_slice(&[255, 255, 255]);
        }
    }
    Frame::from_rgba(WIDTH, HEIGHT, data).unwrap()
}

fn pipeline(settings: MotionSettings) -> MotionPipeline {
    MotionPipeline::new(PipelineConfig {
        image_width: WIDTH,
        image_height: HEIGHT,
        settings,
    })
}

#[derive(Clone, Default)]
struct RecordingSink {
    alerts: Arc<Mutex<Vec<(u64, u32)>>>,
}

impl AlertSink for RecordingSink {
    fn notify(&mut self, alert: &ThreatAlert) -> Result<(), SinkError> {
        self.alerts.lock().unwrap().push((alert.id, alert.threat_level));
        Ok(())
    }
}

#[test]
fn scenario_identical_frames_track_nothing() {
    let mut pipeline = pipeline(MotionSettings::default());
    let t0 = Instant::now();

    let frame = frame_with_square(50, 50, 90, 90);
    pipeline.process_frame_at(frame.clone(), t0).unwrap();
    let report = pipeline
        .process_frame_at(frame, t0 + Duration::from_secs(1))
        .unwrap();

    assert!(report.objects.is_empty());
    assert!(report.breaches.is_empty());
}

#[test]
fn scenario_persistent_region_escalates_by_cycle_three() {
    let mut pipeline = pipeline(MotionSettings {
        escalation_interval_seconds: 2,
        ..MotionSettings::default()
    });
    let t0 = Instant::now();

    // A 50x50 square appears and then drifts two pixels per second, so every
    // cycle produces fresh change regions for the tracker to re-match.
    pipeline.process_frame_at(blank_frame(), t0).unwrap();

    let cycle1 = pipeline
        .process_frame_at(
            frame_with_square(100, 100, 150, 150),
            t0 + Duration::from_secs(1),
        )
        .unwrap();
    assert_eq!(cycle1.objects.len(), 1);
    assert_eq!(cycle1.objects[0].id, 1);
    assert_eq!(cycle1.objects[0].threat_level, 0);

    let cycle2 = pipeline
        .process_frame_at(
            frame_with_square(102, 100, 152, 150),
            t0 + Duration::from_secs(2),
        )
        .unwrap();
    assert_eq!(cycle2.objects.len(), 1);
    assert_eq!(cycle2.objects[0].id, 1);

    let cycle3 = pipeline
        .process_frame_at(
            frame_with_square(104, 100, 154, 150),
            t0 + Duration::from_secs(3),
        )
        .unwrap();
    assert_eq!(cycle3.objects.len(), 1);
    assert_eq!(cycle3.objects[0].id, 1);
    assert_eq!(cycle3.objects[0].threat_level, 1);
}

#[test]
fn scenario_two_distant_regions_get_two_ids_in_one_cycle() {
    let mut pipeline = pipeline(MotionSettings::default());
    let t0 = Instant::now();

    pipeline.process_frame_at(blank_frame(), t0).unwrap();
    let report = pipeline
        .process_frame_at(
            frame_with_two_squares((10, 10, 40, 40), (200, 200, 230, 230)),
            t0 + Duration::from_secs(1),
        )
        .unwrap();

    let ids: Vec<u64> = report.objects.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn scenario_ceiling_breach_alerts_exactly_once() {
    let sink = RecordingSink::default();
    let alerts = sink.alerts.clone();
    let mut pipeline = pipeline(MotionSettings {
        escalation_interval_seconds: 1,
        maximum_threat_level: 1,
        deregistration_time_seconds: 10,
        ..MotionSettings::default()
    })
    .with_alert_sink(Box::new(sink));
    let t0 = Instant::now();

    pipeline.process_frame_at(blank_frame(), t0).unwrap();

    // The object stays matched while its threat level climbs past the ceiling.
    let mut breach_cycle = None;
    for second in 1..=4u64 {
        let x = 100 + 2 * second as u32;
        let report = pipeline
            .process_frame_at(
                frame_with_square(x, 100, x + 50, 150),
                t0 + Duration::from_secs(second),
            )
            .unwrap();
        if !report.breaches.is_empty() {
            breach_cycle = Some((second, report));
            break;
        }
    }

    let (second, report) = breach_cycle.expect("the object never breached the ceiling");
    assert_eq!(report.breaches[0].id, 1);
    assert_eq!(report.breaches[0].threat_level, 2);
    assert!(report.objects.iter().all(|o| o.id != 1));

    // The following detection-free cycle still contains no trace of id 1.
    let report = pipeline
        .tick_at(t0 + Duration::from_secs(second + 1))
        .unwrap();
    assert!(report.objects.iter().all(|o| o.id != 1));

    // Exactly one alert, for id 1, at the level it breached with.
    assert_eq!(*alerts.lock().unwrap(), vec![(1, 2)]);
}

#[test]
fn live_settings_update_keeps_tracked_objects() {
    let mut pipeline = pipeline(MotionSettings::default());
    let t0 = Instant::now();

    pipeline.process_frame_at(blank_frame(), t0).unwrap();
    pipeline
        .process_frame_at(
            frame_with_square(100, 100, 150, 150),
            t0 + Duration::from_secs(1),
        )
        .unwrap();

    pipeline.apply_settings(&MotionSettings {
        sensitivity: 10,
        deregistration_time_seconds: 600,
        ..MotionSettings::default()
    });

    let objects = pipeline.tracked_objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].id, 1);
}
