use std::time::Duration;

use steering_kernel::controller;
use steering_kernel::ingest::SyntheticPattern;
use steering_kernel::steer::{BrightnessComparison, CentroidHysteresis};
use steering_kernel::{
    decide, Command, CommandDispatcher, DispatchOutcome, FrameOutcome, FrameSource, RawFrame,
    RecordingTransport, Rgba, SteeringController, SyntheticConfig, SyntheticSource, WireFormat,
};

const BLUE: Rgba = Rgba::new(10, 90, 220, 255);
const GREY: Rgba = Rgba::new(120, 120, 120, 255);

fn centroid_controller(transport: &RecordingTransport, format: WireFormat) -> SteeringController {
    let dispatcher = CommandDispatcher::spawn(transport.clone(), format, 16).unwrap();
    SteeringController::new(Box::new(CentroidHysteresis::new()), dispatcher)
}

fn moves(transport: &RecordingTransport) -> Vec<String> {
    transport
        .payloads()
        .iter()
        .map(|p| p.split(' ').next().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn full_blue_frame_drives_forward_from_any_state() {
    for prev in [Command::Stop, Command::Forward, Command::Left, Command::Right] {
        assert_eq!(decide(prev, 0, 640 * 480, 640), Command::Forward);
    }

    let transport = RecordingTransport::new();
    let mut ctl = centroid_controller(&transport, WireFormat::Word);
    let outcome = ctl.analyze(RawFrame::filled(640, 480, BLUE));

    match outcome {
        FrameOutcome::Decided {
            prev,
            command,
            dispatch,
            ..
        } => {
            assert_eq!(prev, Command::Stop);
            assert_eq!(command, Command::Forward);
            assert_eq!(dispatch, DispatchOutcome::Queued);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    ctl.shutdown();

    assert_eq!(moves(&transport), vec!["/Car?move=forward", "/Car?move=stop"]);
}

#[test]
fn payload_carries_decision_timestamp() {
    let transport = RecordingTransport::new();
    let mut ctl = centroid_controller(&transport, WireFormat::Letter);
    let before = steering_kernel::now_epoch_ms();
    ctl.analyze(RawFrame::filled(64, 48, BLUE));
    let report = ctl.shutdown();

    assert_eq!(report.dispatch.sent, 2);
    let payloads = transport.payloads();
    let (path, ts) = payloads[0].split_once(" &").unwrap();
    assert_eq!(path, "/Car?move=f");
    assert!(ts.parse::<u64>().unwrap() >= before);
    assert!(payloads[1].starts_with("/Car?move=s &"));
}

#[test]
fn worker_follows_a_sweeping_target_and_stops_on_teardown() {
    let transport = RecordingTransport::new();
    let handle = controller::spawn(centroid_controller(&transport, WireFormat::Word)).unwrap();

    let mut source = SyntheticSource::new(SyntheticConfig {
        width: 160,
        height: 120,
        pattern: SyntheticPattern::Sweep { period: 40 },
        ..SyntheticConfig::default()
    });
    source.connect().unwrap();
    for _ in 0..80 {
        handle.submit_frame(source.next_frame().unwrap()).unwrap();
    }
    let report = handle.stop().unwrap();

    assert_eq!(report.stats.frames_analyzed, 80);
    assert_eq!(report.last_command, Command::Stop);

    let moves = moves(&transport);
    assert!(moves.contains(&"/Car?move=right".to_string()), "{:?}", moves);
    assert!(moves.contains(&"/Car?move=left".to_string()), "{:?}", moves);
    assert_eq!(moves.last().map(String::as_str), Some("/Car?move=stop"));
    // Decisions only go out on transitions; the trailing fail-safe stop is
    // sent unconditionally.
    for pair in moves[..moves.len() - 1].windows(2) {
        assert_ne!(pair[0], pair[1], "{:?}", moves);
    }
}

#[test]
fn malformed_frames_do_not_disturb_the_worker() {
    let transport = RecordingTransport::new();
    let handle = controller::spawn(centroid_controller(&transport, WireFormat::Word)).unwrap();

    handle.submit_frame(RawFrame::filled(64, 48, BLUE)).unwrap();
    handle
        .submit_frame(RawFrame::new(vec![0u8; 16], 64, 48))
        .unwrap();
    handle.submit_frame(RawFrame::filled(64, 48, BLUE)).unwrap();
    let report = handle.stop().unwrap();

    assert_eq!(report.stats.frames_analyzed, 2);
    assert_eq!(report.stats.frames_skipped, 1);
    assert_eq!(moves(&transport), vec!["/Car?move=forward", "/Car?move=stop"]);
}

#[test]
fn pause_and_resume_through_the_handle() {
    let transport = RecordingTransport::new();
    let handle = controller::spawn(centroid_controller(&transport, WireFormat::Word)).unwrap();

    handle.submit_frame(RawFrame::filled(64, 48, BLUE)).unwrap();
    handle.pause().unwrap();
    handle.submit_frame(RawFrame::filled(64, 48, BLUE)).unwrap();
    handle.resume().unwrap();
    handle.submit_frame(RawFrame::filled(64, 48, BLUE)).unwrap();
    let report = handle.stop().unwrap();

    assert_eq!(report.stats.frames_paused, 1);
    assert_eq!(report.stats.fail_safe_stops, 2);
    assert_eq!(
        moves(&transport),
        vec![
            "/Car?move=forward",
            "/Car?move=stop",
            "/Car?move=forward",
            "/Car?move=stop"
        ]
    );
}

/// 100x100 frame with a full-width blue band over `rows`.
fn band(rows: std::ops::Range<u32>) -> RawFrame {
    let mut frame = RawFrame::filled(100, 100, GREY);
    for row in rows {
        for col in 0..100 {
            frame.set_pixel(row, col, BLUE).unwrap();
        }
    }
    frame
}

/// Last command the actuator has received, once the queue has gone idle.
fn settled_move(transport: &RecordingTransport, ctl: &SteeringController) -> Option<String> {
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while std::time::Instant::now() < deadline {
        let stats = ctl.dispatch_stats();
        if stats.queued == stats.sent + stats.failed + stats.coalesced {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    moves(transport).pop()
}

#[test]
fn slow_actuator_does_not_stall_analysis() {
    let transport = RecordingTransport::new().with_latency(Duration::from_millis(50));
    let dispatcher = CommandDispatcher::spawn(transport.clone(), WireFormat::Word, 2).unwrap();
    let mut ctl = SteeringController::new(Box::new(CentroidHysteresis::new()), dispatcher);

    // Top band from Stop turns right; bottom band while moving brakes to
    // Stop. Alternating them makes every frame a transition.
    let frames: Vec<RawFrame> = (0..10)
        .map(|i| if i % 2 == 0 { band(0..10) } else { band(90..100) })
        .collect();

    let started = std::time::Instant::now();
    for frame in frames {
        ctl.analyze(frame);
    }
    assert!(started.elapsed() < Duration::from_millis(250));
    assert_eq!(ctl.stats().transitions, 10);
    assert!(ctl.dispatch_stats().coalesced > 0);

    let expected = format!("/Car?move={}", ctl.current());
    assert_eq!(settled_move(&transport, &ctl), Some(expected));
    ctl.shutdown();
}

#[test]
fn decision_made_while_queue_is_full_still_reaches_actuator() {
    let transport = RecordingTransport::new().with_latency(Duration::from_millis(100));
    let dispatcher = CommandDispatcher::spawn(transport.clone(), WireFormat::Word, 1).unwrap();
    let mut ctl = SteeringController::new(Box::new(CentroidHysteresis::new()), dispatcher);

    // Left goes in flight, Forward fills the queue, then the target is lost.
    ctl.analyze(band(90..100));
    std::thread::sleep(Duration::from_millis(20));
    ctl.analyze(RawFrame::filled(100, 100, BLUE));
    let outcome = ctl.analyze(RawFrame::filled(100, 100, GREY));
    assert!(matches!(
        outcome,
        FrameOutcome::Decided {
            prev: Command::Forward,
            command: Command::Stop,
            dispatch: DispatchOutcome::Coalesced,
            ..
        }
    ));
    for _ in 0..20 {
        ctl.analyze(RawFrame::filled(100, 100, GREY));
    }

    assert_eq!(ctl.current(), Command::Stop);
    assert_eq!(
        settled_move(&transport, &ctl).as_deref(),
        Some("/Car?move=stop")
    );
    assert_eq!(moves(&transport), vec!["/Car?move=left", "/Car?move=stop"]);
    ctl.shutdown();
}

#[test]
fn brightness_strategy_runs_in_the_same_loop() {
    let transport = RecordingTransport::new();
    let dispatcher = CommandDispatcher::spawn(transport.clone(), WireFormat::Word, 16).unwrap();
    let handle = controller::spawn(SteeringController::new(
        Box::new(BrightnessComparison::new()),
        dispatcher,
    ))
    .unwrap();

    handle
        .submit_frame(RawFrame::filled(64, 48, Rgba::new(200, 200, 200, 255)))
        .unwrap();
    handle
        .submit_frame(RawFrame::filled(64, 48, Rgba::new(0, 0, 0, 255)))
        .unwrap();
    handle.stop().unwrap();

    // Darkness decides Stop; teardown then sends its own Stop.
    assert_eq!(
        moves(&transport),
        vec!["/Car?move=forward", "/Car?move=stop", "/Car?move=stop"]
    );
}
