//! Session lifecycle over a real timer-driven frame source.

use std::thread;
use std::time::Duration;

use framepilot::actuator::{Channel, Transition};
use framepilot::adapters::interval_source::IntervalFrameSource;
use framepilot::app::events::PlayerEvent;
use framepilot::app::service::Player;
use framepilot::error::{ConfigError, Error, InferenceError};
use framepilot::model::SingleActionModel;
use framepilot::session::Session;
use framepilot::window::{FrameShape, RawFrame};

use super::mock_hw::{
    BitsEngine, ListGrabber, ManualFrameSource, RecordingActuator, RecordingSink, ScriptedEngine,
    frame, test_config,
};

fn bits_model() -> SingleActionModel<BitsEngine> {
    SingleActionModel::new(
        &test_config(),
        BitsEngine {
            delay: Duration::ZERO,
        },
    )
    .unwrap()
}

#[test]
fn requested_stop_releases_everything_held() {
    // 0b0011: up and left held for as long as frames keep coming.
    let (grabber, grabbed) = ListGrabber::new(vec![frame(0b0011)], true);
    let source = IntervalFrameSource::new(grabber, Duration::from_millis(2));
    let keys = RecordingActuator::new();
    let sink = RecordingSink::new();
    let mut session = Session::new(source, Player::new(bits_model(), keys.clone(), sink.clone()));

    let stop = session.stop_handle();
    let stopper = thread::spawn(move || {
        // The third grab starts only after the first callback returned.
        while grabbed.recv_timeout(Duration::from_secs(5)).is_ok_and(|n| n < 3) {}
        stop.request_stop();
    });

    let stats = session.run_until_stopped().unwrap();
    stopper.join().unwrap();

    assert!(stats.frames_received >= 2);
    assert_eq!(
        keys.calls(),
        vec![
            Transition::press(Channel::Up),
            Transition::press(Channel::Left),
            Transition::release(Channel::Up),
            Transition::release(Channel::Left),
        ]
    );

    let events = sink.events();
    assert_eq!(events.first(), Some(&PlayerEvent::Started));
    assert_eq!(events.last(), Some(&PlayerEvent::Stopped(stats)));
    assert!(!session.is_running());
}

#[test]
fn shape_fault_on_the_capture_thread_ends_the_run() {
    let bad = RawFrame::filled(FrameShape::new(1, 2, 1), 0);
    let (grabber, _grabbed) = ListGrabber::new(vec![frame(0b0100), bad], false);
    let source = IntervalFrameSource::new(grabber, Duration::from_millis(2));
    let keys = RecordingActuator::new();
    let sink = RecordingSink::new();
    let mut session = Session::new(source, Player::new(bits_model(), keys.clone(), sink.clone()));

    let err = session.run_until_stopped().unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::FrameShapeMismatch { .. })
    ));

    // The press from the good frame was undone on the way out.
    assert_eq!(
        keys.calls(),
        vec![
            Transition::press(Channel::Right),
            Transition::release(Channel::Right),
        ]
    );
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, PlayerEvent::Fault(Error::Config(_)))));
}

#[test]
fn restart_after_stop_delivers_again() {
    let source = ManualFrameSource::new();
    let keys = RecordingActuator::new();
    let mut session = Session::new(
        source.clone(),
        Player::new(bits_model(), keys.clone(), RecordingSink::new()),
    );

    session.start().unwrap();
    source.push(frame(0b1000));
    session.stop();
    source.push(frame(0b0001));
    assert_eq!(session.player().stats().frames_received, 1);

    session.start().unwrap();
    source.push(frame(0b0001));
    session.stop();

    assert_eq!(
        keys.calls(),
        vec![
            Transition::press(Channel::Down),
            Transition::release(Channel::Down),
            Transition::press(Channel::Up),
            Transition::release(Channel::Up),
        ]
    );
}

#[test]
fn stop_requested_before_start_ends_the_first_run() {
    let mut session = Session::new(
        ManualFrameSource::new(),
        Player::new(bits_model(), RecordingActuator::new(), RecordingSink::new()),
    );
    session.stop_handle().request_stop();
    let stats = session.run_until_stopped().unwrap();
    assert_eq!(stats.frames_received, 0);
}

#[test]
fn persistent_engine_failure_faults_the_session() {
    let mut config = test_config();
    config.max_consecutive_engine_failures = 2;
    // An empty script fails on every call.
    let model = SingleActionModel::new(&config, ScriptedEngine::new(Vec::<[f32; 4]>::new())).unwrap();
    let (grabber, _grabbed) = ListGrabber::new(vec![frame(1)], true);
    let source = IntervalFrameSource::new(grabber, Duration::from_millis(2));
    let sink = RecordingSink::new();
    let mut session = Session::new(
        source,
        Player::new(model, RecordingActuator::new(), sink.clone()),
    );

    let err = session.run_until_stopped().unwrap_err();
    assert!(matches!(err, Error::Inference(InferenceError::Engine(_))));

    let stats = session.player().stats();
    assert_eq!(stats.engine_failures, 2);
    assert_eq!(stats.predictions, 0);
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, PlayerEvent::Fault(Error::Inference(_)))));
}
