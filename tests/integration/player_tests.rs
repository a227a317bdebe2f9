//! Frame → window → predictor → threshold → keys, end to end.
//!
//! Channel order is [up, left, right, down]; N=3, threshold 0.5.

use framepilot::actuator::{Channel, KeyState, Transition};
use framepilot::app::events::PlayerEvent;
use framepilot::app::service::Player;
use framepilot::config::PlayerConfig;
use framepilot::error::{ConfigError, Error, InferenceError};
use framepilot::model::{FeedOutcome, SingleActionModel, SkipReason};
use framepilot::threshold::BinaryVector;
use framepilot::window::{FrameShape, FrameWindow, RawFrame};

use super::mock_hw::{RecordingActuator, RecordingSink, ScriptedEngine, frame, test_config};

type TestPlayer = Player<SingleActionModel<ScriptedEngine>, RecordingActuator, RecordingSink>;

fn make_player(script: Vec<[f32; 4]>) -> (TestPlayer, RecordingActuator, RecordingSink) {
    let keys = RecordingActuator::new();
    let sink = RecordingSink::new();
    let model = SingleActionModel::new(&test_config(), ScriptedEngine::new(script)).unwrap();
    (Player::new(model, keys.clone(), sink.clone()), keys, sink)
}

#[test]
fn press_hold_release_sequence() {
    let (player, keys, sink) = make_player(vec![
        [0.2, 0.6, 0.1, 0.9],
        [0.3, 0.7, 0.0, 0.51],
        [0.1, 0.2, 0.3, 0.4],
    ]);

    // First decision presses left and down.
    let out = player.on_frame(&frame(1)).unwrap();
    assert_eq!(
        out,
        FeedOutcome::Predicted(BinaryVector::from_bits([0, 1, 0, 1]))
    );
    assert_eq!(
        keys.calls(),
        vec![Transition::press(Channel::Left), Transition::press(Channel::Down)]
    );

    // Same decision again: nothing new reaches the actuator.
    player.on_frame(&frame(2)).unwrap();
    assert_eq!(keys.calls().len(), 2);

    // All below threshold: both held keys are released.
    player.on_frame(&frame(3)).unwrap();
    assert_eq!(
        keys.calls()[2..],
        [Transition::release(Channel::Left), Transition::release(Channel::Down)]
    );
    assert!(Channel::ALL
        .iter()
        .all(|&c| player.key_state(c) == KeyState::Released));

    let transitions: Vec<_> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            PlayerEvent::Transition(t) => Some(t),
            _ => None,
        })
        .collect();
    assert_eq!(transitions, keys.calls());
    assert_eq!(player.stats().transitions, 4);
}

#[test]
fn score_equal_to_threshold_does_not_press() {
    let (player, keys, _) = make_player(vec![[0.5, 0.5, 0.5000001, 0.5]]);
    player.on_frame(&frame(1)).unwrap();
    assert_eq!(keys.calls(), vec![Transition::press(Channel::Right)]);
}

#[test]
fn mismatched_frame_is_rejected_before_inference() {
    let (player, keys, _) = make_player(vec![[1.0; 4]]);
    let bad = RawFrame::filled(FrameShape::new(2, 1, 1), 9);

    let err = player.on_frame(&bad).unwrap_err();
    assert_eq!(
        err,
        Error::Config(ConfigError::FrameShapeMismatch {
            expected: FrameShape::new(1, 1, 1),
            actual: FrameShape::new(2, 1, 1),
        })
    );
    assert_eq!(player.model().predictor().engine().calls(), 0);
    assert!(player.model().window_snapshot().to_vec().iter().all(|&v| v == 0.0));
    assert!(keys.calls().is_empty());
}

#[test]
fn window_rejects_mismatched_frame_without_feeding() {
    let mut window = FrameWindow::new(3, FrameShape::new(4, 4, 3), true).unwrap();
    window.feed(&RawFrame::filled(FrameShape::new(4, 4, 3), 255)).unwrap();
    let before = window.snapshot();

    let err = window
        .feed(&RawFrame::filled(FrameShape::new(4, 4, 1), 255))
        .unwrap_err();
    assert!(matches!(err, ConfigError::FrameShapeMismatch { .. }));
    assert_eq!(window.snapshot(), before);
    assert_eq!(window.len(), 3);
}

#[test]
fn engine_failure_skips_frame_and_keeps_keys() {
    // One scripted decision; the second call finds the script exhausted.
    let (player, keys, _) = make_player(vec![[0.9, 0.0, 0.0, 0.0]]);
    player.on_frame(&frame(1)).unwrap();

    let out = player.on_frame(&frame(2)).unwrap();
    assert_eq!(out, FeedOutcome::Skipped(SkipReason::EngineFailure));
    assert_eq!(player.key_state(Channel::Up), KeyState::Pressed);
    assert_eq!(keys.calls(), vec![Transition::press(Channel::Up)]);

    // The frame still entered the window.
    assert_eq!(player.model().window_snapshot().to_vec(), vec![0.0, 1.0, 2.0]);
    assert_eq!(player.stats().engine_failures, 1);
}

#[test]
fn window_slides_oldest_out() {
    let (player, _, _) = make_player(vec![[0.0; 4]; 4]);
    for v in 1..=4 {
        player.on_frame(&frame(v)).unwrap();
    }
    assert_eq!(player.model().window_snapshot().to_vec(), vec![2.0, 3.0, 4.0]);
}

#[test]
fn wrong_output_width_is_surfaced() {
    struct Five;
    impl framepilot::predictor::InferenceEngine for Five {
        fn run(&self, _: &framepilot::window::WindowTensor) -> anyhow::Result<Vec<f32>> {
            Ok(vec![0.0; 5])
        }
    }
    let model = SingleActionModel::new(&test_config(), Five).unwrap();
    let player = Player::new(model, RecordingActuator::new(), RecordingSink::new());
    let err = player.on_frame(&frame(1)).unwrap_err();
    assert_eq!(
        err,
        Error::Inference(InferenceError::OutputShape {
            expected: 4,
            actual: 5
        })
    );
}

#[test]
fn config_file_round_trips_into_a_player() {
    let path = std::env::temp_dir().join(format!("framepilot-it-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{
            "window_length": 3,
            "frame": { "height": 1, "width": 1, "channels": 1 },
            "activation_threshold": 0.5,
            "normalize_images": false,
            "capture": { "frames_per_second": 30, "frame_size": 1 }
        }"#,
    )
    .unwrap();
    let config = PlayerConfig::load(&path);
    let _ = std::fs::remove_file(&path);
    let config = config.unwrap();

    let model = SingleActionModel::new(&config, ScriptedEngine::new([[0.0, 0.0, 0.9, 0.0]])).unwrap();
    let keys = RecordingActuator::new();
    let player = Player::new(model, keys.clone(), RecordingSink::new());
    player.on_frame(&frame(7)).unwrap();
    assert_eq!(keys.calls(), vec![Transition::press(Channel::Right)]);
}
