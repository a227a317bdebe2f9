//! A frame arriving while an earlier inference is still running.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use framepilot::actuator::{Channel, KeyState, Transition};
use framepilot::app::service::Player;
use framepilot::model::{FeedOutcome, SingleActionModel, SkipReason};
use framepilot::threshold::BinaryVector;

use super::mock_hw::{
    BitsEngine, FillCountEngine, GatedEngine, RecordingActuator, RecordingSink, frame, test_config,
};

#[test]
fn frame_during_inference_is_windowed_but_not_predicted() {
    let (engine, entered, open_gate) = GatedEngine::new([0.9, 0.0, 0.0, 0.0]);
    let keys = RecordingActuator::new();
    let model = SingleActionModel::new(&test_config(), engine).unwrap();
    let player = Arc::new(Player::new(model, keys.clone(), RecordingSink::new()));

    let slow = {
        let player = Arc::clone(&player);
        thread::spawn(move || player.on_frame(&frame(1)))
    };
    entered.recv_timeout(Duration::from_secs(5)).unwrap();

    // Second frame: appended, then skipped because the first is in flight.
    let out = player.on_frame(&frame(2)).unwrap();
    assert_eq!(out, FeedOutcome::Skipped(SkipReason::Busy));
    assert_eq!(player.model().window_snapshot().to_vec(), vec![0.0, 1.0, 2.0]);
    assert!(keys.calls().is_empty());

    open_gate.send(()).unwrap();
    let out = slow.join().unwrap().unwrap();
    assert_eq!(
        out,
        FeedOutcome::Predicted(BinaryVector::from_bits([1, 0, 0, 0]))
    );

    // The in-flight call saw the window as it was when frame 1 arrived.
    assert_eq!(player.model().predictor().engine().seen()[0], vec![0.0, 0.0, 1.0]);

    // Same decision on the next frame: still exactly one press.
    player.on_frame(&frame(3)).unwrap();
    assert_eq!(keys.calls(), vec![Transition::press(Channel::Up)]);
    assert_eq!(player.key_state(Channel::Up), KeyState::Pressed);

    let stats = player.stats();
    assert_eq!(stats.frames_received, 3);
    assert_eq!(stats.predictions, 2);
    assert_eq!(stats.dropped_busy, 1);
}

#[test]
fn concurrent_frames_never_double_apply() {
    let keys = RecordingActuator::new();
    let model = SingleActionModel::new(
        &test_config(),
        BitsEngine {
            delay: Duration::from_millis(1),
        },
    )
    .unwrap();
    let player = Arc::new(Player::new(model, keys.clone(), RecordingSink::new()));

    let workers: Vec<_> = (0..4u8)
        .map(|t| {
            let player = Arc::clone(&player);
            thread::spawn(move || {
                for i in 0..50u8 {
                    player.on_frame(&frame((t * 50 + i) % 16)).unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert!(keys.is_edge_consistent());
    let stats = player.stats();
    assert_eq!(stats.frames_received, 200);
    assert_eq!(
        stats.predictions + stats.dropped_busy + stats.engine_failures,
        stats.frames_received
    );
    assert_eq!(stats.transitions, keys.calls().len() as u64);

    // Key state agrees with what the actuator was told.
    let held = keys.held();
    for ch in Channel::ALL {
        let expected = if held.contains(&ch) {
            KeyState::Pressed
        } else {
            KeyState::Released
        };
        assert_eq!(player.key_state(ch), expected);
    }
}

#[test]
fn inferred_windows_follow_feed_order() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 30;

    for _ in 0..50 {
        let mut config = test_config();
        config.window_length = THREADS * PER_THREAD + 10;
        let model = SingleActionModel::new(&config, FillCountEngine::default()).unwrap();
        let player = Arc::new(Player::new(model, RecordingActuator::new(), RecordingSink::new()));

        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let player = Arc::clone(&player);
                thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        player.on_frame(&frame(1)).unwrap();
                        thread::yield_now();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let counts = player.model().predictor().engine().counts();
        assert!(!counts.is_empty());
        for pair in counts.windows(2) {
            assert!(
                pair[0] < pair[1],
                "window fed {} frames was inferred after one fed {}",
                pair[1],
                pair[0]
            );
        }
        assert_eq!(counts.len() as u64, player.stats().predictions);
    }
}
