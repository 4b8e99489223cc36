//! End-to-end playback scenarios against the synthetic placeholder source.
//!
//! These run the real pipeline — loader, demux worker, player workers,
//! wait gate, deferred events — over short synthetic clips, so they need no
//! media files and no system FFmpeg. Clip parameters ride in the URL:
//! `sim://clip?duration=0.5&fps=30&audio=0`.

#![cfg(not(feature = "ffmpeg"))]

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use playhead::{MediaStatus, Player, PlayerConfig, PlayerEvent, State};

const LOAD_TIMEOUT: Duration = Duration::from_secs(2);
const PLAYBACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Receives events until one matches, panicking on timeout.
fn wait_for(
    events: &Receiver<PlayerEvent>,
    timeout: Duration,
    mut matching: impl FnMut(&PlayerEvent) -> bool,
) -> PlayerEvent {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .unwrap_or(Duration::ZERO);
        match events.recv_timeout(remaining) {
            Ok(event) => {
                if matching(&event) {
                    return event;
                }
            }
            Err(e) => panic!("timed out waiting for event: {e}"),
        }
    }
}

/// Asserts that no matching event arrives within `window`.
fn assert_quiet(
    events: &Receiver<PlayerEvent>,
    window: Duration,
    mut matching: impl FnMut(&PlayerEvent) -> bool,
) {
    let deadline = Instant::now() + window;
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .unwrap_or(Duration::ZERO);
        match events.recv_timeout(remaining) {
            Ok(event) => {
                assert!(!matching(&event), "unexpected event: {event:?}");
            }
            Err(RecvTimeoutError::Timeout) => return,
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn loaded_player(source: &str) -> (Player, Receiver<PlayerEvent>) {
    let player = Player::new();
    let events = player.events();
    player.set_source(source);
    wait_for(&events, LOAD_TIMEOUT, |e| {
        matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::Loaded))
    });
    (player, events)
}

#[test]
fn load_reports_source_duration_and_status() {
    let player = Player::new();
    let events = player.events();
    player.set_source("sim://clip?duration=0.5");

    let mut saw_source = false;
    let mut saw_duration = false;
    wait_for(&events, LOAD_TIMEOUT, |event| match event {
        PlayerEvent::SourceChanged(url) => {
            assert!(!saw_duration, "sourceChanged must precede load results");
            assert_eq!(url, "sim://clip?duration=0.5");
            saw_source = true;
            false
        }
        PlayerEvent::DurationChanged(ms) => {
            assert_eq!(*ms, 500);
            saw_duration = true;
            false
        }
        PlayerEvent::MediaStatusChanged(MediaStatus::Loaded) => true,
        _ => false,
    });
    assert!(saw_source && saw_duration);
    assert_eq!(player.duration(), 500);
    assert!(player.is_seekable());
    assert!(player.has_video());
    assert!(player.has_audio());
    assert!((player.video_frame_rate() - 30.0).abs() < 1e-9);
    assert_eq!(player.media_status(), MediaStatus::Loaded);
    assert_eq!(player.state(), State::Stopped);
}

#[test]
fn plays_through_to_end_of_media() {
    let (player, events) = loaded_player("sim://clip?duration=0.5");
    player.play();

    wait_for(&events, LOAD_TIMEOUT, |e| {
        matches!(e, PlayerEvent::StateChanged(State::Playing))
    });
    let played = wait_for(&events, LOAD_TIMEOUT, |e| {
        matches!(e, PlayerEvent::Played(_))
    });
    if let PlayerEvent::Played(pos) = played {
        assert!((0..500).contains(&pos), "played position {pos}");
    }

    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::EndOfMedia))
    });
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::StateChanged(State::Stopped))
    });
    let stopped = wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::Stopped(_))
    });
    if let PlayerEvent::Stopped(pos) = stopped {
        assert_eq!(pos, 500, "stopped at end of media reports duration");
    }
}

#[test]
fn video_frame_pts_is_monotone() {
    let (player, events) = loaded_player("sim://clip?duration=0.5&audio=0");
    player.play();

    let mut last_pts = -1.0;
    let mut frames = 0;
    wait_for(&events, PLAYBACK_TIMEOUT, |event| match event {
        PlayerEvent::VideoFrame(Some(frame)) => {
            assert!(
                frame.pts() >= last_pts,
                "pts went backwards: {} after {last_pts}",
                frame.pts()
            );
            last_pts = frame.pts();
            frames += 1;
            false
        }
        PlayerEvent::MediaStatusChanged(MediaStatus::EndOfMedia) => true,
        _ => false,
    });
    // 0.5 s at 30 fps
    assert!(frames >= 10, "only {frames} frames emitted");
}

#[test]
fn play_before_load_fires_exactly_once() {
    let player = Player::new();
    let events = player.events();
    player.set_source("sim://clip?duration=0.4");
    player.play();

    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::Played(_))
    });
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::EndOfMedia))
    });
    // the deferred play replays once; no second Played may arrive
    assert_quiet(&events, Duration::from_millis(200), |e| {
        matches!(e, PlayerEvent::Played(_))
    });
}

#[test]
fn seek_while_playing_resumes_from_target() {
    let (player, events) = loaded_player("sim://clip?duration=3");
    player.play();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::VideoFrame(Some(_)))
    });

    player.seek(2000);
    let seeked = wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::Seeked(_))
    });
    if let PlayerEvent::Seeked(pos) = seeked {
        // keyframes fall on whole seconds, so 2000 lands exactly
        assert!((1900..=2100).contains(&pos), "seeked position {pos}");
    }

    let frame = wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::VideoFrame(Some(_)))
    });
    if let PlayerEvent::VideoFrame(Some(frame)) = frame {
        assert!(frame.pts() >= 2.0, "frame from {} after seek to 2.0", frame.pts());
    }
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::EndOfMedia))
    });
}

#[test]
fn rapid_seeks_coalesce_to_one_seeked() {
    let (player, events) = loaded_player("sim://clip?duration=4");
    player.play();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::VideoFrame(Some(_)))
    });

    player.seek(1000);
    player.seek(2000);

    let mut seeked_positions = Vec::new();
    wait_for(&events, PLAYBACK_TIMEOUT, |event| match event {
        PlayerEvent::Seeked(pos) => {
            seeked_positions.push(*pos);
            false
        }
        PlayerEvent::MediaStatusChanged(MediaStatus::EndOfMedia) => true,
        _ => false,
    });
    assert_eq!(
        seeked_positions.len(),
        1,
        "seeked fired {} times: {seeked_positions:?}",
        seeked_positions.len()
    );
    assert!((1900..=2100).contains(&seeked_positions[0]));
}

#[test]
fn stop_emits_position_then_render_reset() {
    let (player, events) = loaded_player("sim://clip?duration=2");
    player.play();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::VideoFrame(Some(_)))
    });

    player.stop();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::StateChanged(State::Stopped))
    });
    let stopped = wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::Stopped(_))
    });
    let stop_pos = match stopped {
        PlayerEvent::Stopped(pos) => pos,
        _ => unreachable!(),
    };
    assert!((0..2000).contains(&stop_pos), "stopped mid-stream at {stop_pos}");

    // the render reset follows with no decoded frame in between
    let reset = wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::VideoFrame(_))
    });
    assert!(matches!(reset, PlayerEvent::VideoFrame(None)));

    // stop does not rewind: resuming continues from the stop position
    player.play();
    let played = wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::Played(_))
    });
    if let PlayerEvent::Played(pos) = played {
        assert!(pos >= stop_pos, "resumed from {pos}, stopped at {stop_pos}");
    }
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::EndOfMedia))
    });
}

#[test]
fn invalid_source_reports_resource_error_once() {
    let player = Player::new();
    let events = player.events();
    player.set_source("nonexistent.mp4");

    let error = wait_for(&events, LOAD_TIMEOUT, |e| {
        matches!(e, PlayerEvent::ErrorOccurred(_))
    });
    if let PlayerEvent::ErrorOccurred(e) = error {
        assert!(e.to_string().contains("no such file"));
    }
    wait_for(&events, LOAD_TIMEOUT, |e| {
        matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::Invalid))
    });
    assert!(player.error().is_some());
    assert!(!player.error_string().is_empty());

    // playback on invalid media is a no-op
    player.play();
    assert_quiet(&events, Duration::from_millis(200), |e| {
        matches!(
            e,
            PlayerEvent::StateChanged(_) | PlayerEvent::Played(_)
        )
    });
    assert_eq!(player.state(), State::Stopped);
}

#[test]
fn control_calls_are_idempotent() {
    let (player, events) = loaded_player("sim://clip?duration=2");

    // same source again: full no-op, no teardown, no events
    player.set_source("sim://clip?duration=2");
    assert_quiet(&events, Duration::from_millis(150), |e| {
        matches!(e, PlayerEvent::SourceChanged(_) | PlayerEvent::MediaStatusChanged(_))
    });
    assert_eq!(player.media_status(), MediaStatus::Loaded);

    player.play();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::StateChanged(State::Playing))
    });
    // play while playing: no state change
    player.play();
    assert_quiet(&events, Duration::from_millis(150), |e| {
        matches!(e, PlayerEvent::StateChanged(_))
    });

    player.pause();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::StateChanged(State::Paused))
    });
    player.pause();
    assert_quiet(&events, Duration::from_millis(150), |e| {
        matches!(e, PlayerEvent::StateChanged(_))
    });
}

#[test]
fn pause_freezes_position_until_resumed() {
    let (player, events) = loaded_player("sim://clip?duration=2");
    player.play();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::VideoFrame(Some(_)))
    });

    player.pause();
    let paused = wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::Paused(_))
    });
    let pause_pos = match paused {
        PlayerEvent::Paused(pos) => pos,
        _ => unreachable!(),
    };

    std::thread::sleep(Duration::from_millis(150));
    let drift = (player.position() - pause_pos).abs();
    assert!(drift <= 100, "position drifted {drift}ms while paused");

    player.play();
    let played = wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::Played(_))
    });
    if let PlayerEvent::Played(pos) = played {
        assert!(pos >= pause_pos, "resumed from {pos} before pause point {pause_pos}");
    }
}

#[test]
fn speed_round_trips_and_broadcasts() {
    let (player, events) = loaded_player("sim://clip?duration=0.3");
    player.set_speed(1.5);
    assert!((player.speed() - 1.5).abs() < 1e-9);
    let changed = wait_for(&events, LOAD_TIMEOUT, |e| {
        matches!(e, PlayerEvent::SpeedChanged(_))
    });
    if let PlayerEvent::SpeedChanged(speed) = changed {
        assert!((speed - 1.5).abs() < 1e-9);
    }
    // setting the same speed again is silent
    player.set_speed(1.5);
    assert_quiet(&events, Duration::from_millis(100), |e| {
        matches!(e, PlayerEvent::SpeedChanged(_))
    });
}

#[test]
fn out_of_range_seeks_are_ignored() {
    let (player, events) = loaded_player("sim://clip?duration=1");
    player.play();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::VideoFrame(Some(_)))
    });
    player.seek(-5);
    player.seek(5_000);
    assert_quiet(&events, Duration::from_millis(200), |e| {
        matches!(e, PlayerEvent::Seeked(_))
    });
}

#[test]
fn audio_only_session_emits_audio_frames() {
    let (player, events) = loaded_player("sim://clip?duration=0.5&video=0");
    assert!(!player.has_video());
    assert!(player.has_audio());

    player.play();
    let frame = wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::AudioFrame(_))
    });
    if let PlayerEvent::AudioFrame(frame) = frame {
        assert_eq!(frame.sample_rate(), 48_000);
        assert_eq!(frame.channels(), 2);
    }
    wait_for(&events, PLAYBACK_TIMEOUT, |event| {
        assert!(
            !matches!(event, PlayerEvent::VideoFrame(_)),
            "video frame from an audio-only source"
        );
        matches!(event, PlayerEvent::Stopped(_))
    });
}

#[test]
fn audio_frames_carry_speed_scaled_rate() {
    let (player, events) = loaded_player("sim://clip?duration=0.4&video=0");
    player.set_speed(2.0);
    player.play();
    let frame = wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::AudioFrame(_))
    });
    if let PlayerEvent::AudioFrame(frame) = frame {
        assert_eq!(frame.sample_rate(), 96_000);
    }
}

#[test]
fn playback_survives_tiny_backpressure_cap() {
    let player = Player::with_config(PlayerConfig {
        max_queue_bytes: 4096,
        ..PlayerConfig::default()
    });
    let events = player.events();
    player.set_source("sim://clip?duration=0.4");
    wait_for(&events, LOAD_TIMEOUT, |e| {
        matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::Loaded))
    });
    player.play();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::EndOfMedia))
    });
}

#[test]
fn drop_joins_workers_and_closes_the_stream() {
    let (player, events) = loaded_player("sim://clip?duration=5");
    player.play();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::VideoFrame(Some(_)))
    });

    drop(player);
    let deadline = Instant::now() + PLAYBACK_TIMEOUT;
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .unwrap_or(Duration::ZERO);
        match events.recv_timeout(remaining) {
            Ok(_) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => panic!("event stream never closed after drop"),
        }
    }
}

#[test]
fn replacing_the_source_tears_down_and_reloads() {
    let (player, events) = loaded_player("sim://clip?duration=5");
    player.play();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::VideoFrame(Some(_)))
    });

    player.set_source("sim://other?duration=0.3&fps=25");
    wait_for(&events, LOAD_TIMEOUT, |e| {
        matches!(e, PlayerEvent::SourceChanged(url) if url == "sim://other?duration=0.3&fps=25")
    });
    wait_for(&events, LOAD_TIMEOUT, |e| {
        matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::Loaded))
    });
    assert_eq!(player.duration(), 300);
    assert!((player.video_frame_rate() - 25.0).abs() < 1e-9);
    assert_eq!(player.state(), State::Stopped);

    player.play();
    wait_for(&events, PLAYBACK_TIMEOUT, |e| {
        matches!(e, PlayerEvent::MediaStatusChanged(MediaStatus::EndOfMedia))
    });
}
