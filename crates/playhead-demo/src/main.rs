//! playhead demo: load a source, play it through, print the event stream.
//!
//! ```bash
//! cargo run -p playhead-demo --features ffmpeg -- movie.mkv
//! # or, without system FFmpeg, against the synthetic source:
//! cargo run -p playhead-demo -- "sim://demo?duration=3"
//! ```

use std::env;

use playhead::{MediaStatus, Player, PlayerEvent};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("playhead=info")),
        )
        .init();

    let source = env::args()
        .nth(1)
        .unwrap_or_else(|| "sim://demo?duration=3".to_string());
    println!("playing {source}");

    let player = Player::new();
    let events = player.events();
    player.set_source(&source);
    player.play();

    let mut video_frames = 0u64;
    let mut audio_frames = 0u64;
    let mut ended = false;
    for event in events.iter() {
        match event {
            PlayerEvent::MediaStatusChanged(status) => {
                println!("media status: {status:?}");
                match status {
                    MediaStatus::EndOfMedia => ended = true,
                    MediaStatus::Invalid => {
                        eprintln!("error: {}", player.error_string());
                        std::process::exit(1);
                    }
                    _ => {}
                }
            }
            PlayerEvent::StateChanged(state) => println!("state: {state:?}"),
            PlayerEvent::DurationChanged(ms) => println!("duration: {ms} ms"),
            PlayerEvent::SeekableChanged(seekable) => println!("seekable: {seekable}"),
            PlayerEvent::VideoFrameRateChanged(fps) => println!("video frame rate: {fps:.2}"),
            PlayerEvent::Played(pos) => println!("playing from {pos} ms"),
            PlayerEvent::Paused(pos) => println!("paused at {pos} ms"),
            PlayerEvent::Seeked(pos) => println!("seeked to {pos} ms"),
            PlayerEvent::Stopped(pos) => {
                println!(
                    "stopped at {pos} ms ({video_frames} video frames, {audio_frames} audio frames)"
                );
                if ended {
                    break;
                }
            }
            PlayerEvent::VideoFrame(Some(_)) => video_frames += 1,
            PlayerEvent::AudioFrame(_) => audio_frames += 1,
            _ => {}
        }
    }
}
