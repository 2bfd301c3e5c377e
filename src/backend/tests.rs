use std::path::Path;
use std::time::{Duration, Instant};

use super::fake::FakeBackend;
use super::*;

fn quick(timeout_ms: u64) -> RetryPolicy {
    RetryPolicy::new(Duration::from_millis(1), Duration::from_millis(timeout_ms))
}

fn started(fake: &FakeBackend) -> SharedBackend {
    let shared = SharedBackend::new(fake.clone());
    shared.with(|b| {
        b.load(Path::new("/music/a.mp3")).unwrap();
        b.play().unwrap();
    });
    shared
}

#[test]
fn retry_returns_ready_value() {
    let mut calls = 0;
    let out = retry_with_backoff(&quick(500), |_| {
        calls += 1;
        Ok((calls == 3).then_some(calls))
    })
    .unwrap();
    assert_eq!(out, Outcome::Ready(3));
}

#[test]
fn retry_times_out_after_deadline() {
    let start = Instant::now();
    let out: Outcome<()> = retry_with_backoff(&quick(30), |_| Ok(None)).unwrap();
    assert!(matches!(out, Outcome::TimedOut { elapsed } if elapsed >= Duration::from_millis(30)));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn retry_propagates_probe_errors() {
    let err = retry_with_backoff::<()>(&quick(500), |_| Err(PlayerError::NothingPlaying)).unwrap_err();
    assert!(matches!(err, PlayerError::NothingPlaying));
}

#[test]
fn retry_policy_interval_is_bounded() {
    let p = RetryPolicy::new(Duration::from_millis(5), Duration::from_secs(1));
    assert_eq!(p.initial, Duration::from_millis(5));
    assert_eq!(p.max_interval, Duration::from_millis(80));

    let p = RetryPolicy::new(Duration::ZERO, Duration::from_secs(1));
    assert_eq!(p.initial, Duration::from_millis(1));
}

#[test]
fn wait_until_playing_polls_through_opening() {
    let fake = FakeBackend::new();
    fake.inspect(|s| s.opening_polls = 4);
    let shared = started(&fake);

    let mut seen = Vec::new();
    shared
        .wait_until_playing(&quick(1000), |state, _| seen.push(state))
        .unwrap();

    assert_eq!(seen.iter().filter(|s| **s == BackendState::Opening).count(), 4);
    assert_eq!(seen.last(), Some(&BackendState::Playing));
}

#[test]
fn wait_until_playing_times_out_as_playback_failure() {
    let fake = FakeBackend::new();
    fake.inspect(|s| s.never_plays = true);
    let shared = started(&fake);

    let err = shared.wait_until_playing(&quick(20), |_, _| {}).unwrap_err();
    assert!(matches!(err, PlayerError::PlaybackFailed(ref m) if m.contains("Opening")));
}

#[test]
fn wait_until_playing_fails_fast_on_error_state() {
    let fake = FakeBackend::new();
    let shared = started(&fake);
    fake.inspect(|s| s.state = BackendState::Error);

    let start = Instant::now();
    let err = shared.wait_until_playing(&quick(5000), |_, _| {}).unwrap_err();
    assert!(matches!(err, PlayerError::PlaybackFailed(_)));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn force_unmuted_volume_rewrites_until_confirmed() {
    let fake = FakeBackend::new();
    fake.inspect(|s| {
        s.mute_on_play = true;
        s.stale_volume_reads = 3;
        s.stale_volume = 100;
    });
    let shared = started(&fake);
    shared.wait_until_playing(&quick(1000), |_, _| {}).unwrap();

    let mut retries = 0;
    shared
        .force_unmuted_volume(0, &quick(1000), |_| retries += 1)
        .unwrap();

    assert!(retries >= 1);
    fake.inspect(|s| {
        assert!(!s.muted);
        assert_eq!(s.volume, 0);
        assert!(s.volume_writes.iter().all(|v| *v == 0));
    });
}

#[test]
fn force_unmuted_volume_reports_desync_timeout() {
    let fake = FakeBackend::new();
    fake.inspect(|s| s.ignore_volume = true);
    let shared = started(&fake);

    let err = shared
        .force_unmuted_volume(40, &quick(20), |_| {})
        .unwrap_err();
    assert!(matches!(err, PlayerError::BackendDesyncTimeout { .. }));
    assert!(err.is_warning());
}

#[test]
fn backend_state_activity() {
    assert!(BackendState::Playing.is_active());
    assert!(BackendState::Paused.is_active());
    assert!(!BackendState::Opening.is_active());
    assert!(!BackendState::Ended.is_active());
}
