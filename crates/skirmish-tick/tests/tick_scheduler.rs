//! Integration tests for the simulation clock.
//!
//! Uses `tokio::time::pause()` (via `start_paused`) so sleeps resolve
//! as soon as the runtime auto-advances the clock.

use std::time::Duration;

use skirmish_tick::{TickConfig, TickPolicy, TickScheduler, TimerQueue, TICKS_PER_SECOND};

// =========================================================================
// Helpers
// =========================================================================

fn config_no_jitter() -> TickConfig {
    TickConfig {
        initial_jitter_us: 0,
        ..TickConfig::default()
    }
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_runs_at_simulation_rate() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.tick_rate_hz, TICKS_PER_SECOND);
    assert_eq!(cfg.tick_duration(), Duration::from_millis(50));
}

#[test]
fn test_scheduler_initial_state() {
    let s = TickScheduler::new(config_no_jitter());
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.tick_rate_hz(), 20);
    assert!(!s.is_paused());
    assert_eq!(s.tick_duration(), Duration::from_millis(50));
}

#[test]
fn test_with_rate_constructor() {
    let s = TickScheduler::with_rate(10);
    assert_eq!(s.tick_rate_hz(), 10);
    assert_eq!(s.tick_duration(), Duration::from_millis(100));
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_ticks_increment_monotonically() {
    let mut s = TickScheduler::new(config_no_jitter());
    for expected in 1..=5 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
        assert!(!info.overrun);
    }
    assert_eq!(s.tick_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_tick_waits_one_duration() {
    let mut s = TickScheduler::new(config_no_jitter());
    let start = tokio::time::Instant::now();
    s.wait_for_tick().await;
    assert_eq!(start.elapsed(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reports_skipped_ticks() {
    let mut s = TickScheduler::new(config_no_jitter());
    s.wait_for_tick().await;
    // Fall 3.5 ticks behind.
    tokio::time::advance(Duration::from_millis(225)).await;
    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert!(info.ticks_skipped >= 3);
    assert_eq!(s.overruns(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_catch_up_policy_keeps_original_cadence() {
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::CatchUp { max_catchup: 10 },
        ..config_no_jitter()
    });
    s.wait_for_tick().await;
    tokio::time::advance(Duration::from_millis(120)).await;
    let info = s.wait_for_tick().await;
    assert_eq!(info.ticks_skipped, 0);
    // Catch-up ticks are already due and fire without further waiting.
    let before = tokio::time::Instant::now();
    s.wait_for_tick().await;
    assert_eq!(before.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_paused_scheduler_never_fires() {
    let mut s = TickScheduler::new(config_no_jitter());
    s.pause();
    assert!(s.is_paused());
    let result = tokio::time::timeout(Duration::from_secs(1), s.wait_for_tick()).await;
    assert!(result.is_err());
    assert_eq!(s.tick_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_resume_restarts_ticking() {
    let mut s = TickScheduler::new(config_no_jitter());
    s.pause();
    s.resume();
    assert!(!s.is_paused());
    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
}

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_without_tick_is_noop() {
    let mut s = TickScheduler::new(config_no_jitter());
    s.record_tick_end();
    s.wait_for_tick().await;
    s.record_tick_end();
    assert_eq!(s.tick_count(), 1);
}

// =========================================================================
// Scheduler + timer queue together
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_timer_queue_driven_by_scheduler() {
    let mut s = TickScheduler::new(config_no_jitter());
    let mut timers = TimerQueue::new();
    timers.schedule_in(u64::from(TICKS_PER_SECOND), "one second");

    let mut fired_on = None;
    for _ in 0..40 {
        let info = s.wait_for_tick().await;
        if !timers.advance().is_empty() {
            fired_on = Some(info.tick);
        }
    }
    assert_eq!(fired_on, Some(20));
}
