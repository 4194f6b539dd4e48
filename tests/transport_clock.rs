// Integration test: Transport clock timing
//
// Drives the clock with synthetic elapsed times, so results do not depend on
// how fast the test machine is.

use mymusic_sequencer::{ClockMode, LoopWindow, Tempo};
use mymusic_sequencer::sequencer::TransportClock;
use rand::Rng;
use std::time::Duration;

fn tempo(bpm: f64) -> Tempo {
    Tempo::new(bpm).unwrap()
}

fn collect_ticks(clock: &mut TransportClock, polls: &[Duration], bpm: f64) -> Vec<u64> {
    let mut ticks = Vec::new();
    for &now in polls {
        ticks.extend(clock.advance(now, tempo(bpm), None).ticks());
    }
    ticks
}

fn collect_looped(
    clock: &mut TransportClock,
    polls: &[Duration],
    window: LoopWindow,
) -> (Vec<u64>, u64) {
    let mut ticks = Vec::new();
    let mut wraps = 0;
    for &now in polls {
        let advance = clock.advance(now, tempo(120.0), Some(window));
        wraps += advance.wrap_count();
        ticks.extend(advance.ticks());
    }
    (ticks, wraps)
}

#[test]
fn test_ticks_per_ms_formula() {
    for bpm in [40.0, 60.0, 98.5, 120.0, 174.0, 300.0] {
        let clock = TransportClock::new(ClockMode::ElapsedTime, tempo(bpm));
        assert!((clock.ticks_per_ms() - bpm * 480.0 / 60_000.0).abs() < 1e-12);
    }
}

#[test]
fn test_doubling_tempo_doubles_ticks() {
    for bpm in [60.0, 90.0, 120.0, 150.0] {
        let mut slow = TransportClock::new(ClockMode::ElapsedTime, tempo(bpm));
        let mut fast = TransportClock::new(ClockMode::ElapsedTime, tempo(bpm * 2.0));

        let slow_ticks = slow.advance(Duration::from_secs(2), tempo(bpm), None);
        let fast_ticks = fast.advance(Duration::from_secs(2), tempo(bpm * 2.0), None);

        // Both include tick 0
        assert_eq!(
            fast_ticks.tick_count() - 1,
            2 * (slow_ticks.tick_count() - 1),
            "bpm {}",
            bpm
        );
    }
}

#[test]
fn test_poll_jitter_does_not_change_ticks() {
    let mut rng = rand::thread_rng();
    let end = Duration::from_millis(2_000);

    for mode in [ClockMode::ElapsedTime, ClockMode::FixedStep { interval_ms: 7 }] {
        let mut reference = TransportClock::new(mode, tempo(120.0));
        let expected = collect_ticks(&mut reference, &[end], 120.0);

        for _ in 0..20 {
            let mut polls: Vec<Duration> = (0..rng.gen_range(1..200))
                .map(|_| Duration::from_micros(rng.gen_range(0..=2_000_000)))
                .collect();
            polls.sort();
            polls.push(end);

            let mut clock = TransportClock::new(mode, tempo(120.0));
            assert_eq!(collect_ticks(&mut clock, &polls, 120.0), expected);
        }
    }
}

#[test]
fn test_poll_jitter_with_loop_does_not_change_ticks() {
    let mut rng = rand::thread_rng();
    let window = LoopWindow::new(0, 10).unwrap();
    let end = Duration::from_millis(500);

    for mode in [ClockMode::ElapsedTime, ClockMode::FixedStep { interval_ms: 1 }] {
        let regular: Vec<Duration> = (0..=500).map(Duration::from_millis).collect();
        let mut reference = TransportClock::new(mode, tempo(120.0));
        let (expected, expected_wraps) = collect_looped(&mut reference, &regular, window);

        for _ in 0..20 {
            // Gaps of up to 60 ms span several passes of the 10-tick loop
            let mut polls = Vec::new();
            let mut now = 0;
            while now < 500_000 {
                polls.push(Duration::from_micros(now));
                now += rng.gen_range(0..=60_000);
            }
            polls.push(end);

            let mut clock = TransportClock::new(mode, tempo(120.0));
            let (ticks, wraps) = collect_looped(&mut clock, &polls, window);
            assert_eq!(ticks, expected, "{:?}", mode);
            assert_eq!(wraps, expected_wraps, "{:?}", mode);
        }
    }
}

#[test]
fn test_no_tick_is_processed_twice() {
    let mut clock = TransportClock::new(ClockMode::ElapsedTime, tempo(133.0));
    let mut seen = Vec::new();
    for millis in (0..=1_000).step_by(3) {
        seen.extend(clock.advance(Duration::from_millis(millis), tempo(133.0), None).ticks());
    }
    assert!(seen.windows(2).all(|pair| pair[1] == pair[0] + 1));
    assert_eq!(seen.first(), Some(&0));
}

#[test]
fn test_one_bar_loop_ends_on_tick_four() {
    let window = LoopWindow::new(0, 96).unwrap();
    let mut clock = TransportClock::new(ClockMode::ElapsedTime, tempo(120.0));

    // 100 ticks of wall time at 120 BPM
    let advance = clock.advance(Duration::from_micros(104_167), tempo(120.0), Some(window));
    let ticks: Vec<u64> = advance.ticks().collect();

    assert_eq!(advance.wrapped_to(), Some(0));
    // Every loop tick exactly once, then the overshoot from the loop start
    assert_eq!(ticks.len(), 96 + 5);
    assert!(ticks[..96].iter().copied().eq(0..96));
    assert_eq!(&ticks[94..], &[94, 95, 0, 1, 2, 3, 4]);
    assert_eq!(clock.last_processed(), Some(4));
}

#[test]
fn test_loop_keeps_cycling() {
    let window = LoopWindow::new(48, 96).unwrap();
    let mut clock = TransportClock::new(ClockMode::FixedStep { interval_ms: 1 }, tempo(120.0));

    let mut wraps = 0;
    for millis in (0..=300).step_by(10) {
        let advance = clock.advance(Duration::from_millis(millis), tempo(120.0), Some(window));
        if advance.wrapped_to().is_some() {
            wraps += 1;
        }
        assert!(advance.ticks().all(|tick| tick < 96));
    }
    // 96 ticks to the first wrap, then one wrap every 48
    assert_eq!(wraps, 5);
}

#[test]
fn test_tempo_change_mid_run() {
    let mut clock = TransportClock::new(ClockMode::ElapsedTime, tempo(60.0));
    clock.advance(Duration::from_millis(500), tempo(60.0), None);
    assert_eq!(clock.last_processed(), Some(240));

    // The half second already played keeps its 60 BPM timing
    clock.advance(Duration::from_millis(1_000), tempo(120.0), None);
    assert_eq!(clock.last_processed(), Some(240 + 480));
}
