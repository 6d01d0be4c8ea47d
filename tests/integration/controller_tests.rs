//! Controller-level tests: the hysteresis contract as observed through
//! the command link.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use flaregate::app::events::AppEvent;
use flaregate::app::ports::CommandLink;
use flaregate::app::service::ControlService;
use flaregate::config::SystemConfig;
use flaregate::fsm::StateId;
use flaregate::severity::SeverityScore;
use flaregate::wire::Command;
use flaregate::Error;
use flaregate::TransportError;

use crate::mocks::{CollectSink, InstantClock, MockLink, ScriptedSeverity};

fn make_service() -> (ControlService, MockLink, InstantClock, CollectSink) {
    let mut service = ControlService::new(SystemConfig::default());
    let mut sink = CollectSink::new();
    service.start(&mut sink);
    (service, MockLink::new(), InstantClock::new(), sink)
}

/// Run `n` cycles against a constant score.
fn cycles(
    service: &mut ControlService,
    score: SeverityScore,
    n: usize,
    link: &mut MockLink,
    clock: &InstantClock,
    sink: &mut CollectSink,
) {
    let mut severity = ScriptedSeverity::constant(score);
    for _ in 0..n {
        service
            .tick(&mut severity, link, clock, sink)
            .expect("tick should succeed");
    }
}

// ── Engagement ────────────────────────────────────────────────

#[test]
fn three_hot_samples_send_exactly_one_pulse() {
    let (mut service, mut link, clock, mut sink) = make_service();

    cycles(
        &mut service,
        SeverityScore::SEVERE,
        3,
        &mut link,
        &clock,
        &mut sink,
    );

    // One FORWARD+STOP on the first sample, suppression on the rest.
    assert_eq!(link.sent, vec![Command::Forward, Command::Stop]);
    assert_eq!(service.state(), StateId::Engaged);
}

#[test]
fn elevated_score_stays_below_threshold() {
    let (mut service, mut link, clock, mut sink) = make_service();

    cycles(
        &mut service,
        SeverityScore::ELEVATED,
        5,
        &mut link,
        &clock,
        &mut sink,
    );

    assert!(link.sent.is_empty());
    assert_eq!(service.state(), StateId::Idle);
}

#[test]
fn dwell_between_command_and_stop_matches_config() {
    let (mut service, mut link, clock, mut sink) = make_service();

    cycles(
        &mut service,
        SeverityScore::SEVERE,
        1,
        &mut link,
        &clock,
        &mut sink,
    );

    let dwell = Duration::from_secs(SystemConfig::default().dwell_secs);
    assert_eq!(clock.sleeps.borrow().as_slice(), &[dwell]);
}

// ── Disengagement ─────────────────────────────────────────────

fn engaged_service() -> (ControlService, MockLink, InstantClock, CollectSink) {
    let (mut service, mut link, clock, mut sink) = make_service();
    cycles(
        &mut service,
        SeverityScore::SEVERE,
        1,
        &mut link,
        &clock,
        &mut sink,
    );
    link.sent.clear();
    (service, link, clock, sink)
}

#[test]
fn nine_quiet_samples_do_not_disengage() {
    let (mut service, mut link, clock, mut sink) = engaged_service();

    cycles(
        &mut service,
        SeverityScore::QUIET,
        9,
        &mut link,
        &clock,
        &mut sink,
    );

    assert!(link.sent.is_empty(), "no REVERSE before the full streak");
    assert_eq!(service.state(), StateId::Engaged);
    assert_eq!(service.below_streak(), 9);
}

#[test]
fn tenth_quiet_sample_disengages_once() {
    let (mut service, mut link, clock, mut sink) = engaged_service();

    cycles(
        &mut service,
        SeverityScore::QUIET,
        10,
        &mut link,
        &clock,
        &mut sink,
    );

    assert_eq!(link.sent, vec![Command::Reverse, Command::Stop]);
    assert_eq!(service.state(), StateId::Idle);
    assert_eq!(service.below_streak(), 0);
}

#[test]
fn hot_sample_mid_streak_resets_counter_without_pulse() {
    let (mut service, mut link, clock, mut sink) = engaged_service();

    cycles(
        &mut service,
        SeverityScore::QUIET,
        5,
        &mut link,
        &clock,
        &mut sink,
    );
    assert_eq!(service.below_streak(), 5);

    cycles(
        &mut service,
        SeverityScore::SEVERE,
        1,
        &mut link,
        &clock,
        &mut sink,
    );

    assert!(link.sent.is_empty(), "no command while already engaged");
    assert_eq!(service.state(), StateId::Engaged);
    assert_eq!(service.below_streak(), 0);

    // The interrupted streak starts over: nine more quiet samples still
    // do not disengage.
    cycles(
        &mut service,
        SeverityScore::QUIET,
        9,
        &mut link,
        &clock,
        &mut sink,
    );
    assert!(link.sent.is_empty());
    assert_eq!(service.state(), StateId::Engaged);
}

#[test]
fn full_engage_disengage_round() {
    let (mut service, mut link, clock, mut sink) = make_service();

    cycles(&mut service, SeverityScore::SEVERE, 2, &mut link, &clock, &mut sink);
    cycles(&mut service, SeverityScore::QUIET, 10, &mut link, &clock, &mut sink);
    cycles(&mut service, SeverityScore::SEVERE, 1, &mut link, &clock, &mut sink);

    assert_eq!(
        link.sent,
        vec![
            Command::Forward,
            Command::Stop,
            Command::Reverse,
            Command::Stop,
            Command::Forward,
            Command::Stop,
        ]
    );
    assert_eq!(service.state(), StateId::Engaged);
}

// ── Transport failure ─────────────────────────────────────────

#[test]
fn write_failure_aborts_the_cycle() {
    let (mut service, _, clock, mut sink) = make_service();
    let mut link = MockLink::failing_after(0);
    let mut severity = ScriptedSeverity::constant(SeverityScore::SEVERE);

    let err = service
        .tick(&mut severity, &mut link, &clock, &mut sink)
        .unwrap_err();

    assert_eq!(err, Error::Transport(TransportError::WriteFailed));
}

#[test]
fn failure_on_the_stop_write_also_aborts() {
    let (mut service, _, clock, mut sink) = make_service();
    // First send (FORWARD) succeeds, the follow-up STOP fails.
    let mut link = MockLink::failing_after(1);
    let mut severity = ScriptedSeverity::constant(SeverityScore::SEVERE);

    let err = service
        .tick(&mut severity, &mut link, &clock, &mut sink)
        .unwrap_err();

    assert_eq!(err, Error::Transport(TransportError::WriteFailed));
    assert_eq!(link.sent, vec![Command::Forward]);
}

// ── Events & passthrough ──────────────────────────────────────

#[test]
fn engagement_emits_structured_events() {
    let (mut service, mut link, clock, mut sink) = make_service();

    assert!(sink.contains(&AppEvent::Started(StateId::Idle)));

    cycles(
        &mut service,
        SeverityScore::SEVERE,
        1,
        &mut link,
        &clock,
        &mut sink,
    );

    assert!(sink.contains(&AppEvent::Sampled {
        score: SeverityScore::SEVERE,
        streak: 0
    }));
    assert!(sink.contains(&AppEvent::PulseApplied {
        command: Command::Forward
    }));
    assert!(sink.contains(&AppEvent::StateChanged {
        from: StateId::Idle,
        to: StateId::Engaged
    }));
}

#[test]
fn hub_output_is_surfaced_as_events() {
    let (mut service, mut link, clock, mut sink) = make_service();
    link.push_output(b"rdy");
    link.push_output(b"motor ok");

    cycles(
        &mut service,
        SeverityScore::QUIET,
        1,
        &mut link,
        &clock,
        &mut sink,
    );

    assert!(sink.contains(&AppEvent::HubOutput(b"rdy".to_vec())));
    assert!(sink.contains(&AppEvent::HubOutput(b"motor ok".to_vec())));
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn run_honours_stop_flag_and_disconnects_once() {
    let (mut service, mut link, clock, mut sink) = make_service();
    let mut severity = ScriptedSeverity::constant(SeverityScore::QUIET);

    let stop = AtomicBool::new(true);
    service
        .run(&mut severity, &mut link, &clock, &mut sink, &stop)
        .expect("run should exit cleanly");

    assert_eq!(link.disconnect_calls, 1);
    assert!(!link.is_connected());
}

#[test]
fn shutdown_disconnect_failure_is_swallowed() {
    let (service, mut link, _, _) = make_service();
    link.connected = false;

    // Best-effort: a failing disconnect is logged, not propagated.
    service.shutdown(&mut link);
    assert_eq!(link.disconnect_calls, 0);
}

#[test]
fn stop_mid_run_ends_the_loop() {
    let (mut service, mut link, _clock, mut sink) = make_service();
    let mut severity = ScriptedSeverity::constant(SeverityScore::QUIET);

    // A clock that raises the stop flag on the first end-of-cycle sleep,
    // as an interrupt handler would between cycles.
    let stop = AtomicBool::new(false);
    struct StopClock<'a>(&'a AtomicBool);
    impl flaregate::app::ports::Clock for StopClock<'_> {
        fn sleep(&self, _d: Duration) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    service
        .run(&mut severity, &mut link, &StopClock(&stop), &mut sink, &stop)
        .expect("run should exit cleanly");

    assert_eq!(service.cycle_count(), 1);
    assert_eq!(link.disconnect_calls, 1);
}
