//! End-to-end tests over the loopback hub: controller and receiver joined
//! by the simulated session, driven deterministically on one thread.

use flaregate::adapters::loopback::{loopback_pair, DeviceEndpoint, LoopbackLink};
use flaregate::app::events::AppEvent;
use flaregate::app::ports::CommandLink;
use flaregate::app::service::ControlService;
use flaregate::config::SystemConfig;
use flaregate::device::motor::{Direction, MotorState, ShutterMotor};
use flaregate::device::transport::Transport;
use flaregate::device::{CommandReceiver, ReceiverState, FORWARD_DUTY, REVERSE_DUTY};
use flaregate::severity::SeverityScore;
use flaregate::wire::Command;

use crate::mocks::{CollectSink, InstantClock, ScriptedSeverity};

type SimReceiver<'a> = CommandReceiver<DeviceEndpoint, ShutterMotor, &'a InstantClock>;

struct Sim<'a> {
    service: ControlService,
    link: LoopbackLink,
    receiver: SimReceiver<'a>,
    clock: &'a InstantClock,
    sink: CollectSink,
}

fn make_sim(clock: &InstantClock) -> Sim<'_> {
    let (link, endpoint) = loopback_pair();
    let receiver = CommandReceiver::new(endpoint, ShutterMotor::new(), clock);
    let mut service = ControlService::new(SystemConfig::default());
    let mut sink = CollectSink::new();
    service.start(&mut sink);

    Sim {
        service,
        link,
        receiver,
        clock,
        sink,
    }
}

impl Sim<'_> {
    fn tick(&mut self, score: SeverityScore) {
        let mut severity = ScriptedSeverity::constant(score);
        self.service
            .tick(&mut severity, &mut self.link, &self.clock, &mut self.sink)
            .expect("tick should succeed");
    }

    /// Let the receiver drain everything the controller queued.
    fn settle_device(&mut self) {
        for _ in 0..64 {
            if self.receiver.state() == ReceiverState::Terminated {
                return;
            }
            if let Err(e) = self.receiver.step() {
                panic!("receiver failed: {e:?}");
            }
            if self.receiver.state() == ReceiverState::Await
                && !self.receiver.transport().available()
            {
                return;
            }
        }
        panic!("device never settled");
    }
}

#[test]
fn engagement_closes_then_stops_the_shutter() {
    let clock = InstantClock::new();
    let mut sim = make_sim(&clock);

    sim.tick(SeverityScore::SEVERE);

    // The controller queued FORWARD then STOP. Step the receiver through
    // the first frame and observe the motor actually running.
    for _ in 0..3 {
        sim.receiver.step().unwrap();
    }
    assert_eq!(
        sim.receiver.motor().state(),
        MotorState::Running {
            duty: FORWARD_DUTY,
            dir: Direction::Forward
        }
    );

    sim.settle_device();
    assert_eq!(sim.receiver.motor().state(), MotorState::Stopped);
}

#[test]
fn disengagement_reverses_then_stops_the_shutter() {
    let clock = InstantClock::new();
    let mut sim = make_sim(&clock);

    sim.tick(SeverityScore::SEVERE);
    sim.settle_device();

    let streak = SystemConfig::default().disengage_streak;
    for _ in 0..streak - 1 {
        sim.tick(SeverityScore::QUIET);
    }
    sim.settle_device();
    assert_eq!(
        sim.receiver.motor().state(),
        MotorState::Stopped,
        "no actuation before the streak completes"
    );

    sim.tick(SeverityScore::QUIET);
    for _ in 0..3 {
        sim.receiver.step().unwrap();
    }
    assert_eq!(
        sim.receiver.motor().state(),
        MotorState::Running {
            duty: REVERSE_DUTY,
            dir: Direction::Reverse
        }
    );

    sim.settle_device();
    assert_eq!(sim.receiver.motor().state(), MotorState::Stopped);
}

#[test]
fn readiness_heartbeat_reaches_the_controller() {
    let clock = InstantClock::new();
    let mut sim = make_sim(&clock);

    // A quiet device cycle emits the readiness token before parking.
    sim.settle_device();

    // The next controller cycle drains it as passthrough output.
    sim.tick(SeverityScore::QUIET);
    assert!(
        sim.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::HubOutput(payload) if payload.as_slice() == b"rdy")),
        "readiness token should surface as hub output"
    );
}

#[test]
fn terminate_over_the_link_ends_the_receiver() {
    let clock = InstantClock::new();
    let mut sim = make_sim(&clock);

    sim.link.send(Command::Terminate).unwrap();
    sim.settle_device();

    assert_eq!(sim.receiver.state(), ReceiverState::Terminated);
}

#[test]
fn disconnected_device_keeps_polling_quietly() {
    let clock = InstantClock::new();
    let mut sim = make_sim(&clock);

    sim.service.shutdown(&mut sim.link);
    assert!(!sim.link.is_connected());

    // The device just sees silence: readiness fires, then it parks in
    // AWAIT napping between polls.
    sim.settle_device();
    assert_eq!(sim.receiver.state(), ReceiverState::Await);
    assert_eq!(sim.receiver.motor().state(), MotorState::Stopped);
}
