#![cfg(test)]

use std::{cell::RefCell, rc::Rc};

use assert_matches2::assert_matches;
use futures_util::FutureExt;
use strum::IntoEnumIterator;

use super::*;

/// A call made by the controller to one of its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    RequestAccess,
    OpenSettings,
    CreateSession,
    AddInput,
    AddOutput(Vec<Symbology>),
    AttachPreview(PreviewLayer),
    Start,
    Stop,
    Status(String),
}

/// The calls shared by all the collaborators, in order.
type CallLog = Rc<RefCell<Vec<Call>>>;

/// The sender registered by the metadata output, if any.
type OutputSlot = Rc<RefCell<Option<MetadataSender>>>;

struct TestPermission {
    status: PermissionStatus,
    /// The answer of the user to the request.
    grant: bool,
    log: CallLog,
}

impl PermissionProvider for TestPermission {
    fn status(&self) -> PermissionStatus {
        self.status
    }

    async fn request_access(&self) -> bool {
        self.log.borrow_mut().push(Call::RequestAccess);
        self.grant
    }

    fn open_settings(&self) -> Result<(), PermissionError> {
        self.log.borrow_mut().push(Call::OpenSettings);
        Ok(())
    }
}

#[derive(Debug)]
struct TestInput;

struct TestDevice {
    has_camera: bool,
    accepts_input: bool,
    accepts_output: bool,
    log: CallLog,
    output: OutputSlot,
}

impl CaptureDevice for TestDevice {
    type Session = TestSession;

    fn create_session(&self) -> TestSession {
        self.log.borrow_mut().push(Call::CreateSession);

        TestSession {
            accepts_input: self.accepts_input,
            accepts_output: self.accepts_output,
            running: false,
            log: self.log.clone(),
            output: self.output.clone(),
        }
    }

    fn default_video_input(&self) -> Result<TestInput, PipelineError> {
        if self.has_camera {
            Ok(TestInput)
        } else {
            Err(PipelineError::NoCamera)
        }
    }
}

/// A session that records every call, without guarding against repeated
/// calls.
struct TestSession {
    accepts_input: bool,
    accepts_output: bool,
    running: bool,
    log: CallLog,
    output: OutputSlot,
}

impl CaptureSession for TestSession {
    type Input = TestInput;

    fn can_add_input(&self, _input: &TestInput) -> bool {
        self.accepts_input
    }

    fn add_input(&mut self, _input: TestInput) {
        self.log.borrow_mut().push(Call::AddInput);
    }

    fn can_add_output(&self, _output: &MetadataOutput) -> bool {
        self.accepts_output
    }

    fn add_output(&mut self, output: MetadataOutput) {
        self.log
            .borrow_mut()
            .push(Call::AddOutput(output.object_types.clone()));
        self.output.replace(Some(output.sender));
    }

    fn attach_preview(&mut self, layer: PreviewLayer) {
        self.log.borrow_mut().push(Call::AttachPreview(layer));
    }

    fn start_running(&mut self) {
        self.log.borrow_mut().push(Call::Start);
        self.running = true;
    }

    fn stop_running(&mut self) {
        self.log.borrow_mut().push(Call::Stop);
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

struct TestView {
    log: CallLog,
    phases: Rc<RefCell<Vec<ScannerPhase>>>,
}

impl ScannerView for TestView {
    fn set_status(&self, text: &str) {
        self.log.borrow_mut().push(Call::Status(text.to_owned()));
    }

    fn phase_changed(&self, phase: ScannerPhase) {
        self.phases.borrow_mut().push(phase);
    }
}

/// The environment of a controller under test.
struct Setup {
    status: PermissionStatus,
    grant: bool,
    has_camera: bool,
    accepts_input: bool,
    accepts_output: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            status: PermissionStatus::Granted,
            grant: true,
            has_camera: true,
            accepts_input: true,
            accepts_output: true,
        }
    }
}

impl Setup {
    fn build(self) -> Fixture {
        let log = CallLog::default();
        let output = OutputSlot::default();
        let phases = Rc::new(RefCell::new(Vec::new()));
        let (sender, events) = mpsc::unbounded();

        let controller = ScannerController::new(
            TestPermission {
                status: self.status,
                grant: self.grant,
                log: log.clone(),
            },
            TestDevice {
                has_camera: self.has_camera,
                accepts_input: self.accepts_input,
                accepts_output: self.accepts_output,
                log: log.clone(),
                output: output.clone(),
            },
            TestView {
                log: log.clone(),
                phases: phases.clone(),
            },
            sender,
        );

        Fixture {
            controller,
            log,
            output,
            phases,
            events,
        }
    }
}

struct Fixture {
    controller: ScannerController<TestPermission, TestDevice, TestView>,
    log: CallLog,
    output: OutputSlot,
    phases: Rc<RefCell<Vec<ScannerPhase>>>,
    events: mpsc::UnboundedReceiver<ScannerEvent>,
}

impl Fixture {
    /// Load the controller, the doubles never suspend.
    fn load(&self) {
        self.controller
            .load()
            .now_or_never()
            .expect("load should complete without suspending");
    }

    fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    /// Take the calls recorded so far.
    fn take_calls(&self) -> Vec<Call> {
        self.log.take()
    }

    fn count(&self, call: &Call) -> usize {
        self.log.borrow().iter().filter(|c| *c == call).count()
    }

    fn next_event(&mut self) -> Option<ScannerEvent> {
        self.events.next().now_or_never().flatten()
    }
}

impl<P, D: CaptureDevice, V> ScannerController<P, D, V> {
    fn detected_code(&self) -> Option<String> {
        self.detected_code.borrow().clone()
    }

    fn failure(&self) -> Option<PipelineError> {
        match &*self.pipeline.borrow() {
            PipelineState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }
}

fn hello() -> Vec<MetadataObject> {
    vec![MetadataObject::qr_code(b"HELLO")]
}

#[test]
fn every_status_maps_to_one_action() {
    for status in PermissionStatus::iter() {
        let expected = match status {
            PermissionStatus::NotDetermined => PermissionAction::Request,
            PermissionStatus::Denied => PermissionAction::OpenSettings,
            PermissionStatus::Granted | PermissionStatus::Restricted => PermissionAction::None,
        };
        assert_eq!(status.action(), expected, "{}", status.as_ref());
    }
}

#[test]
fn load_handles_every_status() {
    for status in PermissionStatus::iter() {
        let fixture = Setup {
            status,
            ..Default::default()
        }
        .build();
        fixture.load();

        let requested = fixture.count(&Call::RequestAccess);
        let redirected = fixture.count(&Call::OpenSettings);

        match status {
            PermissionStatus::NotDetermined => assert_eq!((requested, redirected), (1, 0)),
            PermissionStatus::Denied => assert_eq!((requested, redirected), (0, 1)),
            PermissionStatus::Granted | PermissionStatus::Restricted => {
                assert_eq!((requested, redirected), (0, 0));
            }
        }
    }
}

#[test]
fn granted_starts_scanning_on_appear() {
    let fixture = Setup::default().build();

    fixture.load();
    assert_eq!(fixture.controller.phase(), ScannerPhase::Ready);
    assert_eq!(
        fixture.take_calls(),
        vec![
            Call::CreateSession,
            Call::AddInput,
            Call::AddOutput(vec![Symbology::Qr]),
            Call::AttachPreview(PreviewLayer { fill_view: true }),
        ]
    );

    fixture.controller.appear();
    assert_eq!(fixture.controller.phase(), ScannerPhase::Scanning);
    assert_eq!(fixture.calls(), vec![Call::Start]);
}

#[test]
fn detection_stops_session_then_shows_code() {
    let fixture = Setup::default().build();
    fixture.load();
    fixture.controller.appear();
    fixture.take_calls();

    fixture.controller.handle_detection(&hello());

    assert_eq!(
        fixture.calls(),
        vec![Call::Stop, Call::Status("HELLO".to_owned())]
    );
    assert_eq!(fixture.controller.detected_code().as_deref(), Some("HELLO"));
    assert_eq!(fixture.controller.phase(), ScannerPhase::Detected);
    assert_eq!(
        fixture.phases.borrow().last(),
        Some(&ScannerPhase::Detected)
    );
}

#[test]
fn scan_again_clears_label_and_restarts() {
    let fixture = Setup::default().build();
    fixture.load();
    fixture.controller.appear();
    fixture.controller.handle_detection(&hello());
    fixture.take_calls();

    fixture.controller.scan_again();

    assert_eq!(fixture.calls(), vec![Call::Status(String::new()), Call::Start]);
    assert_eq!(fixture.controller.detected_code(), None);
    assert_eq!(fixture.controller.phase(), ScannerPhase::Scanning);
}

#[test]
fn new_detection_overwrites_previous_code() {
    let fixture = Setup::default().build();
    fixture.load();
    fixture.controller.appear();
    fixture.controller.handle_detection(&hello());
    fixture.controller.scan_again();

    fixture
        .controller
        .handle_detection(&[MetadataObject::qr_code(b"WORLD")]);

    assert_eq!(fixture.controller.detected_code().as_deref(), Some("WORLD"));
}

#[test]
fn denied_opens_settings_without_session() {
    let fixture = Setup {
        status: PermissionStatus::Denied,
        ..Default::default()
    }
    .build();

    fixture.load();
    fixture.controller.appear();

    assert_eq!(fixture.calls(), vec![Call::OpenSettings]);
    assert!(!fixture.controller.has_session());
    assert_eq!(fixture.controller.phase(), ScannerPhase::Idle);
}

#[test]
fn restricted_builds_nothing() {
    let fixture = Setup {
        status: PermissionStatus::Restricted,
        ..Default::default()
    }
    .build();

    fixture.load();

    assert!(fixture.calls().is_empty());
    assert_eq!(fixture.controller.phase(), ScannerPhase::Idle);
}

#[test]
fn rejected_input_fails_pipeline() {
    let fixture = Setup {
        accepts_input: false,
        ..Default::default()
    }
    .build();

    fixture.load();
    fixture.controller.appear();

    assert_eq!(
        fixture.calls(),
        vec![Call::CreateSession, Call::Status("Fail Scanning".to_owned())]
    );
    assert!(!fixture.controller.has_session());
    assert_matches!(fixture.controller.failure(), Some(PipelineError::InputRejected));
    assert_eq!(fixture.controller.phase(), ScannerPhase::Failed);
}

#[test]
fn rejected_output_fails_pipeline() {
    let fixture = Setup {
        accepts_output: false,
        ..Default::default()
    }
    .build();

    fixture.load();
    fixture.controller.appear();

    assert_eq!(
        fixture.calls(),
        vec![
            Call::CreateSession,
            Call::AddInput,
            Call::Status("Fail Scanning".to_owned())
        ]
    );
    assert!(!fixture.controller.has_session());
    assert_matches!(fixture.controller.failure(), Some(PipelineError::OutputRejected));
}

#[test]
fn missing_camera_fails_pipeline() {
    let fixture = Setup {
        has_camera: false,
        ..Default::default()
    }
    .build();

    fixture.load();

    assert_eq!(fixture.count(&Call::Status("Fail Scanning".to_owned())), 1);
    assert_matches!(fixture.controller.failure(), Some(PipelineError::NoCamera));
    assert_eq!(fixture.count(&Call::AddInput), 0);
}

#[test]
fn failed_pipeline_is_terminal() {
    let fixture = Setup {
        accepts_input: false,
        ..Default::default()
    }
    .build();
    fixture.load();
    fixture.take_calls();

    fixture.load();
    fixture.controller.scan_again();
    fixture.controller.handle_detection(&hello());

    assert!(fixture.calls().is_empty());
    assert_eq!(fixture.controller.phase(), ScannerPhase::Failed);
}

#[test]
fn start_and_stop_are_idempotent() {
    let fixture = Setup::default().build();
    fixture.load();
    fixture.take_calls();

    fixture.controller.start_scanning();
    fixture.controller.start_scanning();
    fixture.controller.appear();
    assert_eq!(fixture.calls(), vec![Call::Start]);

    fixture.take_calls();
    fixture.controller.stop_scanning();
    fixture.controller.stop_scanning();
    fixture.controller.disappear();
    assert_eq!(fixture.calls(), vec![Call::Stop]);
}

#[test]
fn start_without_session_does_nothing() {
    let fixture = Setup::default().build();

    fixture.controller.start_scanning();
    fixture.controller.stop_scanning();

    assert!(fixture.calls().is_empty());
    assert_eq!(fixture.controller.phase(), ScannerPhase::Idle);
}

#[test]
fn stringless_first_object_leaves_label_unchanged() {
    let fixture = Setup::default().build();
    fixture.load();
    fixture.controller.appear();
    fixture.take_calls();

    fixture.controller.handle_detection(&[
        MetadataObject::Code {
            symbology: Symbology::Qr,
            string_value: None,
        },
        MetadataObject::qr_code(b"HELLO"),
    ]);

    assert_eq!(fixture.calls(), vec![Call::Stop]);
    assert_eq!(fixture.controller.detected_code(), None);
    assert_eq!(fixture.controller.phase(), ScannerPhase::Ready);
}

#[test]
fn non_code_and_invalid_payloads_are_discarded() {
    let fixture = Setup::default().build();
    fixture.load();

    let face = MetadataObject::Other {
        kind: "face".to_owned(),
    };
    assert_matches!(&face, MetadataObject::Other { kind });
    assert_eq!(kind, "face");

    for batch in [vec![face], vec![MetadataObject::qr_code(&[0xff, 0xfe, 0x00])]] {
        fixture.controller.appear();
        fixture.controller.handle_detection(&batch);
    }

    assert_eq!(fixture.count(&Call::Stop), 2);
    assert!(
        !fixture
            .calls()
            .iter()
            .any(|call| matches!(call, Call::Status(_)))
    );
}

#[test]
fn empty_batch_only_stops_session() {
    let fixture = Setup::default().build();
    fixture.load();
    fixture.controller.appear();
    fixture.take_calls();

    fixture.controller.handle_detection(&[]);

    assert_eq!(fixture.calls(), vec![Call::Stop]);
}

#[test]
fn undetermined_and_granted_notifies_coordinator() {
    let mut fixture = Setup {
        status: PermissionStatus::NotDetermined,
        grant: true,
        ..Default::default()
    }
    .build();

    fixture.load();

    assert_eq!(fixture.next_event(), Some(ScannerEvent::PermissionGranted));
    assert_eq!(fixture.next_event(), None);
    assert!(fixture.controller.has_session());
    assert_eq!(fixture.calls()[0], Call::RequestAccess);
}

#[test]
fn undetermined_and_refused_requests_dismissal() {
    let mut fixture = Setup {
        status: PermissionStatus::NotDetermined,
        grant: false,
        ..Default::default()
    }
    .build();

    fixture.load();

    assert_eq!(fixture.next_event(), Some(ScannerEvent::DismissRequested));
    assert!(!fixture.controller.has_session());
    assert_eq!(fixture.calls(), vec![Call::RequestAccess]);
    assert_eq!(fixture.controller.phase(), ScannerPhase::Idle);
}

#[test]
fn appear_before_load_starts_once_built() {
    let fixture = Setup::default().build();

    fixture.controller.appear();
    assert!(fixture.calls().is_empty());

    fixture.load();

    assert_eq!(fixture.calls().last(), Some(&Call::Start));
    assert_eq!(fixture.controller.phase(), ScannerPhase::Scanning);
}

#[test]
fn load_runs_once() {
    let fixture = Setup::default().build();

    fixture.load();
    fixture.load();

    assert_eq!(fixture.count(&Call::CreateSession), 1);
}

#[test]
fn dispatch_forwards_output_batches() {
    let fixture = Setup::default().build();
    fixture.load();
    fixture.controller.appear();

    let sender = fixture
        .output
        .take()
        .expect("the metadata output should be registered");
    sender.unbounded_send(hello()).unwrap();
    drop(sender);

    fixture
        .controller
        .dispatch_detections()
        .now_or_never()
        .expect("dispatch should end when the output is closed");

    assert_eq!(fixture.controller.detected_code().as_deref(), Some("HELLO"));
    assert_eq!(fixture.controller.phase(), ScannerPhase::Detected);
}

#[test]
fn batches_queued_before_stop_are_dropped() {
    let fixture = Setup::default().build();
    fixture.load();
    fixture.controller.appear();
    fixture.take_calls();

    let sender = fixture
        .output
        .take()
        .expect("the metadata output should be registered");
    sender.unbounded_send(hello()).unwrap();
    sender
        .unbounded_send(vec![MetadataObject::qr_code(b"WORLD")])
        .unwrap();
    drop(sender);

    fixture
        .controller
        .dispatch_detections()
        .now_or_never()
        .expect("dispatch should end when the output is closed");

    assert_eq!(
        fixture.calls(),
        vec![Call::Stop, Call::Status("HELLO".to_owned())]
    );
    assert_eq!(fixture.controller.detected_code().as_deref(), Some("HELLO"));
    assert_eq!(fixture.controller.phase(), ScannerPhase::Detected);
}

#[test]
fn detection_after_disappear_is_dropped() {
    let fixture = Setup::default().build();
    fixture.load();
    fixture.controller.appear();
    fixture.controller.disappear();
    fixture.take_calls();

    fixture.controller.handle_detection(&hello());

    assert!(fixture.calls().is_empty());
    assert_eq!(fixture.controller.detected_code(), None);
}

#[test]
fn refused_access_can_redirect_to_settings() {
    let mut fixture = Setup {
        status: PermissionStatus::NotDetermined,
        grant: false,
        ..Default::default()
    }
    .build();
    fixture.load();
    assert_eq!(fixture.next_event(), Some(ScannerEvent::DismissRequested));
    fixture.take_calls();

    fixture.controller.open_settings();

    assert_eq!(fixture.calls(), vec![Call::OpenSettings]);
    assert!(!fixture.controller.has_session());
}

#[test]
fn unload_drops_session() {
    let fixture = Setup::default().build();
    fixture.load();
    fixture.controller.appear();
    fixture.take_calls();

    fixture.controller.unload();

    assert_eq!(fixture.calls(), vec![Call::Stop]);
    assert!(!fixture.controller.has_session());
    assert_eq!(fixture.controller.phase(), ScannerPhase::Idle);
}

#[test]
fn phases_follow_scan_cycle() {
    let fixture = Setup::default().build();

    fixture.load();
    fixture.controller.appear();
    fixture.controller.handle_detection(&hello());
    fixture.controller.scan_again();

    let phases = fixture.phases.borrow();
    assert_eq!(phases.first(), Some(&ScannerPhase::Configuring));
    assert_eq!(phases.last(), Some(&ScannerPhase::Scanning));
    assert!(phases.contains(&ScannerPhase::Detected));
}
