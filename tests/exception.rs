mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::*;

use gdbmon::common::Signal;
use gdbmon::platform::breakpoints::WatchKind;
use gdbmon::platform::semihost::SemihostRequest;
use gdbmon::platform::TrapReason;
use gdbmon::Monitor;

fn resume_callback(p: &mut MockPlatform, context: usize) -> bool {
    p.callback_hits += context;
    true
}

fn stop_callback(p: &mut MockPlatform, context: usize) -> bool {
    p.callback_hits += context;
    false
}

#[test]
fn ignored_before_init() {
    init_logger();
    let mut p = MockPlatform::new();
    let mut monitor: MockMonitor = Monitor::builder(MockConn::new(Vec::new()))
        .build(&p)
        .unwrap();

    monitor.debug_exception(&mut p).unwrap();
    assert!(!monitor.is_initialized());
    assert!(monitor.borrow_conn().output.is_empty());
    assert_eq!(p.entered, 0);
}

#[test]
fn failed_init_keeps_monitor_disabled() {
    init_logger();
    let mut p = MockPlatform::new();
    p.init_fails = true;
    let mut monitor: MockMonitor = Monitor::builder(MockConn::new(Vec::new()))
        .build(&p)
        .unwrap();

    assert!(monitor.init(&mut p).is_err());
    assert!(!monitor.is_initialized());
    assert!(!monitor.is_first_exception());

    monitor.debug_exception(&mut p).unwrap();
    assert!(p.first_exception_seen.is_empty());
}

#[test]
fn failed_reinit_starts_from_scratch() {
    let mut p = MockPlatform::new();
    let script = Script::new().raw(&[0x03]).ack().packet("c");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();
    assert!(monitor.control_c_received());
    assert!(monitor.arm_temp_breakpoint(&mut p, 0x0800_0400, resume_callback, 1));

    p.init_fails = true;
    assert!(monitor.init(&mut p).is_err());

    assert!(!monitor.is_initialized());
    assert!(!monitor.is_first_exception());
    assert!(!monitor.control_c_received());
    assert_eq!(monitor.signal(), Signal::SIGZERO);
    assert!(!monitor.temp_breakpoint_armed());
    assert!(p.breakpoints.is_empty());

    // disabled again, so this trap is ignored
    let entered = p.entered;
    monitor.debug_exception(&mut p).unwrap();
    assert_eq!(p.entered, entered);

    p.init_fails = false;
    monitor.init(&mut p).unwrap();
    assert!(monitor.is_initialized());
    assert!(monitor.is_first_exception());
}

#[test]
fn control_c_does_not_outlive_its_session() {
    let mut p = MockPlatform::new();
    let script = Script::new()
        .raw(&[0x03])
        .ack()
        .packet("c")
        .ack()
        .packet("c");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();
    assert!(monitor.control_c_received());

    monitor.debug_exception(&mut p).unwrap();
    assert!(!monitor.control_c_received());
}

#[test]
fn session_reports_stop_and_runs_hooks() {
    let mut p = MockPlatform::new();
    let script = Script::new().ack().command("g").packet("c");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();

    let out = output(&mut monitor);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], stop_reply(5));
    assert_eq!(monitor.signal(), Signal::SIGTRAP);
    assert_eq!((p.entered, p.left), (1, 1));
    assert!(monitor.borrow_conn().input.is_empty());
}

#[test]
fn first_exception_flag() {
    let mut p = MockPlatform::new();
    let script = Script::new().ack().packet("c").ack().packet("c");
    let mut monitor = monitor(&mut p, script.build());
    assert!(monitor.is_first_exception());

    monitor.debug_exception(&mut p).unwrap();
    assert!(!monitor.is_first_exception());
    monitor.debug_exception(&mut p).unwrap();

    assert_eq!(p.first_exception_seen, vec![true, false]);
}

static ENTERED: AtomicUsize = AtomicUsize::new(0);
static LEFT: AtomicUsize = AtomicUsize::new(0);

fn on_enter() {
    ENTERED.fetch_add(1, Ordering::SeqCst);
}

fn on_leave() {
    assert_eq!(ENTERED.load(Ordering::SeqCst), LEFT.load(Ordering::SeqCst) + 1);
    LEFT.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn builder_hooks_bracket_the_session() {
    init_logger();
    let mut p = MockPlatform::new();
    let script = Script::new().ack().packet("c");
    let mut monitor: MockMonitor = Monitor::builder(MockConn::new(script.build()))
        .with_entering_debugger_hook(on_enter)
        .with_leaving_debugger_hook(on_leave)
        .build(&p)
        .unwrap();
    monitor.init(&mut p).unwrap();

    monitor.debug_exception(&mut p).unwrap();
    assert_eq!(ENTERED.load(Ordering::SeqCst), 1);
    assert_eq!(LEFT.load(Ordering::SeqCst), 1);
}

#[test]
fn spurious_transport_interrupt_is_silent() {
    let mut p = MockPlatform::new();
    let mut monitor = monitor(&mut p, Vec::new());
    monitor.borrow_conn().interrupt_pending = true;

    monitor.debug_exception(&mut p).unwrap();

    let conn = monitor.borrow_conn();
    assert!(conn.interrupt_cleared);
    assert!(conn.output.is_empty());
    assert_eq!(p.entered, 0);
    assert!(monitor.is_first_exception());
}

#[test]
fn transport_interrupt_with_data_enters_session() {
    let mut p = MockPlatform::new();
    p.signal = Signal::SIGINT;
    let script = Script::new().raw(&[0x03]).ack().packet("c");
    let mut monitor = monitor(&mut p, script.build());
    monitor.borrow_conn().interrupt_pending = true;

    monitor.debug_exception(&mut p).unwrap();

    assert_eq!(output(&mut monitor), vec![stop_reply(2)]);
    assert_eq!(p.entered, 1);
}

#[test]
fn temp_breakpoint_callback_resumes_silently() {
    let mut p = MockPlatform::new();
    let mut monitor = monitor(&mut p, Vec::new());

    assert!(monitor.arm_temp_breakpoint(&mut p, 0x0800_0201, resume_callback, 7));
    assert!(monitor.temp_breakpoint_armed());
    assert_eq!(p.breakpoints, vec![0x0800_0200]);

    // only one at a time
    assert!(!monitor.arm_temp_breakpoint(&mut p, 0x0800_0300, resume_callback, 1));

    monitor.debug_exception(&mut p).unwrap();

    assert_eq!(p.callback_hits, 7);
    assert!(!monitor.temp_breakpoint_armed());
    assert!(p.breakpoints.is_empty());
    assert!(monitor.borrow_conn().output.is_empty());
    assert_eq!(p.entered, 0);
}

#[test]
fn temp_breakpoint_callback_can_stop() {
    let mut p = MockPlatform::new();
    let script = Script::new().ack().packet("c");
    let mut monitor = monitor(&mut p, script.build());

    assert!(monitor.arm_temp_breakpoint(&mut p, 0x0800_0200, stop_callback, 1));
    monitor.debug_exception(&mut p).unwrap();

    assert_eq!(p.callback_hits, 1);
    assert!(!monitor.temp_breakpoint_armed());
    assert_eq!(output(&mut monitor), vec![stop_reply(5)]);
}

#[test]
fn temp_breakpoint_elsewhere_is_left_armed() {
    let mut p = MockPlatform::new();
    let script = Script::new().ack().packet("c");
    let mut monitor = monitor(&mut p, script.build());

    assert!(monitor.arm_temp_breakpoint(&mut p, 0x0800_0400, resume_callback, 1));
    monitor.debug_exception(&mut p).unwrap();

    assert_eq!(p.callback_hits, 0);
    assert!(monitor.temp_breakpoint_armed());
    assert!(monitor.clear_temp_breakpoint(&mut p));
    assert!(!monitor.clear_temp_breakpoint(&mut p));
    assert!(p.breakpoints.is_empty());
}

#[test]
fn temp_breakpoint_needs_breakpoint_support() {
    let mut p = MockPlatform::new();
    p.breakpoint_support = false;
    let mut monitor = monitor(&mut p, Vec::new());

    assert!(!monitor.arm_temp_breakpoint(&mut p, 0x0800_0200, resume_callback, 1));
    assert!(!monitor.temp_breakpoint_armed());
}

#[test]
fn semihost_call_is_forwarded() {
    let mut p = MockPlatform::new();
    p.semihost_call = true;
    p.semihost_request = Some(SemihostRequest::Write {
        fd: 1,
        buf: 0x2000_0000,
        len: 5,
    });
    let script = Script::new().ack().packet("F5");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();

    assert_eq!(output(&mut monitor), vec!["Fwrite,1,20000000,5"]);
    assert_eq!(p.reg(PC), 0x0800_0202);
    assert_eq!(p.semihost_return, Some((5, 0)));
    assert_eq!(monitor.semihost_return(), (5, 0));
    assert!(!monitor.control_c_received());
}

#[test]
fn semihost_error_reply() {
    let mut p = MockPlatform::new();
    p.semihost_call = true;
    p.semihost_request = Some(SemihostRequest::Open {
        path: 0x2000_0040,
        path_len: 9,
        flags: 0x201,
        mode: 0o644,
    });
    let script = Script::new().ack().packet("F-1,2");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();

    assert_eq!(output(&mut monitor), vec!["Fopen,20000040/9,201,1a4"]);
    assert_eq!(p.semihost_return, Some((-1, 2)));
    assert!(!monitor.was_semihost_call_cancelled());
}

#[test]
fn semihost_interrupted_by_host() {
    let mut p = MockPlatform::new();
    p.semihost_call = true;
    p.semihost_request = Some(SemihostRequest::Read {
        fd: 0,
        buf: 0x2000_0000,
        len: 0x10,
    });
    let script = Script::new().ack().command("F-1,4,C").packet("c");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();

    assert_eq!(
        output(&mut monitor),
        vec!["Fread,0,20000000,10".to_string(), stop_reply(2)]
    );
    assert!(monitor.control_c_received());
    assert!(monitor.was_semihost_call_cancelled());
    assert_eq!(monitor.signal(), Signal::SIGINT);
    // the call never happened, so it must not be skipped over
    assert_eq!(p.reg(PC), 0x0800_0200);
    assert_eq!(p.semihost_return, None);
}

#[test]
fn semihost_completed_then_interrupted() {
    let mut p = MockPlatform::new();
    p.semihost_call = true;
    p.semihost_request = Some(SemihostRequest::Close { fd: 3 });
    let script = Script::new().ack().command("F0,0,C").packet("c");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();

    let out = output(&mut monitor);
    assert_eq!(out[0], "Fclose,3");
    assert!(out[1].starts_with("T02"));
    assert_eq!(p.reg(PC), 0x0800_0202);
    assert_eq!(p.semihost_return, Some((0, 0)));
}

#[test]
fn semihost_while_stepping_still_reports_the_step() {
    let mut p = MockPlatform::new();
    p.stepping = true;
    p.semihost_call = true;
    p.semihost_request = Some(SemihostRequest::Unlink {
        path: 0x2000_0080,
        path_len: 4,
    });
    let script = Script::new().ack().packet("F0").ack().packet("s");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();

    let out = output(&mut monitor);
    assert_eq!(out[0], "Funlink,20000080/4");
    assert!(out[1].starts_with("T05"));
    assert!(p.stepping);
}

#[test]
fn semihost_only_checked_on_sigtrap() {
    let mut p = MockPlatform::new();
    p.signal = Signal::SIGSEGV;
    p.semihost_call = true;
    p.semihost_request = Some(SemihostRequest::Close { fd: 3 });
    let script = Script::new().ack().packet("c");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();

    assert_eq!(output(&mut monitor), vec![stop_reply(0x0b)]);
}

#[test]
fn fault_cause_goes_to_console() {
    let mut p = MockPlatform::new();
    p.signal = Signal::SIGBUS;
    p.fault_message = Some("bus fault\n");
    let script = Script::new().ack().ack().packet("c");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();

    let out = output(&mut monitor);
    assert_eq!(out[0], "O627573206661756c740a");
    assert_eq!(out[1], stop_reply(0x0a));
}

#[test]
fn watchpoint_stop_reason() {
    let mut p = MockPlatform::new();
    p.trap = TrapReason::Watchpoint {
        kind: WatchKind::Read,
        addr: 0x2000_0010,
    };
    let script = Script::new().ack().packet("c");
    let mut monitor = monitor(&mut p, script.build());

    monitor.debug_exception(&mut p).unwrap();

    let out = output(&mut monitor);
    assert!(out[0].starts_with("T05rwatch:20000010;07:"));
}

#[test]
fn console_output_outside_a_session() {
    let mut p = MockPlatform::new();
    let mut monitor = monitor(&mut p, Script::new().ack().build());

    monitor.send_console_output("hi").unwrap();
    assert_eq!(output(&mut monitor), vec!["O6869"]);
}

#[test]
fn transport_failure_aborts_session() {
    let mut p = MockPlatform::new();
    let mut monitor = monitor(&mut p, Vec::new());

    assert!(monitor.debug_exception(&mut p).is_err());
    // hooks still run on the way out
    assert_eq!((p.entered, p.left), (1, 1));
    assert!(!monitor.is_first_exception());
}
