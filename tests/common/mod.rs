#![allow(dead_code)]

use std::collections::VecDeque;

use gdbmon::common::Signal;
use gdbmon::conn::{Connection, ConnectionExt};
use gdbmon::platform::breakpoints::{Breakpoints, BreakpointsOps, HwWatchpoint, HwWatchpointOps, WatchKind};
use gdbmon::platform::semihost::{Semihost, SemihostOps, SemihostRequest};
use gdbmon::platform::{InstructionKind, Platform, PlatformError, PlatformResult, TrapReason};
use gdbmon::Monitor;

pub fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

/// Returned once the scripted host input runs dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted;

/// A connection which replays a fixed script of host bytes, and records
/// everything the monitor sends.
pub struct MockConn {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
    pub interrupt_pending: bool,
    pub interrupt_cleared: bool,
}

impl MockConn {
    pub fn new(input: Vec<u8>) -> MockConn {
        MockConn {
            input: input.into(),
            output: Vec::new(),
            interrupt_pending: false,
            interrupt_cleared: false,
        }
    }
}

impl Connection for MockConn {
    type Error = Exhausted;

    fn write(&mut self, byte: u8) -> Result<(), Exhausted> {
        self.output.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Exhausted> {
        Ok(())
    }
}

impl ConnectionExt for MockConn {
    fn read(&mut self) -> Result<u8, Exhausted> {
        self.input.pop_front().ok_or(Exhausted)
    }

    fn peek(&mut self) -> Result<Option<u8>, Exhausted> {
        Ok(self.input.front().copied())
    }

    fn caused_interrupt(&mut self) -> bool {
        self.interrupt_pending
    }

    fn clear_interrupt(&mut self) {
        self.interrupt_pending = false;
        self.interrupt_cleared = true;
    }
}

pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |a, b| a.wrapping_add(*b))
}

pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![b'$'];
    out.extend_from_slice(payload);
    out.extend_from_slice(format!("#{:02x}", checksum(payload)).as_bytes());
    out
}

/// Builds the byte stream a host would send.
#[derive(Default)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new() -> Script {
        Script::default()
    }

    /// ACK the monitor's last packet.
    pub fn ack(mut self) -> Script {
        self.0.push(b'+');
        self
    }

    /// Send a well-formed packet.
    pub fn packet(mut self, payload: &str) -> Script {
        self.0.extend(frame(payload.as_bytes()));
        self
    }

    /// Send a packet, then ACK the monitor's reply to it.
    pub fn command(self, payload: &str) -> Script {
        self.packet(payload).ack()
    }

    pub fn raw(mut self, bytes: &[u8]) -> Script {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

/// Split the monitor's output into the payloads of the packets it sent, and
/// the stream of bare ACK/NACK bytes. Panics on a bad checksum.
pub fn parse_output(output: &[u8]) -> (Vec<String>, String) {
    let mut packets = Vec::new();
    let mut acks = String::new();

    let mut i = 0;
    while i < output.len() {
        match output[i] {
            b'$' => {
                let end = i + output[i..].iter().position(|&b| b == b'#').expect("unterminated packet");
                let payload = &output[i + 1..end];
                let cs = std::str::from_utf8(&output[end + 1..end + 3]).unwrap();
                assert_eq!(
                    u8::from_str_radix(cs, 16).unwrap(),
                    checksum(payload),
                    "bad checksum on outgoing packet"
                );
                packets.push(String::from_utf8_lossy(payload).into_owned());
                i = end + 3;
            }
            b => {
                acks.push(b as char);
                i += 1;
            }
        }
    }

    (packets, acks)
}

pub fn packets(output: &[u8]) -> Vec<String> {
    parse_output(output).0
}

pub const CONTEXT_LEN: usize = 17 * 4;
pub const RAM_BASE: u32 = 0x2000_0000;
pub const RAM_LEN: usize = 0x100;

pub const PC: usize = 15;
pub const TARGET_XML: &str =
    r#"<?xml version="1.0"?><target><architecture>arm</architecture></target>"#;
pub const MEMORY_MAP_XML: &str = r#"<memory-map><memory type="ram" start="0x20000000" length="0x100"/></memory-map>"#;

/// A Cortex-M flavoured fake core: r0-r12, sp, lr, pc, xpsr in the context,
/// and a small RAM window at `RAM_BASE`.
pub struct MockPlatform {
    pub context: Vec<u8>,
    pub ram: Vec<u8>,
    pub stepping: bool,
    pub signal: Signal,
    pub trap: TrapReason,
    pub init_fails: bool,
    pub hardcoded_breakpoint_at: Option<u32>,
    pub fault_message: Option<&'static str>,
    pub descriptors: bool,

    pub breakpoint_support: bool,
    pub max_breakpoints: usize,
    pub breakpoints: Vec<u32>,
    pub watchpoints: Vec<(u32, u32, WatchKind)>,

    pub semihost_call: bool,
    pub semihost_request: Option<SemihostRequest>,
    pub semihost_return: Option<(i32, i32)>,

    pub entered: usize,
    pub left: usize,
    pub first_exception_seen: Vec<bool>,
    pub callback_hits: usize,
}

impl MockPlatform {
    pub fn new() -> MockPlatform {
        let mut p = MockPlatform {
            context: vec![0; CONTEXT_LEN],
            ram: (0..RAM_LEN).map(|i| i as u8).collect(),
            stepping: false,
            signal: Signal::SIGTRAP,
            trap: TrapReason::Other,
            init_fails: false,
            hardcoded_breakpoint_at: None,
            fault_message: None,
            descriptors: true,

            breakpoint_support: true,
            max_breakpoints: 4,
            breakpoints: Vec::new(),
            watchpoints: Vec::new(),

            semihost_call: false,
            semihost_request: None,
            semihost_return: None,

            entered: 0,
            left: 0,
            first_exception_seen: Vec::new(),
            callback_hits: 0,
        };
        p.set_reg(7, 0x2000_00f0);
        p.set_reg(13, 0x2000_0100);
        p.set_reg(14, 0x0800_0123);
        p.set_reg(PC, 0x0800_0200);
        p
    }

    pub fn reg(&self, n: usize) -> u32 {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(&self.context[n * 4..n * 4 + 4]);
        u32::from_le_bytes(bytes)
    }

    pub fn set_reg(&mut self, n: usize, val: u32) {
        self.context[n * 4..n * 4 + 4].copy_from_slice(&val.to_le_bytes());
    }

    fn ram_range(&self, addr: u32, len: usize) -> PlatformResult<std::ops::Range<usize>> {
        let start = addr.checked_sub(RAM_BASE).ok_or(PlatformError::NonFatal)? as usize;
        let end = start.checked_add(len).ok_or(PlatformError::NonFatal)?;
        if end > self.ram.len() {
            return Err(PlatformError::NonFatal);
        }
        Ok(start..end)
    }
}

/// The stop reply for `MockPlatform::new()`'s registers.
pub fn stop_reply(signal: u8) -> String {
    format!(
        "T{:02x}07:f0000020;0d:00010020;0e:23010008;0f:00020008;",
        signal
    )
}

impl Platform for MockPlatform {
    fn init(&mut self) -> PlatformResult<()> {
        match self.init_fails {
            true => Err(PlatformError::NonFatal),
            false => Ok(()),
        }
    }

    fn context(&self) -> &[u8] {
        &self.context
    }

    fn context_mut(&mut self) -> &mut [u8] {
        &mut self.context
    }

    fn program_counter(&self) -> u32 {
        self.reg(PC)
    }

    fn set_program_counter(&mut self, pc: u32) {
        self.set_reg(PC, pc)
    }

    fn advance_program_counter(&mut self) {
        let pc = self.reg(PC);
        self.set_reg(PC, pc + 2)
    }

    fn current_instruction(&mut self) -> InstructionKind {
        match self.hardcoded_breakpoint_at {
            Some(addr) if addr == self.reg(PC) => InstructionKind::HardcodedBreakpoint,
            _ => InstructionKind::Other,
        }
    }

    fn write_stop_registers(&self, write_reg: &mut dyn FnMut(u8, u32)) {
        for &n in &[7, 13, 14, PC] {
            write_reg(n as u8, self.reg(n));
        }
    }

    fn read_memory(&mut self, addr: u32, data: &mut [u8]) -> PlatformResult<()> {
        let range = self.ram_range(addr, data.len())?;
        data.copy_from_slice(&self.ram[range]);
        Ok(())
    }

    fn write_memory(&mut self, addr: u32, data: &[u8]) -> PlatformResult<()> {
        let range = self.ram_range(addr, data.len())?;
        self.ram[range].copy_from_slice(data);
        Ok(())
    }

    fn enable_single_step(&mut self) {
        self.stepping = true;
    }

    fn disable_single_step(&mut self) {
        self.stepping = false;
    }

    fn is_single_stepping(&self) -> bool {
        self.stepping
    }

    fn cause_of_exception(&mut self, is_first_exception: bool) -> Signal {
        self.first_exception_seen.push(is_first_exception);
        self.signal
    }

    fn trap_reason(&self) -> TrapReason {
        self.trap
    }

    fn display_fault_cause(&mut self, console: &mut dyn std::fmt::Write) -> std::fmt::Result {
        match self.fault_message {
            Some(msg) => console.write_str(msg),
            None => Ok(()),
        }
    }

    fn entering_debugger(&mut self) {
        self.entered += 1;
    }

    fn leaving_debugger(&mut self) {
        self.left += 1;
    }

    fn memory_map_xml(&self) -> Option<&'static str> {
        Some(MEMORY_MAP_XML).filter(|_| self.descriptors)
    }

    fn target_xml(&self) -> Option<&'static str> {
        Some(TARGET_XML).filter(|_| self.descriptors)
    }

    fn support_breakpoints(&mut self) -> Option<BreakpointsOps<'_>> {
        match self.breakpoint_support {
            true => Some(self),
            false => None,
        }
    }

    fn support_semihosting(&mut self) -> Option<SemihostOps<'_>> {
        Some(self)
    }
}

impl Breakpoints for MockPlatform {
    fn set_hw_breakpoint(&mut self, addr: u32) -> PlatformResult<bool> {
        if self.breakpoints.len() >= self.max_breakpoints {
            return Ok(false);
        }
        self.breakpoints.push(addr);
        Ok(true)
    }

    fn clear_hw_breakpoint(&mut self, addr: u32) -> PlatformResult<bool> {
        match self.breakpoints.iter().position(|a| *a == addr) {
            Some(i) => {
                self.breakpoints.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn support_hw_watchpoint(&mut self) -> Option<HwWatchpointOps<'_>> {
        Some(self)
    }
}

impl HwWatchpoint for MockPlatform {
    fn set_hw_watchpoint(&mut self, addr: u32, len: u32, kind: WatchKind) -> PlatformResult<bool> {
        if self.breakpoints.len() + self.watchpoints.len() >= self.max_breakpoints {
            return Ok(false);
        }
        self.watchpoints.push((addr, len, kind));
        Ok(true)
    }

    fn clear_hw_watchpoint(
        &mut self,
        addr: u32,
        len: u32,
        kind: WatchKind,
    ) -> PlatformResult<bool> {
        match self.watchpoints.iter().position(|w| *w == (addr, len, kind)) {
            Some(i) => {
                self.watchpoints.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Semihost for MockPlatform {
    fn is_semihost_call(&mut self) -> bool {
        self.semihost_call
    }

    fn semihost_request(&mut self) -> Option<SemihostRequest> {
        self.semihost_request
    }

    fn set_semihost_return(&mut self, ret: i32, errno: i32) {
        self.semihost_return = Some((ret, errno));
    }
}

pub type MockMonitor = Monitor<'static, MockPlatform, MockConn>;

/// An initialized monitor fed with `input`.
pub fn monitor(platform: &mut MockPlatform, input: Vec<u8>) -> MockMonitor {
    init_logger();
    let mut monitor = Monitor::builder(MockConn::new(input))
        .build(platform)
        .unwrap();
    monitor.init(platform).unwrap();
    monitor
}

pub fn output(monitor: &mut MockMonitor) -> Vec<String> {
    packets(&monitor.borrow_conn().output)
}
