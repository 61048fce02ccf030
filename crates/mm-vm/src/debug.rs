//! Minimal interactive stepper for `mm-cli`'s `debug` subcommand.
//! Grounded on `fuel-vm/src/state/debugger.rs`'s breakpoint/eval model,
//! narrowed to the single-CPU, single-address-space contract spec.md §1
//! and §2 leave for the "debugger UI" external collaborator.

use std::collections::HashSet;

use crate::cpu::Cpu;
use crate::Status;

/// Tracks breakpoints and single-step mode against one [`Cpu`]'s program
/// counter. Does not own the CPU: the caller drives `step`/`run` and reads
/// back RAM/register write logs for rendering.
#[derive(Debug, Default, Clone)]
pub struct Debugger {
    single_stepping: bool,
    breakpoints: HashSet<u64>,
}

impl Debugger {
    pub fn new() -> Self {
        Debugger::default()
    }

    pub fn set_single_stepping(&mut self, on: bool) {
        self.single_stepping = on;
    }

    pub fn set_breakpoint(&mut self, address: u64) {
        self.breakpoints.insert(address);
    }

    pub fn clear_breakpoint(&mut self, address: u64) {
        self.breakpoints.remove(&address);
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    fn should_pause(&self, pc: u64) -> bool {
        self.single_stepping || self.breakpoints.contains(&pc)
    }

    /// Runs `cpu` until it halts or a breakpoint/single-step pause is hit;
    /// returns `true` if it paused mid-program (still `Status::Running`).
    pub fn run_until_pause(&self, cpu: &mut Cpu) -> bool {
        loop {
            if cpu.status() == Status::Halted {
                return false;
            }
            cpu.control_unit_mut().step();
            let pc = cpu.control_unit().registers().get(mm_isa::RegisterName::Pc).unsigned() as u64;
            if self.should_pause(pc) || cpu.status() == Status::Halted {
                return cpu.status() == Status::Running;
            }
        }
    }

    /// Snapshot of every declared register, formatted for the debugger's
    /// `print registers` command.
    pub fn format_registers(cpu: &Cpu) -> String {
        let mut lines: Vec<String> = cpu
            .control_unit()
            .registers()
            .state()
            .into_iter()
            .map(|(name, cell)| format!("{name} = 0x{:x}", cell.unsigned()))
            .collect();
        lines.sort();
        lines.join("\n")
    }

    /// Renders `[from, to)` of RAM as hex words, one per line, for `print
    /// memory <range>`.
    pub fn format_memory(cpu: &Cpu, from: u64, to: u64) -> String {
        let ram = cpu.control_unit().ram();
        (from..to)
            .map(|addr| {
                if ram.is_filled(addr) {
                    format!("0x{addr:04x}: 0x{}", ram.peek(addr).hex())
                } else {
                    format!("0x{addr:04x}: <dirty>")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
