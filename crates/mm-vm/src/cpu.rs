//! The `Cpu` aggregate: a named control unit plus its declared I/O slots
//! and default `.enter` string, wired together by
//! [`crate::source::parse_source`]. Grounded on `original_source/
//! modelmachine/cpu/cpu.py::Cpu` (load/print_result/run).

use std::collections::HashMap;

use crate::control_unit::{ControlUnit, Status};
use crate::io::{IoError, IoRequest, IoUnit};

/// The static data a `Cpu` is built from: everything spec.md §3 calls the
/// `Program` tuple, minus the RAM image itself (which lives inside the
/// control unit once loaded).
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub cpu_name: String,
    pub input_requests: Vec<IoRequest>,
    pub output_requests: Vec<IoRequest>,
    pub enter: String,
    /// Maps a RAM word address to the source line it was assembled from,
    /// for the dumper's aligned-column comments (spec.md §6.3).
    pub source_comments: HashMap<u64, String>,
}

/// Owns the control unit (and through it, the RAM/registers/ALU) plus the
/// program metadata. No cyclic ownership: the control unit never reaches
/// back into `Program`.
pub struct Cpu {
    pub program: Program,
    control_unit: Box<dyn ControlUnit>,
}

impl Cpu {
    pub fn new(program: Program, control_unit: Box<dyn ControlUnit>) -> Self {
        Cpu { program, control_unit }
    }

    pub fn control_unit(&self) -> &dyn ControlUnit {
        self.control_unit.as_ref()
    }

    pub fn control_unit_mut(&mut self) -> &mut dyn ControlUnit {
        self.control_unit.as_mut()
    }

    /// Consumes whitespace-separated decimal tokens from `enter`, one per
    /// declared `.input` slot, in order.
    pub fn input_from_str(&mut self, enter: &str) -> Result<(), IoError> {
        let mut tokens = enter.split_whitespace().map(str::to_owned);
        let requests = self.program.input_requests.clone();
        for request in &requests {
            IoUnit::input(self.control_unit.as_mut(), request, &mut tokens)?;
        }
        Ok(())
    }

    /// Reads every declared `.output` slot in order, returning their
    /// signed values as `original_source`'s `print_result` prints them.
    pub fn outputs(&mut self) -> Result<Vec<i128>, IoError> {
        let requests = self.program.output_requests.clone();
        requests.iter().map(|request| IoUnit::output(self.control_unit.as_mut(), request)).collect()
    }

    /// Loads the default `.enter` string, runs to completion, and returns
    /// the formatted outputs plus whether the halt was clean.
    pub fn run(&mut self) -> Result<(Vec<i128>, bool), IoError> {
        let enter = self.program.enter.clone();
        self.input_from_str(&enter)?;
        self.control_unit.run();
        let outputs = self.outputs()?;
        Ok((outputs, !self.control_unit.failed()))
    }

    pub fn status(&self) -> Status {
        self.control_unit.status()
    }
}
