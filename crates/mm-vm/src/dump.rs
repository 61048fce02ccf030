//! Canonical memory-dump writer. Grounded on
//! `original_source/modelmachine/ide/dump.py`; round-tripping through
//! [`crate::source::parse_source`] must reproduce byte-identical RAM and
//! I/O requests (spec.md §6.3, §8).

use std::fmt::Write as _;

use crate::cpu::Cpu;

/// Renders `cpu` as a `.cpu` program: header, `.input`/`.output` lines, one
/// `.code` block per filled RAM interval (each word a zero-padded hex
/// digit run, one word per line, with the source comment for that address
/// if one was recorded), and a trailing `.enter` line.
pub fn dump(cpu: &Cpu) -> String {
    let mut out = String::new();
    let _ = writeln!(out, ".cpu {}\n", cpu.program.cpu_name);

    for req in &cpu.program.input_requests {
        match &req.message {
            Some(msg) => {
                let _ = writeln!(out, ".input 0x{:x} {msg}", req.address.unsigned());
            }
            None => {
                let _ = writeln!(out, ".input 0x{:x}", req.address.unsigned());
            }
        }
    }
    for req in &cpu.program.output_requests {
        match &req.message {
            Some(msg) => {
                let _ = writeln!(out, ".output 0x{:x} {msg}", req.address.unsigned());
            }
            None => {
                let _ = writeln!(out, ".output 0x{:x}", req.address.unsigned());
            }
        }
    }

    let ram = cpu.control_unit().ram();
    let word_hex_digits = (ram.word_bits() / 4) as usize;
    for &(start, stop) in ram.filled_intervals() {
        if start == 0 {
            let _ = writeln!(out, "\n.code");
        } else {
            let _ = writeln!(out, "\n.code 0x{start:x}");
        }
        let mut line = String::new();
        let mut line_start = start;
        for addr in start..stop {
            if line.is_empty() {
                line_start = addr;
            }
            let word = ram.peek(addr);
            let _ = write!(line, "{}", word.hex());
            if let Some(comment) = cpu.program.source_comments.get(&addr) {
                while line.len() < word_hex_digits {
                    line.push(' ');
                }
                let _ = writeln!(out, "{line} ; {line_start:04x} ; {comment}");
                line.clear();
            }
        }
        if !line.is_empty() {
            let _ = writeln!(out, "{line}");
        }
    }

    if !cpu.program.enter.trim().is_empty() {
        let _ = writeln!(out, "\n.enter {}", cpu.program.enter.trim());
    }
    out
}
