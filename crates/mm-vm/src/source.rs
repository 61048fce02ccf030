//! Directive-grammar front-end: turns a `.cpu`/`.input`/`.output`/`.enter`/
//! `.code`/`.asm` program into a runnable [`Cpu`]. Grounded on
//! `original_source/modelmachine/ide/source.py`, reimplemented as a
//! hand-rolled line scanner since this crate carries no parser-combinator
//! dependency; the denser per-CPU assembly dialect inside `.asm` blocks is
//! handed off to an injected [`AsmBackend`] so `mm-vm` never depends on
//! `mm-assembler` directly.

use std::collections::HashMap;

use mm_types::{Cell, Endianess};
use thiserror::Error;

use crate::control_unit::ControlUnit;
use crate::cpu::{Cpu, Program};
use crate::io::{IoError, IoRequest, IoUnit};
use crate::{make_control_unit, DEFAULT_ADDRESS_BITS};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("line {0}: {1}")]
    Syntax(usize, String),
    #[error("unknown cpu name {0:?}")]
    UnknownCpu(String),
    #[error("missing required .cpu directive on the first non-blank line")]
    MissingCpuDirective,
    #[error("missing required .code or .asm directive")]
    MissingCodeOrAsm,
    #[error(".asm directive given but no assembler backend was supplied")]
    AsmNotSupported,
    #[error("assembling .asm block at line {0}: {1}")]
    AsmError(usize, String),
    #[error(transparent)]
    Io(#[from] IoError),
}

/// One assembled `.asm` block, ready to be poured into RAM the same way a
/// `.code` block is: packed hex digits plus a source-line comment per
/// filled address, both relative to the block's declared start address.
#[derive(Debug, Clone, Default)]
pub struct AssembledBlock {
    pub hex: String,
    pub comments: HashMap<u64, String>,
}

/// Implemented by `mm-assembler`'s two-pass assembler. `cu` exposes the
/// already-constructed control unit so the backend can read its address and
/// word widths and which opcodes it accepts without this crate depending on
/// the assembler crate.
pub trait AsmBackend {
    fn assemble(&self, cu: &dyn ControlUnit, source: &str) -> Result<AssembledBlock, String>;
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(i) => &line[..i],
        None => line,
    }
}

fn parse_addr_literal(tok: &str) -> Option<u64> {
    let tok = tok.trim();
    if let Some(hex) = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        tok.parse().ok()
    }
}

/// Splits `.input`/`.output`'s trailing text into the comma-separated
/// address list and an optional quoted message.
fn split_addr_and_message(rest: &str) -> (String, Option<String>) {
    match rest.find('"') {
        Some(q) => {
            let (addrs, tail) = rest.split_at(q);
            let message = tail.trim().trim_matches('"').to_string();
            (addrs.trim().to_string(), Some(message))
        }
        None => (rest.trim().to_string(), None),
    }
}

/// Parses a full `.cpu ...` program. `asm_backend` is consulted for every
/// `.asm` block; pass `None` for programs known to use only `.code`.
pub fn parse_source(
    source: &str,
    protect_memory: bool,
    asm_backend: Option<&dyn AsmBackend>,
) -> Result<Cpu, SourceError> {
    let lines: Vec<&str> = source.lines().collect();
    let mut idx = 0usize;

    while idx < lines.len() && strip_comment(lines[idx]).trim().is_empty() {
        idx += 1;
    }
    let cpu_line = lines.get(idx).copied().unwrap_or("");
    let mut cpu_tokens = strip_comment(cpu_line).split_whitespace();
    let directive = cpu_tokens.next().unwrap_or("");
    if !directive.eq_ignore_ascii_case(".cpu") {
        return Err(SourceError::MissingCpuDirective);
    }
    let cpu_name = cpu_tokens
        .next()
        .ok_or(SourceError::MissingCpuDirective)?
        .to_ascii_lowercase();
    idx += 1;

    let mut cu = make_control_unit(&cpu_name, DEFAULT_ADDRESS_BITS, Endianess::Big, protect_memory)
        .ok_or_else(|| SourceError::UnknownCpu(cpu_name.clone()))?;

    let mut program = Program { cpu_name, ..Program::default() };
    let mut saw_code_or_asm = false;

    while idx < lines.len() {
        let trimmed = strip_comment(lines[idx]).trim();
        if trimmed.is_empty() {
            idx += 1;
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        let directive = tokens.next().unwrap_or("").to_ascii_lowercase();
        let rest = trimmed[directive.len()..].trim();

        match directive.as_str() {
            ".input" | ".output" => {
                let (addr_part, message) = split_addr_and_message(rest);
                let mut requests = Vec::new();
                for tok in addr_part.split(',') {
                    let tok = tok.trim();
                    if tok.is_empty() {
                        continue;
                    }
                    let addr = parse_addr_literal(tok).ok_or_else(|| {
                        SourceError::Syntax(
                            idx + 1,
                            format!(
                                "expected address, found {tok:?} (label-valued .input/.output \
                                 addresses require an .asm symbol table and are not yet supported)"
                            ),
                        )
                    })?;
                    requests.push(IoRequest {
                        address: Cell::new(addr as i128, cu.ram().address_bits()),
                        message: message.clone(),
                    });
                }
                if directive == ".input" {
                    program.input_requests.extend(requests);
                } else {
                    program.output_requests.extend(requests);
                }
                idx += 1;
            }
            ".enter" => {
                if !program.enter.is_empty() {
                    program.enter.push(' ');
                }
                program.enter.push_str(rest);
                idx += 1;
            }
            ".code" => {
                let address = if rest.is_empty() {
                    0
                } else {
                    parse_addr_literal(rest)
                        .ok_or_else(|| SourceError::Syntax(idx + 1, format!("bad .code address {rest:?}")))?
                };
                idx += 1;
                let mut hex = String::new();
                while idx < lines.len() {
                    let body = strip_comment(lines[idx]).trim();
                    if body.starts_with('.') {
                        break;
                    }
                    hex.push_str(body);
                    idx += 1;
                }
                let address_bits = cu.ram().address_bits();
                IoUnit::load_source(cu.ram_mut(), Cell::new(address as i128, address_bits), &hex)?;
                saw_code_or_asm = true;
            }
            ".asm" => {
                let address = if rest.is_empty() {
                    0
                } else {
                    parse_addr_literal(rest)
                        .ok_or_else(|| SourceError::Syntax(idx + 1, format!("bad .asm address {rest:?}")))?
                };
                idx += 1;
                let mut body = String::new();
                while idx < lines.len() {
                    if strip_comment(lines[idx]).trim().starts_with('.') {
                        break;
                    }
                    body.push_str(lines[idx]);
                    body.push('\n');
                    idx += 1;
                }
                let backend = asm_backend.ok_or(SourceError::AsmNotSupported)?;
                let assembled = backend
                    .assemble(cu.as_ref(), &body)
                    .map_err(|e| SourceError::AsmError(idx + 1, e))?;
                let address_bits = cu.ram().address_bits();
                IoUnit::load_source(cu.ram_mut(), Cell::new(address as i128, address_bits), &assembled.hex)?;
                for (addr, comment) in assembled.comments {
                    program.source_comments.insert(addr + address, comment);
                }
                saw_code_or_asm = true;
            }
            other => {
                return Err(SourceError::Syntax(idx + 1, format!("unknown directive {other:?}")));
            }
        }
    }

    if !saw_code_or_asm {
        return Err(SourceError::MissingCodeOrAsm);
    }

    Ok(Cpu::new(program, cu))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_code_program() {
        let src = "\
.cpu mm-3
.input 0x0
.output 0x1
.enter 5
.code
0005 0000 8100
";
        let cpu = parse_source(src, true, None).expect("valid program parses");
        assert_eq!(cpu.program.cpu_name, "mm-3");
        assert_eq!(cpu.program.input_requests.len(), 1);
        assert_eq!(cpu.program.output_requests.len(), 1);
        assert_eq!(cpu.program.enter, "5");
    }

    #[test]
    fn rejects_missing_cpu_directive() {
        let src = ".code\n0000\n";
        assert!(matches!(parse_source(src, true, None), Err(SourceError::MissingCpuDirective)));
    }

    #[test]
    fn rejects_missing_code_or_asm() {
        let src = ".cpu mm-3\n.enter 1\n";
        assert!(matches!(parse_source(src, true, None), Err(SourceError::MissingCodeOrAsm)));
    }

    #[test]
    fn rejects_unsupported_asm_without_backend() {
        let src = ".cpu mm-3\n.asm\nhalt\n";
        assert!(matches!(parse_source(src, true, None), Err(SourceError::AsmNotSupported)));
    }

    #[test]
    fn rejects_unknown_cpu_name() {
        let src = ".cpu mm-9\n.code\n0000\n";
        assert!(matches!(parse_source(src, true, None), Err(SourceError::UnknownCpu(_))));
    }
}
