//! End-to-end programs run through the full `.cpu` source front-end, one per
//! modelmachine variant family. mm-3's discriminant-formula fixture is
//! transcribed verbatim (modulo the unquoted `.input`/`.output` trailing
//! labels this crate's directive grammar doesn't parse) from
//! `original_source/tests/cpu/test_cpu.py::test_smoke`; mm-0, mm-1 and
//! mm-2 compute the same `x = ((a * -21) % 50 - b) ** 2` formula by hand,
//! grounded on each variant's own `ControlUnit` impl (mm-0's stack with no
//! memory-read opcode, mm-1's single accumulator plus `swap` to expose its
//! division remainder, mm-2's two-address overwrite-first-operand rule and
//! adjacent remainder write-back); mm-m/mm-r instead sum an array/pair of
//! inputs through the register file and indexed addressing, and mm-0's
//! fixture additionally follows `original_source/tests/cu/test_cu0.py` in
//! pushing its operands as immediates rather than supplying them via
//! `.input`.

use mm_assembler::Assembler;
use mm_vm::{parse_source, Status};

fn run_to_completion(cpu_src: &str) -> (Vec<i128>, bool) {
    let assembler = Assembler::new();
    let mut cpu = parse_source(cpu_src, true, Some(&assembler)).expect("program parses");
    cpu.run().expect("program runs without an I/O error")
}

// x = ((a * -21) % 50 - b) ** 2, via `.code` hex lifted straight from the
// original test suite's mm-3 fixture.
#[test]
fn mm3_discriminant_formula() {
    let src = "\
.cpu mm-3

.input 0x100
.input 0x101
.output 0x103

.code
03 0100 0005 0103 ; x := a * -21
04 0103 0006 0102 ; [0102] := x / 50, x := x % 50
02 0103 0101 0103 ; x := x - b
03 0103 0103 0103 ; x := x * x
99 0000 0000 0000 ; halt
; ---------------------
FFFFFFFFFFFFEB ; -21
00000000000032 ; 50

.enter -123 456
";
    let (outputs, clean) = run_to_completion(src);
    assert!(clean);
    assert_eq!(outputs, vec![178_929]);
}

// mm-1 is a single-accumulator machine: `load`/`store` move the accumulator
// `S` to and from RAM, and arithmetic folds RAM[addr] into it in place.
// `sdivmod` lands its quotient in `S` and its remainder in `S1`
// (`Mm1`'s `AluRegisters { s: S, res: S1, .. }`), and `write_back` only
// ever stores `S` — so the remainder needs `swap` (ALU op, not an
// addressing mode) to trade places with the accumulator before a `store`
// can reach it. Same discriminant formula as the mm-3 fixture above:
// x = ((a * -21) % 50 - b) ** 2.
#[test]
fn mm1_accumulator_arithmetic() {
    let src = "\
.cpu mm-1

.input 9
.input 10
.output 14

.asm
load a
smul negtwentyone
sdiv fifty
swap
sub b
store t
smul t
store x
halt
a: .word 0
b: .word 0
negtwentyone: .word -21
fifty: .word 50
t: .word 0
x: .word 0

.enter -10 0
";
    let (outputs, clean) = run_to_completion(src);
    assert!(clean);
    assert_eq!(outputs, vec![100]);
}

// mm-2's binary ops overwrite their first address, and `sdiv dest, src`
// writes its remainder to the word right after `dest` (`Mm2::write_back`'s
// dword branch), so `t`/`rem` just need to be declared back to back for
// the remainder to land exactly where `sub rem, b` expects it. Same
// discriminant formula: x = ((a * -21) % 50 - b) ** 2.
#[test]
fn mm2_two_address_arithmetic() {
    let src = "\
.cpu mm-2

.input 7
.input 8
.output 13

.asm
move t, a
smul t, negtwentyone
sdiv t, fifty
sub rem, b
smul rem, rem
move x, rem
halt
a: .word 0
b: .word 0
negtwentyone: .word -21
fifty: .word 50
t: .word 0
rem: .word 0
x: .word 0

.enter 10 -2
";
    let (outputs, clean) = run_to_completion(src);
    assert!(clean);
    assert_eq!(outputs, vec![64]);
}

// mm-0 has no memory-read-by-address opcode (confirmed against
// test_cu0.py, which never feeds it via .input/.enter), so its operands are
// hardcoded as push immediates: a = -10, b = -2, same formula as above.
//
// push -10        [0xffff] = -10
// push -21        [0xfffe] = -21
// smul 1          [0xfffe] = a * -21 = 210
// push 50         [0xfffd] = 50
// sdiv 1          [0xfffd] = 4 (quotient), [0xfffc] = 10 (remainder)
// push -2         [0xfffb] = -2
// sub 1           [0xfffb] = 10 - (-2) = 12
// smul 0          [0xfffb] = 12 * 12 = 144
// halt
#[test]
fn mm0_discriminant_formula() {
    let src = "\
.cpu mm-0

.output 0xfffb

.asm
push -10
push -21
smul 1
push 50
sdiv 1
push -2
sub 1
smul 0
halt
";
    let (outputs, clean) = run_to_completion(src);
    assert!(clean);
    assert_eq!(outputs, vec![144]);
}

// Sums a four-element array via indexed addressing (`arr0[rN]`) and an
// accumulate-in-place `radd`, exercising mm-m's register file and its `addr`
// effective-address computation path (through plain `load`/`store`, not
// `addr` itself, which this program has no use for).
#[test]
fn mmm_array_sum() {
    let src = "\
.cpu mm-m

.output 0x1b

.asm
load r1, arr0[r0]
load r3, one[r0]
load r2, arr0[r3]
radd r1, r2
load r3, two[r0]
load r2, arr0[r3]
radd r1, r2
load r3, three[r0]
load r2, arr0[r3]
radd r1, r2
store r1, result[r0]
halt
arr0: .word 4
arr1: .word 1
arr2: .word 3
arr3: .word 5
one: .word 1
two: .word 2
three: .word 3
result: .word 0
";
    let (outputs, clean) = run_to_completion(src);
    assert!(clean);
    assert_eq!(outputs, vec![13]);
}

// load/radd/store over two .input cells; the .word cells' addresses (8, 9,
// 10) are pinned by hand from the preceding instructions' word counts, the
// same technique as mm-m's array-sum test above.
#[test]
fn mmr_sum_of_two_inputs() {
    let src = "\
.cpu mm-r

.input 8
.input 9
.output 10

.asm
load r1, a[r0]
load r2, b[r0]
radd r1, r2
store r1, x[r0]
halt
a: .word 0
b: .word 0
x: .word 0

.enter -123 456
";
    let (outputs, clean) = run_to_completion(src);
    assert!(clean);
    assert_eq!(outputs, vec![333]);
}

#[test]
fn one_step_halt_reaches_halted_status_for_every_variant() {
    for cpu_name in ["mm-0", "mm-1", "mm-2", "mm-3", "mm-v", "mm-s", "mm-r", "mm-m"] {
        let src = format!(".cpu {cpu_name}\n.asm\nhalt\n");
        let assembler = Assembler::new();
        let mut cpu = parse_source(&src, true, Some(&assembler)).unwrap_or_else(|e| {
            panic!("{cpu_name} program failed to parse: {e}");
        });
        cpu.control_unit_mut().step();
        assert_eq!(cpu.status(), Status::Halted, "{cpu_name} did not halt after one step");
        assert!(!cpu.control_unit().failed(), "{cpu_name} halted with a failure flag set");
    }
}
