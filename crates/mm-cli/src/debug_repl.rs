//! Interactive stepper for `mm debug`. Grounded on `original_source/
//! modelmachine/ide.py`'s `debug()` loop: `step`/`continue`/`print`/
//! `memory`/`quit`, addressed by their first letter.

use std::io::{self, Write};

use mm_vm::{Cpu, Debugger, Status};

const HELP: &str = "\
Enter
  (s)tep [count]    run count instructions (default 1)
  (c)ontinue        run to completion
  (p)rint           show register state
  (m)emory <a> <b>  show RAM[a, b)
  (q)uit            stop debugging";

/// Drives the REPL against `cpu` until the user quits or the machine halts.
pub fn run(cpu: &mut Cpu) -> io::Result<()> {
    println!("Welcome to the interactive debugger. Type a command, or `q` to quit.");
    println!("{HELP}");
    let mut step_no = 0usize;

    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            println!("quit");
            return Ok(());
        }
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else { continue };
        let rest: Vec<&str> = words.collect();

        match command.chars().next().unwrap_or(' ') {
            's' => step_no = do_step(cpu, step_no, &rest),
            'c' => do_continue(cpu),
            'p' => print_registers(cpu),
            'm' => print_memory(cpu, &rest),
            'q' => return Ok(()),
            _ => println!("{HELP}"),
        }

        if cpu.status() == Status::Halted {
            println!("machine has halted");
            return Ok(());
        }
    }
}

fn do_step(cpu: &mut Cpu, mut step_no: usize, args: &[&str]) -> usize {
    if cpu.status() == Status::Halted {
        println!("cannot execute command: machine has halted");
        return step_no;
    }
    let count = match args {
        [] => Some(1),
        [n] => parse_number(n),
        _ => None,
    };
    let Some(count) = count else {
        println!("{HELP}");
        return step_no;
    };
    for _ in 0..count {
        step_no += 1;
        cpu.control_unit_mut().step();
        println!("step {step_no}:");
        print_registers(cpu);
        if cpu.status() == Status::Halted {
            break;
        }
    }
    step_no
}

fn do_continue(cpu: &mut Cpu) {
    if cpu.status() == Status::Halted {
        println!("cannot execute command: machine has halted");
        return;
    }
    cpu.control_unit_mut().run();
}

fn print_registers(cpu: &Cpu) {
    println!("Register states:");
    for line in Debugger::format_registers(cpu).lines() {
        println!("  {line}");
    }
}

fn print_memory(cpu: &Cpu, args: &[&str]) {
    let [begin, end] = args else {
        println!("{HELP}");
        return;
    };
    let (Some(begin), Some(end)) = (parse_number(begin), parse_number(end)) else {
        println!("{HELP}");
        return;
    };
    println!("{}", Debugger::format_memory(cpu, begin as u64, end as u64));
}

fn parse_number(text: &str) -> Option<usize> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}
