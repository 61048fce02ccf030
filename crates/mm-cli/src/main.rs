//! Command-line front end: `run`/`debug`/`asm` subcommands over `mm-vm`'s
//! directive-source loader and `mm-assembler`'s two-pass assembler, per
//! spec.md §6.4. Grounded on `original_source/modelmachine/cli.py`'s
//! subcommand set and `succinctlabs-sp1/assembler/src/bin/assembler.rs`'s
//! stdin/stdout ("-") file convention, since neither fuel-vm nor fuel-asm
//! ships a user-facing binary of its own.

mod debug_repl;

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mm_assembler::Assembler;
use mm_vm::{dump, parse_source, Status};

#[derive(Parser)]
#[command(name = "mm", version, about = "A family of pedagogical von Neumann machine emulators.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a `.cpu` program, run it to completion, and print its declared outputs.
    Run {
        file: String,
        /// Halt instead of reading dirty (never-written) memory.
        #[arg(short = 'm', long = "protect-memory")]
        protect_memory: bool,
    },
    /// Load a `.cpu` program and drop into an interactive stepper.
    Debug {
        file: String,
        #[arg(short = 'm', long = "protect-memory")]
        protect_memory: bool,
    },
    /// Assemble and link a `.cpu` program, writing its canonical memory dump.
    Asm {
        /// Source file, or `-` for stdin.
        input: String,
        /// Destination file, or `-` for stdout.
        output: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match dispatch(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Run { file, protect_memory } => cmd_run(&file, protect_memory),
        Command::Debug { file, protect_memory } => cmd_debug(&file, protect_memory),
        Command::Asm { input, output } => cmd_asm(&input, &output),
    }
}

fn read_source(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn cmd_run(file: &str, protect_memory: bool) -> anyhow::Result<ExitCode> {
    let source = read_source(file)?;
    let assembler = Assembler::new();
    let mut cpu = parse_source(&source, protect_memory, Some(&assembler))?;
    let (outputs, clean) = cpu.run()?;
    for value in outputs {
        println!("{value}");
    }
    Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn cmd_debug(file: &str, protect_memory: bool) -> anyhow::Result<ExitCode> {
    let source = read_source(file)?;
    let assembler = Assembler::new();
    let mut cpu = parse_source(&source, protect_memory, Some(&assembler))?;
    let enter = cpu.program.enter.clone();
    cpu.input_from_str(&enter)?;

    debug_repl::run(&mut cpu)?;

    if cpu.status() == Status::Halted {
        for value in cpu.outputs()? {
            println!("{value}");
        }
    }
    Ok(if cpu.control_unit().failed() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn cmd_asm(input: &str, output: &str) -> anyhow::Result<ExitCode> {
    let source = read_source(input)?;
    let assembler = Assembler::new();
    let cpu = parse_source(&source, true, Some(&assembler))?;
    let dumped = dump(&cpu);
    if output == "-" {
        io::stdout().write_all(dumped.as_bytes())?;
    } else {
        fs::write(output, dumped)?;
    }
    Ok(ExitCode::SUCCESS)
}
