// loxide - A bytecode-compiled scripting language with a stack-based VM
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::env;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::process;

use loxide_vm::{InterpretError, VM};

fn main() {
    let args: Vec<String> = env::args().collect();

    // Handle --version flag
    if args.len() == 2 && (args[1] == "--version" || args[1] == "-v") {
        println!("Loxide v0.1.0");
        return;
    }

    let mut vm = VM::new();

    match args.len() {
        1 => repl(&mut vm),
        2 => run_file(&mut vm, &args[1]),
        _ => {
            eprintln!("Usage: loxide [path]");
            process::exit(64);
        }
    }
}

/// Read-eval-print loop: one line per interpretation, until EOF.
fn repl(vm: &mut VM) {
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                // Errors have already been reported; keep prompting.
                let _ = vm.interpret(&line);
            }
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }
}

/// Interpret a whole file and exit with the matching code.
fn run_file(vm: &mut VM, path: &str) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::PermissionDenied => {
            eprintln!("Could not open file \"{}\".", path);
            process::exit(74);
        }
        Err(_) => {
            eprintln!("Could not read file \"{}\".", path);
            process::exit(74);
        }
    };

    match vm.interpret(&source) {
        Ok(()) => {}
        Err(InterpretError::Compile) => process::exit(65),
        Err(InterpretError::Runtime) => process::exit(70),
    }
}
