use std::{
    env, fs,
    io::{self, BufRead, Write},
    process,
};

use ron::ser::PrettyConfig;

use treelox::{interpreter::Interpreter, parse_source, Diagnostic};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.as_slice() {
        [] => run_prompt(),
        [script] => run_file(script, false),
        [flag, script] if flag == "--ast" => run_file(script, true),
        _ => {
            eprintln!("Usage: treelox [--ast] [script]");
            process::exit(64);
        }
    }
}

fn run_file(path: &str, dump_ast: bool) {
    let source = fs::read_to_string(path).unwrap_or_else(|error| {
        eprintln!("{path}: {error}");
        process::exit(66);
    });

    let (statements, diagnostics) = parse_source(&source);

    if dump_ast {
        match ron::ser::to_string_pretty(&statements, PrettyConfig::new()) {
            Ok(rendered) => println!("{rendered}"),
            Err(error) => eprintln!("{error}"),
        }
    }

    if !diagnostics.is_empty() {
        report(&diagnostics);
        process::exit(65);
    }

    if dump_ast {
        return;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut interpreter = Interpreter::new(&mut out);

    if let Err(error) = interpreter.interpret(&statements) {
        eprintln!("{error}\n[line {}]", error.line());
        process::exit(70);
    }
}

fn run_prompt() {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // One interpreter for the whole session, so bindings survive between
    // lines. Diagnostics are per line and never poison the next one.
    let mut interpreter = Interpreter::new(&mut out);

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if line.trim().is_empty() {
            break;
        }

        let (statements, diagnostics) = parse_source(&line);
        if !diagnostics.is_empty() {
            report(&diagnostics);
            continue;
        }

        if let Err(error) = interpreter.interpret(&statements) {
            eprintln!("{error}\n[line {}]", error.line());
        }
    }
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}
