//! `xen` — calculator for musical pitch arithmetic.
//!
//! Runs a source file or a single `-e` expression, or drops into a
//! read-eval-print loop.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use structopt::StructOpt;

use xen::lang::interpreter::EvalResult;
use xen::lang::{Answer, Host, Interpreter};

#[derive(Debug, StructOpt)]
#[structopt(name = "xen", about = "Calculator for musical pitch arithmetic.")]
struct Opt {
    /// Verbosity of the log output. Can be given multiple times.
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u32,

    /// Evaluate a single expression and exit.
    #[structopt(short = "e", long = "eval")]
    expression: Option<String>,

    /// Source file to run; without one, a REPL is started.
    #[structopt(parse(from_os_str))]
    source: Option<PathBuf>,
}

/// Host that prints to stdout. Playback stays unsupported; the binary
/// has no audio backend.
struct ConsoleHost;

impl Host for ConsoleHost {
    fn print(&mut self, values: &[Answer]) -> EvalResult<()> {
        for answer in values {
            println!("{} : {}", answer.value, answer.ty);
        }
        Ok(())
    }
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();

    let log_level = match opt.verbose {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(log_level).unwrap();

    let mut interp = Interpreter::with_host(Box::new(ConsoleHost));

    if let Some(expression) = &opt.expression {
        run(&mut interp, expression);
        return Ok(());
    }
    if let Some(path) = &opt.source {
        let source = std::fs::read_to_string(path)?;
        run(&mut interp, &source);
        return Ok(());
    }
    repl(&mut interp)
}

fn run(interp: &mut Interpreter, source: &str) {
    match interp.evaluate(source) {
        Ok(answers) => {
            for answer in &answers {
                println!("{} : {}", answer.value, answer.ty);
            }
        }
        Err(error) => eprintln!("error: {}", error),
    }
}

fn repl(interp: &mut Interpreter) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "> ")?;
    out.flush()?;
    for line in stdin.lock().lines() {
        run(interp, &line?);
        write!(out, "> ")?;
        out.flush()?;
    }
    Ok(())
}
