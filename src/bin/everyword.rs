//! Command-line driver: enumerate the words of each pattern argument.

use std::io::Write as _;
use std::process::ExitCode;

use everyword::debug::{print_ast, print_state};
use everyword::{parse, Alteration, Count, Error};

const USAGE: &str = "\
Usage: everyword [-v] [-h] [-u] [-p] [-d] [-c] [-o <offset>] [-n <max_number>] [-b <bufsize>] [<pattern>]*
   -v       print version
   -h, -u   print usage (this info)
   -p       print the parsed pattern
   -d       print iterator state before each word
   -c       do not print the words, only their total count at the end
   -o <N>   skip the first <N> words (default: skip nothing)
   -n <N>   stop after <N> words (default: unlimited)
   -b <S>   initial output buffer size in bytes, grown as needed";

#[derive(Default)]
struct Args {
    print_ast: bool,
    print_state: bool,
    count_only: bool,
    offset: u64,
    limit: Option<u64>,
    bufsize: usize,
    patterns: Vec<String>,
}

impl Args {
    fn parse() -> Result<Option<Args>, lexopt::Error> {
        use lexopt::prelude::*;

        let mut args = Args {
            bufsize: 1024,
            ..Args::default()
        };
        let mut parser = lexopt::Parser::from_env();
        while let Some(arg) = parser.next()? {
            match arg {
                Short('v') => {
                    println!("everyword version {}", env!("CARGO_PKG_VERSION"));
                }
                Short('h') | Short('u') => {
                    println!("{USAGE}");
                    return Ok(None);
                }
                Short('p') => args.print_ast = true,
                Short('d') => args.print_state = true,
                Short('c') => args.count_only = true,
                Short('o') => args.offset = parser.value()?.parse()?,
                Short('n') => args.limit = Some(parser.value()?.parse()?),
                Short('b') => args.bufsize = parser.value()?.parse()?,
                Value(pattern) => args.patterns.push(pattern.string()?),
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Some(args))
    }
}

fn main() -> ExitCode {
    let args = match Args::parse() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("everyword: {err}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    for pattern in &args.patterns {
        if let Err(err) = run(pattern, &args) {
            eprintln!("everyword: {err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn run(pattern: &str, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let ast = parse(pattern)?;
    if args.print_ast {
        print_ast(&ast);
    }

    let mut root = Alteration::new(&ast, ast.root());
    if args.offset > 0 {
        if ast.quantified_backref() {
            return Err(Error::QuantifiedBackref.into());
        }
        root.set_offset(&ast, args.offset);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut buffer = vec![0u8; args.bufsize.max(1)];
    let mut emitted: u64 = 0;

    if ast.full_length() != Count::Finite(0) {
        while args.limit.map_or(true, |limit| emitted < limit) {
            if args.print_state {
                print_state(&ast, &root);
            }
            let n = loop {
                let n = root.value(&ast, &mut buffer);
                if n < buffer.len() {
                    break n;
                }
                let grown = buffer.len() * 2;
                buffer.resize(grown, 0);
            };
            if !args.count_only {
                out.write_all(&buffer[..n])?;
                out.write_all(b"\n")?;
            }
            emitted += 1;
            // cheap advance first, then the structural one; a wrap
            // means the language is exhausted
            if !root.inc_in_place(&ast, &mut buffer) && !root.inc(&ast) {
                break;
            }
        }
    }
    if args.count_only {
        println!("{emitted}");
    }
    out.flush()?;
    Ok(())
}
