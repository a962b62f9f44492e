use asyncpi::{
    codegen::{generate_with, GenOptions},
    par::{
        bind::bind,
        error::Error,
        name::Name,
        parser::{parse, set_miette_hook, SyntaxError},
        process::Process,
        reduce::reduce,
        sorts::{identify_sorts, reset_sorts},
        types::{check, process_types},
    },
};
use clap::{arg, command, value_parser, ArgMatches, Command};
use colored::Colorize;
use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};
use tracing::Level;

const STACK_SIZE: usize = 32 * 1024 * 1024;

fn main() {
    let file = || arg!(<file> "The process to load").value_parser(value_parser!(PathBuf));
    let matches = command!()
        .arg(arg!(--"no-colour" "Print without ANSI colours").global(true))
        .arg(arg!(-v --verbose "Log binding warnings and reduction steps").global(true))
        .subcommand(
            Command::new("parse")
                .about("Parse a process and print it back")
                .arg(file()),
        )
        .subcommand(
            Command::new("reduce")
                .about("Reduce a process step by step")
                .arg(file())
                .arg(
                    arg!(--steps <N> "Maximum number of steps")
                        .value_parser(value_parser!(usize))
                        .default_value("100"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Show every subprocess with its free names and variables")
                .arg(file()),
        )
        .subcommand(
            Command::new("types")
                .about("Infer the channel types of a process")
                .arg(file()),
        )
        .subcommand(
            Command::new("codegen")
                .about("Generate Go code from a process")
                .arg(file())
                .arg(arg!(--main "Wrap the code in a main function"))
                .arg(arg!(--debug "Print the process and start/end markers")),
        )
        .subcommand(Command::new("repl").about("Start an interactive session (default)"))
        .get_matches();

    if matches.get_flag("no-colour") {
        colored::control::set_override(false);
    }
    tracing_subscriber::fmt()
        .with_max_level(if matches.get_flag("verbose") {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
    set_miette_hook();

    match matches.subcommand() {
        Some(("parse", args)) => run_file(args, |process, _| {
            println!("{}", process);
            Ok(())
        }),
        Some(("reduce", args)) => {
            let max_steps = args.get_one::<usize>("steps").copied().unwrap_or(100);
            run_file(args, |process, _| reduce_steps(process, max_steps))
        }
        Some(("show", args)) => run_file(args, |process, _| show(process)),
        Some(("types", args)) => run_file(args, |process, _| {
            check(process)?;
            println!("{}", process_types(process));
            Ok(())
        }),
        Some(("codegen", args)) => {
            let options = GenOptions {
                main: args.get_flag("main"),
                debug: args.get_flag("debug"),
            };
            run_file(args, |process, _| {
                let mut code = String::new();
                generate_with(process, options, &mut code)?;
                println!("{}", code);
                Ok(())
            })
        }
        Some(("repl", _)) | None => Repl::default().run(),
        _ => unreachable!(),
    }
}

/// Everything that can stop a command.
enum Failure {
    Read(PathBuf, io::Error),
    Syntax(SyntaxError),
    Calculus(Error),
}

impl From<SyntaxError> for Failure {
    fn from(error: SyntaxError) -> Self {
        Self::Syntax(error)
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self::Calculus(error)
    }
}

impl Failure {
    fn report(&self, code: &str) {
        match self {
            Self::Read(path, error) => {
                eprintln!(
                    "{}: {} ({})",
                    "Could not read file".bright_red(),
                    path.display(),
                    error
                );
            }
            Self::Syntax(error) => {
                let report = miette::Report::new(error.clone()).with_source_code(code.to_string());
                eprintln!("{:?}", report);
            }
            Self::Calculus(Error::Type(error)) => {
                eprintln!("{:?}", error.to_report(Arc::from(code)));
            }
            Self::Calculus(error) => eprintln!("{}", error.to_string().bright_red()),
        }
    }
}

fn run_file(
    args: &ArgMatches,
    command: impl FnOnce(&mut Process, &str) -> Result<(), Failure>,
) {
    let Some(path) = args.get_one::<PathBuf>("file") else {
        return;
    };
    let code = match fs::read_to_string(path) {
        Ok(code) => code,
        Err(error) => return Failure::Read(path.clone(), error).report(""),
    };
    let result = stacker::grow(STACK_SIZE, || -> Result<(), Failure> {
        let mut process = parse(&code)?;
        command(&mut process, &code)
    });
    if let Err(failure) = result {
        failure.report(&code);
        std::process::exit(1);
    }
}

fn reduce_steps(process: &mut Process, max_steps: usize) -> Result<(), Failure> {
    bind(process);
    println!("{}", process.to_string().cyan());
    let mut taken = 0;
    while taken < max_steps && reduce(process, 1)? == 1 {
        taken += 1;
        println!("{} {}", "->".bright_black(), process.to_string().cyan());
    }
    if taken == max_steps {
        println!("{}", format!("Stopped after {} steps.", taken).yellow());
    }
    Ok(())
}

fn show(process: &mut Process) -> Result<(), Failure> {
    bind(process);
    identify_sorts(process)?;
    for proc in process.breadth_first() {
        let idents = |names: Vec<Name>| -> Vec<String> {
            names.iter().map(|name| name.ident()).collect()
        };
        println!(
            "{}\n\tfn = {:?}\n\tfv = {:?}",
            proc.to_string().cyan(),
            idents(proc.free_names()),
            idents(proc.free_vars())
        );
    }
    reset_sorts(process)?;
    Ok(())
}

const PROMPT: &str = "async-π> ";
const PROMPT_MORE: &str = ".......> ";

const COMMANDS: &[(&str, &str)] = &[
    ("parse", "Parse an asynchronous π-calculus process."),
    ("load", "Load a file to parse."),
    ("reduce", "Reduce the last parsed process."),
    ("show", "Display subprocesses of the last parsed process."),
    ("codegen", "Generate a fragment of Go code."),
    ("history", "Display history."),
    ("help", "Display this help message."),
    ("exit", "Exit."),
];

#[derive(Default)]
struct Repl {
    history: Vec<Process>,
}

impl Repl {
    fn run(mut self) {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            prompt(PROMPT);
            let Some(Ok(line)) = lines.next() else {
                break;
            };
            let line = line.trim();
            let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let rest = rest.trim();
            match command {
                "" => {}
                "exit" => break,
                "help" => self.help(),
                "history" => self.show_history(),
                "parse" => {
                    let mut source = rest.to_string();
                    if source.is_empty() {
                        // continue until an empty line
                        loop {
                            prompt(PROMPT_MORE);
                            match lines.next() {
                                Some(Ok(more)) if !more.trim().is_empty() => {
                                    source.push_str(&more);
                                    source.push('\n');
                                }
                                _ => break,
                            }
                        }
                    }
                    self.parse(&source);
                }
                "load" => match fs::read_to_string(rest) {
                    Ok(source) => {
                        respond(format!("Loading: {}", rest));
                        self.parse(&source);
                    }
                    Err(error) => {
                        Failure::Read(PathBuf::from(rest), error).report("");
                    }
                },
                "reduce" | "show" | "codegen" => self.on_last(command),
                _ => {
                    eprintln!("{} {}", "Unrecognised command:".bright_red(), command);
                    self.help();
                }
            }
        }
    }

    fn help(&self) {
        let mut usage = String::from("Commands available:\n");
        for (name, desc) in COMMANDS {
            usage.push_str(&format!("\t{}\t{}\n", name, desc));
        }
        respond(usage.trim_end());
    }

    fn show_history(&self) {
        if self.history.is_empty() {
            respond("History is empty.");
        }
        for (i, proc) in self.history.iter().enumerate() {
            respond(format!("{}:\t{}", i, proc));
        }
    }

    fn parse(&mut self, source: &str) {
        match stacker::grow(STACK_SIZE, || parse(source)) {
            Ok(process) => {
                respond(process.to_string());
                self.history.push(process);
            }
            Err(error) => {
                eprintln!(
                    "{}\n{}",
                    "Parse failed:".bright_red(),
                    error.caret_diagnostic(source)
                );
            }
        }
    }

    fn on_last(&mut self, command: &str) {
        let Some(process) = self.history.last_mut() else {
            eprintln!("{}", format!("No last process to {}.", command).bright_red());
            return;
        };
        let source = process.to_string();
        let result = stacker::grow(STACK_SIZE, || -> Result<(), Failure> {
            match command {
                "reduce" => {
                    respond(format!("Reducing: {}", process));
                    bind(process);
                    reduce(process, 1)?;
                    respond(process.to_string());
                    Ok(())
                }
                "show" => show(process),
                _ => {
                    let mut code = String::new();
                    generate_with(process, GenOptions::default(), &mut code)?;
                    respond(format!(
                        "/* start generated code */\n\n{}\n\n/* end generated code */",
                        code
                    ));
                    Ok(())
                }
            }
        });
        if let Err(failure) = result {
            failure.report(&source);
        }
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    _ = io::stdout().flush();
}

fn respond(text: impl AsRef<str>) {
    println!("{}", text.as_ref().cyan());
}
