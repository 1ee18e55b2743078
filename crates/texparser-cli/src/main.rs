use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::Parser;
use texparser::config::Config;
use texparser::session::{Charset, Session};
use texparser_stdext::algorithms::spellcheck;
use texparser_stdlib::StdLibState;
use tracing::Level;

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();
    if let Err(err) = cli.run() {
        if !err.is_empty() {
            eprintln!("{err}");
        }
        std::process::exit(1);
    }
}

/// Expand TeX and LaTeX macros and print the resulting text.
#[derive(Debug, Parser)]
#[command(name = "texparser", version = "0.1", about, long_about, max_term_width(100))]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`.
    #[arg(short, long, global = true, default_value_t = Level::WARN)]
    log_level: Level,

    /// Path to a JSON file with the session configuration.
    ///
    /// Fields missing from the file keep their default values, so
    ///
    ///     { "end_of_line": "token" }
    ///
    /// is a complete configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Report recoverable errors and keep going, instead of stopping at the first one.
    ///
    /// This overrides `recover_from_errors` in the configuration file.
    #[arg(long, global = true)]
    recover: bool,

    /// Character set used to decode input files.
    #[arg(long, global = true, value_enum, default_value_t = CharsetArg::Utf8)]
    charset: CharsetArg,
}

impl Cli {
    fn run(self) -> Result<(), String> {
        match &self.command {
            Command::Run(run) => run.run(self.new_session()?),
            Command::Expand(expand) => expand.run(self.new_session()?),
            Command::Doc(doc) => doc.run(),
        }
    }

    fn new_session(&self) -> Result<Box<Session<StdLibState>>, String> {
        let mut config = match &self.config {
            None => Config::default(),
            Some(path) => read_config(path)?,
        };
        if self.recover {
            config.recover_from_errors = true;
        }
        tracing::debug!(?config, "session configuration");
        let mut session = StdLibState::new_session();
        session.config = config;
        session.state.input.set_charset(self.charset.into());
        Ok(session)
    }
}

#[derive(Clone, Debug, clap::Subcommand)]
enum Command {
    /// Process a file and print the expanded text.
    ///
    /// Messages and warnings are written to standard error.
    /// Relative paths in `\input` commands are resolved against the current directory.
    Run(Run),

    /// Process TeX given on the command line and print the expanded text.
    ///
    ///     $ texparser expand '\newcommand\hi[1]{Hello, #1!}\hi{World}'
    ///     Hello, World!
    Expand(Expand),

    /// Print the documentation of the built-in commands.
    Doc(Doc),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CharsetArg {
    Utf8,
    Latin1,
    Ascii,
}

impl From<CharsetArg> for Charset {
    fn from(value: CharsetArg) -> Self {
        match value {
            CharsetArg::Utf8 => Charset::Utf8,
            CharsetArg::Latin1 => Charset::Latin1,
            CharsetArg::Ascii => Charset::Ascii,
        }
    }
}

#[derive(Clone, Debug, Parser)]
struct Run {
    /// Path to the file to process.
    path: PathBuf,

    /// Write the expanded text to this path instead of standard out.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write messages and warnings to this path.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Run {
    fn run(&self, mut session: Box<Session<StdLibState>>) -> Result<(), String> {
        if let Some(log_file) = &self.log_file {
            let file = std::fs::File::create(log_file).map_err(|err| {
                format!("failed to create log file {}: {err}", log_file.display())
            })?;
            session.log_file = Rc::new(RefCell::new(file));
        }
        let path = self.path.to_string_lossy();
        let charset = session.state.input.charset();
        tracing::info!(path = %path, "processing file");
        if !session
            .push_file_source(&path, charset)
            .map_err(|err| err.to_string())?
        {
            return Err(format!("file {path} not found"));
        }
        execute(&mut session, self.output.as_deref())
    }
}

#[derive(Clone, Debug, Parser)]
struct Expand {
    /// The TeX source to process.
    source: String,
}

impl Expand {
    fn run(&self, mut session: Box<Session<StdLibState>>) -> Result<(), String> {
        session
            .push_source("<command line>", &self.source)
            .map_err(|err| err.to_string())?;
        execute(&mut session, None)
    }
}

#[derive(Clone, Debug, Parser)]
struct Doc {
    /// Name of a single command to document, with or without the leading backslash.
    ///
    /// If not provided, all built-in commands are listed.
    name: Option<String>,
}

impl Doc {
    fn run(&self) -> Result<(), String> {
        let built_ins = StdLibState::all_built_ins();
        match &self.name {
            None => {
                let mut names: Vec<&str> = built_ins.keys().copied().collect();
                names.sort();
                for name in names {
                    let doc = built_ins[name].doc().unwrap_or_default();
                    println!("{:<26}{doc}", format!("\\{name}"));
                }
                Ok(())
            }
            Some(name) => {
                let name = name.trim_start_matches('\\');
                match built_ins.get(name) {
                    Some(built_in) => {
                        println!(
                            "\\{name}\n\n{}",
                            built_in.doc().unwrap_or("(no documentation)")
                        );
                        Ok(())
                    }
                    None => {
                        let mut message = format!("unknown command \\{name}");
                        let close_words =
                            spellcheck::find_close_words(built_ins.keys().copied(), name, 2);
                        if let Some(close_word) = close_words.first() {
                            message.push_str(&format!("; did you mean \\{}?", close_word.word));
                        }
                        Err(message)
                    }
                }
            }
        }
    }
}

/// Runs the session and writes its output.
///
/// With error recovery, the output is written even if errors were reported,
///     but the command still fails.
fn execute(session: &mut Session<StdLibState>, output: Option<&Path>) -> Result<(), String> {
    session.run().map_err(|err| err.to_string())?;
    tracing::info!(
        expansions = session.num_expansions(),
        warnings = session.warnings().len(),
        "finished"
    );
    write_output(session.output(), output)?;
    match session.recovered_errors().len() {
        0 => Ok(()),
        1 => Err("1 error was reported".to_string()),
        n => Err(format!("{n} errors were reported")),
    }
}

fn write_output(text: &str, path: Option<&Path>) -> Result<(), String> {
    match path {
        None => {
            println!("{text}");
            Ok(())
        }
        Some(path) => std::fs::write(path, text)
            .map_err(|err| format!("failed to write output file {}: {err}", path.display())),
    }
}

fn read_config(path: &Path) -> Result<Config, String> {
    let data = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read config file {}: {err}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|err| format!("invalid config file {}: {err}", path.display()))
}
