use std::io::{self, IsTerminal};
use techshell::config::Options;
use techshell::{EditorReader, Interpreter, LineReader, PlainReader};

fn run(options: Options) -> anyhow::Result<()> {
    let mut shell = Interpreter::default();

    if let Some(line) = &options.command {
        return shell.run_line(line);
    }

    let mut reader: Box<dyn LineReader> = if options.use_editor(io::stdin().is_terminal()) {
        Box::new(EditorReader::new()?)
    } else {
        Box::new(PlainReader::new(io::stdin().lock(), io::stdout()))
    };
    shell.repl(reader.as_mut())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options: Options = argh::from_env();
    if let Err(e) = run(options) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
