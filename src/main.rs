//! Entry point: pick the role from the environment and run it.

use execshell::config::PROGRAM_NAME;
use execshell::{
    Args, BlockLexer, Config, Editor, ExitCode, ForkedRunner, ProcessExecutor, Role, Runner,
    ShellError, Supervisor,
};
use std::ffi::OsString;

fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Args = argh::from_env();
    let config = match Config::resolve(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", PROGRAM_NAME, e);
            return std::process::ExitCode::FAILURE;
        }
    };
    let program = std::env::args_os()
        .next()
        .unwrap_or_else(|| OsString::from(PROGRAM_NAME));

    let code = start(Role::take_from_env(), &config, &program);
    std::process::ExitCode::from(code as u8)
}

fn start(role: Role, config: &Config, program: &OsString) -> ExitCode {
    match role {
        Role::Runner => run_runner(config, program),
        Role::Supervisor => {
            let mut supervisor = Supervisor::new(ForkedRunner::new(|| run_runner(config, program)));
            supervisor.run().unwrap_or_else(|e| report(&e))
        }
    }
}

fn run_runner(config: &Config, program: &OsString) -> ExitCode {
    let editor = match Editor::new(config) {
        Ok(editor) => editor,
        Err(e) => return report(&ShellError::Editor(e)),
    };
    let executor = ProcessExecutor::new(config.exports());
    let mut runner = Runner::new(editor, BlockLexer, executor, config, program.clone());
    runner.run().unwrap_or_else(|e| report(&e))
}

fn report(err: &ShellError) -> ExitCode {
    eprintln!("{}: {}", PROGRAM_NAME, err);
    err.exit_code()
}
