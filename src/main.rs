use clap::Parser;
use creds::error::CredsError;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match creds::cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<CredsError>() {
            Some(err) => {
                eprintln!("{}", err);
                ExitCode::from(err.exit_code())
            }
            None => {
                eprintln!("{:#}", e);
                ExitCode::from(1)
            }
        },
    }
}
