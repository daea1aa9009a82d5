use std::process::ExitCode;

fn main() -> ExitCode {
    match uk_covid_dash::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("covid: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
