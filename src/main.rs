use std::process::ExitCode;

fn main() -> ExitCode {
    match lab::run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<clap::Error>() {
            Some(clap_error) => {
                let _ = clap_error.print();

                if clap_error.use_stderr() {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            }
            None => {
                eprintln!("{e:?}");
                ExitCode::from(lab::exit_status_for(&e))
            }
        },
    }
}
