mod cli;

use community_core::{ApiError, ApiErrorKind};

fn main() {
    if let Err(e) = cli::run() {
        if let Some(api_err) = e.downcast_ref::<ApiError>() {
            eprintln!("{}", api_err.user_message());
            if api_err.kind == ApiErrorKind::SessionExpired {
                std::process::exit(2);
            }
            std::process::exit(1);
        }
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}
