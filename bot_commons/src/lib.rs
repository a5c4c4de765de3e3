//! Boilerplate shared by the bots in this workspace, so that each of them
//! doesn't have to set up logging and the runtime by hand.

pub mod useful_methods;

use std::future::Future;

/// Initialize logging and run `closure` to completion in a multi-threaded
/// tokio runtime.
///
/// Logging defaults to level `info` unless the environment variable
/// `RUST_LOG` says otherwise. Output goes through [pretty_env_logger][],
/// without timestamps when running as a systemd service, since the journal
/// already records those.
///
/// # Panics
///
/// Panics if the tokio runtime fails to build.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
pub fn start_everything(closure: impl Future<Output = ()>) {
    let log_level = std::env::var_os("RUST_LOG")
        .and_then(|x| x.into_string().ok())
        .unwrap_or_else(|| String::from("info"));

    let running_as_systemd_service = std::env::var_os("JOURNAL_STREAM").is_some();

    let mut builder = match running_as_systemd_service {
        true => pretty_env_logger::formatted_builder(),
        false => pretty_env_logger::formatted_timed_builder(),
    };

    builder.parse_filters(&log_level);

    if builder.try_init().is_err() {
        log::error!("Tried to init logger twice!");
    }

    log::info!("Starting up with log filter \"{log_level}\"");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build the tokio runtime!")
        .block_on(closure);
}

/// Run a Telegram request expression, and run it again a few times if Telegram
/// asks to slow down or the network hiccups. Evaluates to the last result.
///
/// The calling crate needs `log` and `tokio` as dependencies.
#[macro_export]
macro_rules! teloxide_retry {
    ($request:expr) => {{
        let mut tries_left: u8 = 5;
        loop {
            match $request {
                Err(::teloxide::RequestError::RetryAfter(secs)) if tries_left > 0 => {
                    tries_left -= 1;
                    ::log::warn!("Hit a flood limit, retrying in {:?}", secs.duration());
                    ::tokio::time::sleep(secs.duration()).await;
                }
                Err(::teloxide::RequestError::Network(e)) if tries_left > 0 => {
                    tries_left -= 1;
                    ::log::warn!("Network error, retrying: {e}");
                    ::tokio::time::sleep(::std::time::Duration::from_secs(1)).await;
                }
                other => break other,
            }
        }
    }};
}
