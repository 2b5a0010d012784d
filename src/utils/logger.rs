use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Overrides `RUST_LOG` for this tool only.
pub const LOG_ENV_VAR: &str = "PROSPECTX_LOG";

// Library spans log as `prospectx_reports`, the binary as `prospectx`.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "prospectx_reports=debug,prospectx=debug,info"
    } else {
        "prospectx_reports=info,prospectx=info,warn"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Human-readable logs. Stdout is reserved for report output, so logs go to stderr.
pub fn init_cli_logger(verbose: bool) {
    let installed = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("a global subscriber is already installed");
    }
}

/// One JSON object per event, with targets kept so polling and HTTP events can be told apart.
pub fn init_json_logger() {
    let installed = tracing_subscriber::registry()
        .with(env_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(false),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("a global subscriber is already installed");
    }
}
