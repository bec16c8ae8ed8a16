use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

fn env_filter(verbosity_level: Level) -> Result<EnvFilter> {
    Ok(EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("tokio=error".parse()?)
        .add_directive("sqlx=warn".parse()?))
}

/// Initialize logging.
/// `RUST_LOG` overrides the verbosity flag; `json` switches to JSON lines.
///
/// # Errors
///
/// Returns an error if a filter directive is invalid or a global subscriber is
/// already set.
pub fn init(verbosity_level: Option<Level>, json: bool) -> Result<()> {
    let filter = env_filter(verbosity_level.unwrap_or(Level::ERROR))?;

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(false);
        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_target(false)
            .pretty();
        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
