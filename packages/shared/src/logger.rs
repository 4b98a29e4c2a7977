//! Logging setup shared by every Encore binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the library crates and the binary itself. `RUST_LOG`
/// overrides the default when it is set.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "encore-server", "encore-bridge")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use encore_shared::logger::setup_logger;
///
/// setup_logger("encore-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the default `EnvFilter` directive string.
///
/// Crate names use underscores in tracing targets, so dashes are replaced.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    format!(
        "encore_server={level},encore_bridge={level},encore_shared={level},{binary}={level}",
        level = default_log_level,
        binary = binary_target,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_all_crates_and_binary() {
        // テスト項目: デフォルトのフィルタにすべてのクレートとバイナリが含まれる
        // given (前提条件):
        let binary = "encore-server";

        // when (操作):
        let filter = default_filter(binary, "debug");

        // then (期待する結果):
        assert!(filter.contains("encore_server=debug"));
        assert!(filter.contains("encore_bridge=debug"));
        assert!(filter.contains("encore_shared=debug"));
        assert!(filter.ends_with("encore_server=debug"));
    }
}
