//! `parley channels` -- inspect channel configuration status.
//!
//! Reads the configuration and displays a table summarizing which
//! channels are enabled, whether credentials are present, and how they
//! will be polled.
//!
//! # Example
//!
//! ```text
//! parley channels status
//! ```

use comfy_table::{Table, presets::UTF8_FULL};

use parley_types::ParleyError;
use parley_types::config::{Config, SlackConfig};

/// Display a table of channel status from the given configuration.
pub fn channels_status(config: &Config) {
    println!("{}", status_table(config));
}

fn status_table(config: &Config) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["CHANNEL", "ENABLED", "CONFIG STATUS", "POLLING"]);

    let slack = &config.channels.slack;
    table.add_row([
        "slack".to_owned(),
        yes_no(slack.enabled).to_owned(),
        config_status(slack.enabled, has_slack_credentials(slack)).to_owned(),
        slack_polling(slack),
    ]);

    table
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn has_slack_credentials(slack: &SlackConfig) -> bool {
    !slack.bot_token.is_empty()
        || slack
            .bot_token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .is_some_and(|val| !val.is_empty())
}

fn config_status(enabled: bool, has_credentials: bool) -> &'static str {
    match (enabled, has_credentials) {
        (true, true) => "configured",
        (true, false) => "MISSING credentials",
        (false, true) => "credentials present",
        (false, false) => "not configured",
    }
}

fn slack_polling(slack: &SlackConfig) -> String {
    match slack.validate() {
        Ok(()) => format!(
            "every {}s, {} msgs/channel",
            slack.poll_interval_secs, slack.history_limit
        ),
        Err(ParleyError::ConfigInvalid { reason }) => format!("INVALID: {reason}"),
        Err(e) => format!("INVALID: {e}"),
    }
}
