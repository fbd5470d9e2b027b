use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("caseguard")
        .about("Credential verification and account hardening")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .help("Directory holding accounts.json and state.json")
                .default_value(".")
                .env("CASEGUARD_DATA_DIR")
                .global(true),
        )
        .arg(
            Arg::new("admin-user")
                .long("admin-user")
                .help("Break-glass admin username (exact match)")
                .env("CASEGUARD_ADMIN_USER")
                .global(true),
        )
        .arg(
            Arg::new("admin-password")
                .long("admin-password")
                .help("Break-glass admin password")
                .env("CASEGUARD_ADMIN_PASSWORD")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new("operator-user")
                .long("operator-user")
                .help("Legacy operator username (case-insensitive match)")
                .env("CASEGUARD_OPERATOR_USER")
                .global(true),
        )
        .arg(
            Arg::new("operator-password")
                .long("operator-password")
                .help("Legacy operator password")
                .env("CASEGUARD_OPERATOR_PASSWORD")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("CASEGUARD_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("provision")
                .about("Create an account with a freshly derived strong hash")
                .arg(
                    Arg::new("username")
                        .help("Unique, case-sensitive username")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Password for the new account")
                        .env("CASEGUARD_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new("full-name")
                        .long("full-name")
                        .help("Display name (defaults to the username)"),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Verify a username/password pair, migrating legacy hashes")
                .arg(
                    Arg::new("username")
                        .help("Username to verify")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Password to verify")
                        .env("CASEGUARD_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
}
