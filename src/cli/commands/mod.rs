pub mod auth;
pub mod logging;

use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_SERVE: &str = "serve";
pub const CMD_HASH_PASSWORD: &str = "hash-password";
pub const CMD_CREATE_ADMIN: &str = "create-admin";

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_FORCE: &str = "force";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("hiregate")
        .about("Job application intake with an administrator panel")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(serve())
        .subcommand(hash_password())
        .subcommand(create_admin());

    logging::with_args(command)
}

fn serve() -> Command {
    let command = Command::new(CMD_SERVE)
        .about("Run the HTTP server")
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("HIREGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(dsn_arg());

    auth::with_args(command)
}

fn hash_password() -> Command {
    Command::new(CMD_HASH_PASSWORD)
        .about("Print an Argon2id hash for an administrator password")
        .arg(password_arg())
}

fn create_admin() -> Command {
    Command::new(CMD_CREATE_ADMIN)
        .about("Apply the schema and store the administrator credentials")
        .arg(dsn_arg())
        .arg(
            Arg::new(ARG_USERNAME)
                .short('u')
                .long(ARG_USERNAME)
                .help("Administrator username")
                .env("HIREGATE_ADMIN_USERNAME")
                .default_value("admin"),
        )
        .arg(password_arg())
        .arg(
            Arg::new(ARG_FORCE)
                .long(ARG_FORCE)
                .help("Replace the password of an existing administrator")
                .action(ArgAction::SetTrue),
        )
}

fn dsn_arg() -> Arg {
    Arg::new(ARG_DSN)
        .short('d')
        .long(ARG_DSN)
        .help("Database connection string")
        .env("HIREGATE_DSN")
        .hide_env_values(true)
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long(ARG_PASSWORD)
        .help("Administrator password")
        .env("HIREGATE_ADMIN_PASSWORD")
        .hide_env_values(true)
        .required(true)
}
