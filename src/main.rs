use std::sync::Arc;

use clap::{Arg, ArgMatches, Command};
use tracing::error;

use handover::config::{config_schema, load_config, ConfigV1};
use handover::flow::{LoggingNavigator, Navigator};
use handover::models::Flow;
use handover::startup;
use handover::state::AppState;
use handover::utils::logger::init_logging;

fn cli() -> Command {
    Command::new("handover")
        .about("Delegated-login client: admin impersonation and direct login")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to the YAML configuration")
                .default_value("./config.yaml")
                .env("HANDOVER_CONFIG")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("login")
                .about("Verify the token in a login page URL and establish the session")
                .arg(
                    Arg::new("flow")
                        .help("impersonation or direct-login")
                        .required(true)
                        .value_parser(|s: &str| s.parse::<Flow>()),
                )
                .arg(
                    Arg::new("url")
                        .help("Page URL carrying the token, e.g. /admin-login?token=...")
                        .required(true),
                ),
        )
        .subcommand(Command::new("exit").about("Leave impersonation mode"))
        .subcommand(Command::new("status").about("Print the current session"))
        .subcommand(Command::new("sign-out").about("Remove every stored session"))
        .subcommand(Command::new("schema").about("Print the configuration JSON schema"))
}

fn load(matches: &ArgMatches) -> Arc<ConfigV1> {
    let path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("./config.yaml");
    match load_config(path) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    if matches.subcommand_name() == Some("schema") {
        println!("{}", config_schema()?);
        return Ok(());
    }

    let config = load(&matches);
    init_logging(&config.logging)?;
    let navigator: Arc<dyn Navigator> = Arc::new(LoggingNavigator);

    match matches.subcommand() {
        Some(("login", sub)) => {
            let (Some(flow), Some(url)) =
                (sub.get_one::<Flow>("flow"), sub.get_one::<String>("url"))
            else {
                return Err("login needs a flow and a URL".into());
            };
            let status = startup::run(config, navigator, *flow, url).await?;
            if status.is_error() {
                error!("{}", status.message());
                std::process::exit(2);
            }
        }
        Some(("exit", _)) => startup::exit(config, navigator).await,
        Some(("status", _)) => {
            let state = AppState::new(config, navigator);
            match state.current_session() {
                Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
                None => println!("no session"),
            }
        }
        Some(("sign-out", _)) => AppState::new(config, navigator).sign_out(),
        _ => unreachable!("subcommand_required is set"),
    }

    Ok(())
}
