#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ProtocolGeneration;
use crate::domain::services::actions::help_text;
use crate::domain::services::AssistantClient;
use crate::domain::services::ConversationState;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

pub fn log_path() -> path::PathBuf {
    if let Ok(dir) = std::env::var("TIMOTHY_LOG_DIR") {
        return path::PathBuf::from(dir).join("debug.log");
    }

    return dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("timothy/debug.log");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn ask(text: &str) -> Result<()> {
    let client = AssistantClient::from_config()?;
    let reply = ask_with_client(
        &client,
        text,
        Config::external_llm()?,
        Config::context_window()?,
    )
    .await?;
    println!("{reply}");

    return Ok(());
}

/// Waits for the backend to report ready, then runs a single turn and returns
/// the reply text.
async fn ask_with_client(
    client: &AssistantClient,
    text: &str,
    use_external_llm: bool,
    context_window: usize,
) -> Result<String> {
    let mut state = ConversationState::new(use_external_llm);
    let version = client.probe_readiness().await?;
    tracing::debug!(version = %version, "Backend ready for ask");
    state.set_backend_version(version);

    if !client.run_turn(&mut state, text, context_window).await? {
        bail!("There is nothing to send, the message is empty.");
    }

    return match state.messages().last() {
        Some(reply) => Ok(reply.text.to_string()),
        None => bail!("Timothy did not reply."),
    };
}

async fn probe() -> Result<()> {
    let version = AssistantClient::from_config()?.probe_readiness().await?;
    println!("Timothy is ready. Version: {version}");
    return Ok(());
}

async fn update() -> Result<()> {
    println!("Updating may take a while...");
    let version = AssistantClient::from_config()?.refresh_data().await?;
    println!("Timothy data updated. Version: {version}");
    return Ok(());
}

fn subcommand_ask() -> Command {
    return Command::new("ask")
        .about("Send a single message to Timothy and print the reply.")
        .arg(
            Arg::new("text")
                .short('t')
                .long("text")
                .help("Message to send.")
                .num_args(1)
                .required(true),
        );
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Timothy")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Timothy with environment variable RUST_LOG=timothy")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn arg_backend_url() -> Arg {
    return Arg::new(ConfigKey::BackendURL.to_string())
        .short('u')
        .long(ConfigKey::BackendURL.to_string())
        .env("TIMOTHY_BACKEND_URL")
        .num_args(1)
        .help(format!(
            "Base URL of the Timothy backend. [default: {}]",
            Config::default(ConfigKey::BackendURL)
        ))
        .global(true);
}

fn arg_protocol() -> Arg {
    return Arg::new(ConfigKey::Protocol.to_string())
        .short('p')
        .long(ConfigKey::Protocol.to_string())
        .env("TIMOTHY_PROTOCOL")
        .num_args(1)
        .help(format!(
            "Wire protocol generation spoken to the backend. [default: {}]",
            Config::default(ConfigKey::Protocol)
        ))
        .value_parser(PossibleValuesParser::new(ProtocolGeneration::VARIANTS))
        .global(true);
}

fn arg_context_window() -> Arg {
    return Arg::new(ConfigKey::ContextWindow.to_string())
        .long(ConfigKey::ContextWindow.to_string())
        .env("TIMOTHY_CONTEXT_WINDOW")
        .num_args(1)
        .help("Number of prior messages sent alongside each new message. Defaults to the protocol generation's window (v1: 2, v2: 4) when unset.")
        .global(true);
}

fn arg_external_llm() -> Arg {
    return Arg::new(ConfigKey::ExternalLlm.to_string())
        .short('x')
        .long(ConfigKey::ExternalLlm.to_string())
        .env("TIMOTHY_EXTERNAL_LLM")
        .num_args(1)
        .help(format!(
            "Ask the backend to answer with its external LLM instead of the internal one. Only the v2 protocol carries this flag. [default: {}]",
            Config::default(ConfigKey::ExternalLlm)
        ))
        .value_parser(PossibleValuesParser::new(["true", "false"]))
        .global(true);
}

fn arg_readiness_attempts() -> Arg {
    return Arg::new(ConfigKey::ReadinessAttempts.to_string())
        .long(ConfigKey::ReadinessAttempts.to_string())
        .env("TIMOTHY_READINESS_ATTEMPTS")
        .num_args(1)
        .help(format!(
            "Number of readiness checks made at startup before giving up. [default: {}]",
            Config::default(ConfigKey::ReadinessAttempts)
        ))
        .global(true);
}

fn arg_readiness_interval() -> Arg {
    return Arg::new(ConfigKey::ReadinessInterval.to_string())
        .long(ConfigKey::ReadinessInterval.to_string())
        .env("TIMOTHY_READINESS_INTERVAL")
        .num_args(1)
        .help(format!(
            "Delay in milliseconds between readiness checks. [default: {}]",
            Config::default(ConfigKey::ReadinessInterval)
        ))
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("timothy")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start a new chat with Timothy."))
        .subcommand(subcommand_ask())
        .subcommand(
            Command::new("probe").about("Wait for the backend to become ready and print its version."),
        )
        .subcommand(
            Command::new("update").about("Ask the backend to update its product data. Updating may take a while."),
        )
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .arg(arg_backend_url())
        .arg(arg_protocol())
        .arg(arg_context_window())
        .arg(arg_external_llm())
        .arg(arg_readiness_attempts())
        .arg(arg_readiness_interval())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("TIMOTHY_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        );
}

/// Parses the command line and runs any one-shot subcommand. Returns true when
/// the chat UI should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_path().to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("ask", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let text = subcmd_matches
                .get_one::<String>("text")
                .map(|e| return e.to_string())
                .unwrap_or_default();
            ask(&text).await?;
            return Ok(false);
        }
        Some(("probe", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            probe().await?;
            return Ok(false);
        }
        Some(("update", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            update().await?;
            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(false);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(false);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
