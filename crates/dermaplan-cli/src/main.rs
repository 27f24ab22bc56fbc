use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dermaplan_core::EngineError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod input;

/// Exit status for a scan that must be retaken
const EXIT_RETAKE: u8 = 2;

fn cli() -> Command {
    let today = Arg::new("today")
        .long("today")
        .value_parser(value_parser!(chrono::NaiveDate))
        .help("Evaluation date (YYYY-MM-DD); defaults to the current UTC date");

    Command::new("dermaplan")
        .version(dermaplan_core::VERSION)
        .about("Deterministic skincare routine engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration file (TOML)"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .global(true)
                .default_value("json")
                .value_parser(["json", "yaml"])
                .help("Output format"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate a routine plan from a scan and profile")
                .arg(
                    Arg::new("scan")
                        .long("scan")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Raw metric vector (JSON or YAML)"),
                )
                .arg(
                    Arg::new("profile")
                        .long("profile")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Skin profile (JSON or YAML)"),
                )
                .arg(
                    Arg::new("history")
                        .long("history")
                        .value_parser(value_parser!(PathBuf))
                        .help("Prior plans of the same user"),
                )
                .arg(
                    Arg::new("user")
                        .long("user")
                        .value_parser(value_parser!(uuid::Uuid))
                        .help("User id; taken from the history when omitted"),
                )
                .arg(
                    Arg::new("lock-days")
                        .long("lock-days")
                        .value_parser(value_parser!(u32))
                        .help("Lock duration in days"),
                )
                .arg(
                    Arg::new("supersede")
                        .long("supersede")
                        .action(ArgAction::SetTrue)
                        .help("Replace the ADJUSTABLE plan in the history; the successor is ACTIVE"),
                )
                .arg(
                    Arg::new("activate")
                        .long("activate")
                        .action(ArgAction::SetTrue)
                        .help("Return the plan ACTIVE instead of PENDING"),
                )
                .arg(today.clone()),
        )
        .subcommand(
            Command::new("profile")
                .about("Derive a skin profile from a scan and questionnaire answers")
                .arg(
                    Arg::new("scan")
                        .long("scan")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Raw metric vector (JSON or YAML)"),
                )
                .arg(
                    Arg::new("answers")
                        .long("answers")
                        .value_parser(value_parser!(PathBuf))
                        .help("Questionnaire answers; all defaults when omitted"),
                ),
        )
        .subcommand(
            Command::new("progress")
                .about("Compare two scans")
                .arg(
                    Arg::new("previous")
                        .long("previous")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("current")
                        .long("current")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("decide")
                .about("Decide whether a plan may be revised")
                .arg(
                    Arg::new("plan")
                        .long("plan")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Current plan (JSON or YAML)"),
                )
                .arg(
                    Arg::new("previous")
                        .long("previous")
                        .requires("current")
                        .value_parser(value_parser!(PathBuf))
                        .help("Baseline scan"),
                )
                .arg(
                    Arg::new("current")
                        .long("current")
                        .requires("previous")
                        .value_parser(value_parser!(PathBuf))
                        .help("Latest scan"),
                )
                .arg(
                    Arg::new("user-request")
                        .long("user-request")
                        .action(ArgAction::SetTrue)
                        .help("The user asked for the revision"),
                )
                .arg(today),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective engine configuration as TOML"),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<EngineError>() {
        Some(engine) if engine.is_retake() => EXIT_RETAKE,
        _ => 1,
    }
}

fn dispatch(matches: &ArgMatches) -> anyhow::Result<()> {
    let engine = commands::engine(matches.get_one::<PathBuf>("config"))?;
    let format = input::Format::from_name(
        matches.get_one::<String>("format").map(String::as_str).unwrap_or("json"),
    )?;

    let output = match matches.subcommand() {
        Some(("generate", args)) => commands::generate(&engine, args, format)?,
        Some(("profile", args)) => commands::profile(&engine, args, format)?,
        Some(("progress", args)) => commands::progress(&engine, args, format)?,
        Some(("decide", args)) => commands::decide(&engine, args, format)?,
        Some(("config", _)) => engine.config().to_toml_string()?,
        _ => anyhow::bail!("no subcommand given"),
    };
    println!("{output}");
    Ok(())
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match dispatch(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let status = exit_status(&err);
            if status == EXIT_RETAKE {
                eprintln!("{err:#}");
                eprintln!("Please retake the scan: good lighting, face centered, no filters.");
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::from(status)
        }
    }
}
