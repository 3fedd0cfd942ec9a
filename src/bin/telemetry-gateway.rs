use clap::{Parser, Subcommand};
use std::path::PathBuf;
use telemetry_gateway::cli as prog_cli;
use telemetry_gateway::config::{ConfigLayer, load_config};
use telemetry_gateway::utils::logger;

#[derive(Parser, Debug)]
#[command(name = "telemetry-gateway", version, about = "Telemetry query gateway CLI", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). Other config files are still consulted at lower precedence.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Server address. Takes precedence over config/env.")]
    address: Option<String>,
    #[arg(long, help = "Database to select after connecting")]
    database: Option<String>,
    #[arg(long, help = "Fixture directory (<dir>/<database>/<collection>.ndjson) seeding the in-process store")]
    fixtures: Option<PathBuf>,
    #[arg(long, help = "Print one line per item instead of a single JSON value")]
    plain: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "List collections of the selected database")]
    Collections,
    #[command(about = "List the field keys of one sampled document")]
    Keys {
        #[arg(help = "Collection name")]
        collection: String,
    },
    #[command(about = "Fetch fields of a collection as columns")]
    Fetch {
        #[arg(help = "Collection name")]
        collection: String,
        #[arg(long = "field", help = "Field path to fetch; repeat for several (dotted paths allowed)")]
        fields: Vec<String>,
        #[arg(long, value_delimiter = ',', help = "Sort flags aligned with --field, e.g. true,false")]
        sort: Vec<bool>,
        #[arg(long, default_value_t = 0, help = "Maximum documents (0 = no limit)")]
        limit: u64,
        #[arg(long, default_value_t = 0, help = "Documents to skip")]
        skip: u64,
        #[arg(long = "session", help = "Restrict to this session id; repeat for several")]
        sessions: Vec<String>,
    },
    #[command(about = "Count documents, optionally restricted to session ids")]
    Count {
        #[arg(help = "Collection name")]
        collection: String,
        #[arg(long = "session", help = "Restrict to this session id; repeat for several")]
        sessions: Vec<String>,
    },
    #[command(about = "List session ids recorded for a level")]
    Sessions {
        #[arg(help = "Level key")]
        level_key: String,
    },
    #[command(about = "Invoke a native function with a JSON array of arguments")]
    Call {
        #[arg(help = "Function name, e.g. fetchDocuments")]
        function: String,
        #[arg(default_value = "[]", help = "JSON arguments, e.g. '[\"tick\", {\"limit\": 10}]'")]
        args: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let overrides = ConfigLayer {
        address: cli.address.clone(),
        database: cli.database.clone(),
        fixtures: cli.fixtures.clone(),
        ..ConfigLayer::default()
    };
    let cfg = match load_config(cli.config.as_deref(), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = logger::configure_logging(&logger::logging_from_env(cfg.logging.clone())) {
        eprintln!("warning: logging disabled: {e}");
    }

    let gw = match prog_cli::gateway_from_config(cfg) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = gw.connect_configured() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    let cmd = match cli.command {
        Commands::Collections => prog_cli::Command::Collections,
        Commands::Keys { collection } => prog_cli::Command::Keys { collection },
        Commands::Fetch { collection, fields, sort, limit, skip, sessions } => {
            prog_cli::Command::Fetch { collection, fields, sort, limit, skip, sessions }
        }
        Commands::Count { collection, sessions } => prog_cli::Command::Count { collection, sessions },
        Commands::Sessions { level_key } => prog_cli::Command::Sessions { level_key },
        Commands::Call { function, args } => prog_cli::Command::Call { function, args_json: args },
    };
    let mode = if cli.plain { prog_cli::OutputMode::Plain } else { prog_cli::OutputMode::Json };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = prog_cli::run_with_format(&gw, cmd, mode, &mut out) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
