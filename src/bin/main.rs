//! xrbroker CLI - Query the OpenXR runtime brokers of an Android device
//!
//! Usage:
//!   xrbroker uri active|functions [--package <pkg>]
//!   xrbroker active [--broker installable|system] [--abi <abi>]
//!   xrbroker functions --package <pkg>
//!   xrbroker resolve [--json] [--discover]
//!
//! Examples:
//!   xrbroker active --serial emulator-5554
//!   xrbroker resolve --discover --json
//!   xrbroker resolve --fixture runtimes.toml --abi x86_64

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use xrbroker::broker::StaticBroker;
use xrbroker::client::{BrokerClient, RuntimeData};
use xrbroker::config::Settings;
use xrbroker::contract::BrokerType;
use xrbroker::logging;
use xrbroker::resolver::ContentResolver;
use xrbroker::uri::{active_runtime_uri, functions_uri};

#[derive(Parser)]
#[command(name = "xrbroker")]
#[command(about = "xrbroker - Find the active OpenXR runtime through the Android runtime brokers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    target: TargetArgs,
}

/// Options shared by every subcommand.
#[derive(Args)]
struct TargetArgs {
    /// Broker to query: installable or system (overrides the config file)
    #[arg(long, global = true, value_name = "BROKER")]
    broker: Option<BrokerType>,

    /// Shorthand for --broker system
    #[arg(long, global = true, conflicts_with = "broker")]
    system: bool,

    /// OpenXR major version
    #[arg(long, global = true)]
    major: Option<u32>,

    /// Android ABI (defaults to the configured or host ABI)
    #[arg(long, global = true)]
    abi: Option<String>,

    /// Device serial passed to adb
    #[arg(short, long, global = true)]
    serial: Option<String>,

    /// Answer from a TOML fixture instead of a device
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Config file (defaults to xrbroker.toml or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Suppress diagnostic logging
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a broker table URI
    Uri {
        #[command(subcommand)]
        table: UriTable,
    },

    /// Print the active runtime
    Active,

    /// Print the function remapping of a runtime package
    Functions {
        /// Runtime package name
        #[arg(short, long)]
        package: String,
    },

    /// Print the active runtime with its function remapping
    Resolve {
        /// Output JSON
        #[arg(long)]
        json: bool,

        /// Try the installable broker, then the system broker
        #[arg(long)]
        discover: bool,
    },
}

#[derive(Subcommand)]
enum UriTable {
    /// The active runtime table
    Active,
    /// The functions table of a runtime package
    Functions {
        /// Runtime package name
        #[arg(short, long)]
        package: String,
    },
}

/// Resolved query parameters.
struct Target {
    broker: BrokerType,
    major_version: u32,
    abi: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.target.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&settings.logging.filter, cli.target.quiet);

    let target = match resolve_target(&cli.target, &settings) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Commands::Uri { table } = &cli.command {
        return cmd_uri(&target, table);
    }

    let resolver = match build_resolver(&cli.target, &settings) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let client = BrokerClient::new(resolver);

    match cli.command {
        Commands::Uri { .. } => ExitCode::SUCCESS,
        Commands::Active => cmd_active(&client, &target),
        Commands::Functions { package } => cmd_functions(&client, &target, &package),
        Commands::Resolve { json, discover } => cmd_resolve(&client, &target, json, discover),
    }
}

/// Merge command line options over the settings file.
fn resolve_target(args: &TargetArgs, settings: &Settings) -> Result<Target, String> {
    let broker = match (args.broker, args.system) {
        (Some(broker), _) => broker,
        (None, true) => BrokerType::System,
        (None, false) => settings.query.broker,
    };
    let major_version = args.major.unwrap_or(settings.query.major_version);
    let abi = match &args.abi {
        Some(abi) => abi.clone(),
        None => settings.query.resolved_abi().map_err(|e| e.to_string())?,
    };
    Ok(Target {
        broker,
        major_version,
        abi,
    })
}

fn build_resolver(
    args: &TargetArgs,
    settings: &Settings,
) -> Result<Box<dyn ContentResolver>, String> {
    if let Some(path) = &args.fixture {
        let broker = StaticBroker::from_file(path).map_err(|e| e.to_string())?;
        return Ok(Box::new(broker));
    }

    let mut resolver = settings.adb.resolver().map_err(|e| e.to_string())?;
    if let Some(serial) = &args.serial {
        resolver = resolver.with_serial(serial.clone());
    }
    Ok(Box::new(resolver))
}

fn cmd_uri(target: &Target, table: &UriTable) -> ExitCode {
    let uri = match table {
        UriTable::Active => active_runtime_uri(target.broker, target.major_version, &target.abi),
        UriTable::Functions { package } => {
            functions_uri(target.broker, target.major_version, package, &target.abi)
        }
    };
    println!("{}", uri);
    ExitCode::SUCCESS
}

fn cmd_active<R: ContentResolver>(client: &BrokerClient<R>, target: &Target) -> ExitCode {
    match client.describe_active_runtime(target.broker, target.major_version, &target.abi) {
        Some(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        None => {
            println!("No runtime found");
            ExitCode::FAILURE
        }
    }
}

fn cmd_functions<R: ContentResolver>(
    client: &BrokerClient<R>,
    target: &Target,
    package: &str,
) -> ExitCode {
    let mut count = 0;
    for mapping in client.query_functions(target.broker, target.major_version, package, &target.abi)
    {
        println!("{} -> {}", mapping.function_name, mapping.symbol_name);
        count += 1;
    }
    if count == 0 {
        eprintln!("No function mappings for {}", package);
    }
    ExitCode::SUCCESS
}

fn cmd_resolve<R: ContentResolver>(
    client: &BrokerClient<R>,
    target: &Target,
    json: bool,
    discover: bool,
) -> ExitCode {
    let runtime = if discover {
        client.discover(target.major_version, &target.abi)
    } else {
        client.resolve_runtime(target.broker, target.major_version, &target.abi)
    };

    let Some(runtime) = runtime else {
        println!("No runtime found");
        return ExitCode::FAILURE;
    };

    if json {
        match serde_json::to_string_pretty(&runtime) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error serializing runtime: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_runtime(&runtime);
    }
    ExitCode::SUCCESS
}

fn print_runtime(runtime: &RuntimeData) {
    println!("Broker:    {}", runtime.broker);
    println!("Package:   {}", runtime.package_name);
    println!("Library:   {}/{}", runtime.native_lib_dir, runtime.so_filename);
    println!("OpenXR:    {}", runtime.major_version);
    if runtime.functions.is_empty() {
        println!("Functions: none");
    } else {
        println!("Functions:");
        for (function, symbol) in &runtime.functions {
            println!("  {} -> {}", function, symbol);
        }
    }
}
