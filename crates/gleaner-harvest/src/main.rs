use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use gleaner_argo::{locate_artifacts, ArgoClient, ArgoConfig};
use gleaner_cordra::{CordraClient, CordraConfig};
use gleaner_entities::ObjectRepository;
use gleaner_harvest::{GraphBuilder, HarvestConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Command::new("gleaner")
        .version("0.1.0")
        .about("Harvests workflow-run artifacts into a linked provenance graph")
        .arg_required_else_help(true)
        .arg(
            Arg::new("argo-host")
                .long("argo-host")
                .required(true)
                .help("Workflow engine base URL"),
        )
        .arg(
            Arg::new("namespace")
                .long("namespace")
                .default_value("argo")
                .help("Namespace the runs live in"),
        )
        .arg(
            Arg::new("cordra-host")
                .long("cordra-host")
                .help("Object repository base URL"),
        )
        .arg(
            Arg::new("cordra-user")
                .long("cordra-user")
                .help("Object repository username"),
        )
        .arg(
            Arg::new("insecure")
                .long("insecure")
                .action(ArgAction::SetTrue)
                .help("Skip TLS certificate verification"),
        )
        .subcommand(
            Command::new("harvest")
                .about("Harvest one finished run into the repository")
                .arg(
                    Arg::new("run")
                        .long("run")
                        .required(true)
                        .help("Name of the run to harvest"),
                )
                .arg(
                    Arg::new("max-file-mb")
                        .long("max-file-mb")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Largest artifact uploaded, in MiB"),
                )
                .arg(
                    Arg::new("skip-content")
                        .long("skip-content")
                        .action(ArgAction::SetTrue)
                        .help("Crawl artifacts but do not stage or upload content"),
                ),
        )
        .subcommand(Command::new("health").about("Probe the engine and the repository"))
        .subcommand(Command::new("list").about("List runs in the namespace"));

    let matches = cli.get_matches();

    let result = match matches.subcommand() {
        Some(("harvest", args)) => harvest(&matches, args).await,
        Some(("health", _)) => health(&matches).await,
        Some(("list", _)) => list(&matches).await,
        _ => unreachable!("subcommand required"),
    };

    if let Err(message) = result {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn argo_client(matches: &ArgMatches) -> Result<ArgoClient, String> {
    let host = matches
        .get_one::<String>("argo-host")
        .ok_or("--argo-host is required")?;
    let namespace = matches
        .get_one::<String>("namespace")
        .ok_or("--namespace is required")?;
    let token =
        std::env::var("ARGO_TOKEN").map_err(|_| "ARGO_TOKEN must be set in the environment")?;
    let config = ArgoConfig::new(host, token, namespace)
        .accept_invalid_certs(matches.get_flag("insecure"));
    ArgoClient::new(config).map_err(|error| error.to_string())
}

fn cordra_client(matches: &ArgMatches) -> Result<CordraClient, String> {
    let host = matches
        .get_one::<String>("cordra-host")
        .ok_or("--cordra-host is required")?;
    let user = matches
        .get_one::<String>("cordra-user")
        .ok_or("--cordra-user is required")?;
    let password = std::env::var("CORDRA_PASSWORD")
        .map_err(|_| "CORDRA_PASSWORD must be set in the environment")?;
    let config = CordraConfig::new(host, user, password)
        .accept_invalid_certs(matches.get_flag("insecure"));
    CordraClient::new(config).map_err(|error| error.to_string())
}

async fn harvest(matches: &ArgMatches, args: &ArgMatches) -> Result<(), String> {
    let engine = argo_client(matches)?;
    let repository = cordra_client(matches)?;

    let run_name = args
        .get_one::<String>("run")
        .ok_or("--run is required")?;
    let max_file_mb = *args.get_one::<u64>("max-file-mb").unwrap_or(&1000);
    let config = HarvestConfig::new()
        .with_max_file_bytes(max_file_mb * 1024 * 1024)
        .with_skip_content(args.get_flag("skip-content"));

    let run = engine
        .get_workflow(run_name)
        .await
        .map_err(|error| error.to_string())?;
    let descriptors = locate_artifacts(&run);
    println!("Harvesting {} ({} artifacts)", run_name, descriptors.len());

    let mut feed = engine
        .artifact_feed(run_name, &descriptors)
        .map_err(|error| error.to_string())?;
    let builder = GraphBuilder::new(Arc::new(repository), config);
    let root_id = builder
        .build(&run, &mut feed)
        .await
        .map_err(|error| error.to_string())?;
    println!("Created root dataset {root_id}");
    Ok(())
}

async fn health(matches: &ArgMatches) -> Result<(), String> {
    let engine = argo_client(matches)?;
    engine
        .check_health()
        .await
        .map_err(|error| format!("engine: {error}"))?;
    println!("engine: ok");

    if matches.get_one::<String>("cordra-host").is_some() {
        let repository = cordra_client(matches)?;
        let count = repository
            .find("type:Dataset")
            .await
            .map_err(|error| format!("repository: {error}"))?;
        println!("repository: ok ({count} datasets)");
    }
    Ok(())
}

async fn list(matches: &ArgMatches) -> Result<(), String> {
    let engine = argo_client(matches)?;
    let names = engine
        .list_workflows()
        .await
        .map_err(|error| error.to_string())?;
    for name in names {
        println!("{name}");
    }
    Ok(())
}
