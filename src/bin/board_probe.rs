use timeline_sync::api::TimelineEngine;
use timeline_sync::config::TimelineConfig;
use timeline_sync::core::PartitionKey;
use timeline_sync::remote::{BoardId, GraphQlBoardApi, HttpTransport};
use timeline_sync::telemetry;

#[derive(Debug)]
struct CliArgs {
    board_id: String,
    token: String,
    endpoint: Option<String>,
    config: Option<String>,
    verbose_sync: bool,
}

const USAGE: &str =
    "usage: board_probe --board <id> [--token <token>] [--endpoint <url>] [--config <path>] [--verbose-sync]";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    let _ = telemetry::init_tracing(&telemetry::default_filter(args.verbose_sync));
    if let Err(err) = run(args).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|err| format!("failed to read `{path}`: {err}"))?;
            TimelineConfig::from_json_str(&raw).map_err(|err| err.to_string())?
        }
        None => TimelineConfig::default(),
    };

    let transport = match args.endpoint {
        Some(endpoint) => HttpTransport::new(endpoint, args.token.clone()),
        None => HttpTransport::with_default_endpoint(args.token.clone()),
    }
    .map_err(|err| err.to_string())?;

    let mut engine = TimelineEngine::new(
        GraphQlBoardApi::new(transport),
        BoardId::new(args.board_id),
        config,
    )
    .map_err(|err| err.to_string())?
    .with_session_token(&args.token);

    engine.load().await.map_err(|err| err.to_string())?;

    println!(
        "board {}: {} items in {} groups ({:?})",
        engine.client().board_id().as_str(),
        engine.store().len(),
        engine.store().groups().len(),
        engine.access_mode(),
    );
    println!("years: {:?}", engine.available_years());
    for (key, items) in engine.schedule_view() {
        let title = match &key {
            PartitionKey::Group(id) => engine
                .store()
                .group(id)
                .map_or_else(|| id.to_string(), |group| group.title.clone()),
            PartitionKey::Status(label) => label.clone(),
        };
        println!("  {title}: {} items", items.len());
        for item in items {
            println!(
                "    {} {} .. {} {}",
                item.id,
                item.start_date(),
                item.end_date(),
                item.name
            );
        }
    }
    Ok(())
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args().skip(1);
    let mut board_id = None::<String>;
    let mut token = std::env::var("BOARD_API_TOKEN").ok();
    let mut endpoint = None::<String>;
    let mut config = None::<String>;
    let mut verbose_sync = false;

    while let Some(flag) = args.next() {
        let mut value = || {
            args.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        };
        match flag.as_str() {
            "--board" => board_id = Some(value()?),
            "--token" => token = Some(value()?),
            "--endpoint" => endpoint = Some(value()?),
            "--config" => config = Some(value()?),
            "--verbose-sync" => verbose_sync = true,
            "--help" | "-h" => return Err(USAGE.to_owned()),
            _ => return Err(format!("unknown argument `{flag}`")),
        }
    }

    Ok(CliArgs {
        board_id: board_id.ok_or_else(|| USAGE.to_owned())?,
        token: token.ok_or_else(|| "missing --token or BOARD_API_TOKEN".to_owned())?,
        endpoint,
        config,
        verbose_sync,
    })
}
