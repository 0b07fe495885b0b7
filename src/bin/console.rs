//! Operator console
//!
//! Command line front end of the console engine: watch a host, run actions and talk to the
//! advisory backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hostwatch::{
    ConsoleConfig, ConsoleHandle, ConsoleState, HttpApiClient, TriggerOutcome, View,
    api::{ConsoleApi, Host},
    console::{AdviceView, ChatAnswer, Panel},
    projection::{ExecutionView, PLACEHOLDER, suggestions_summary},
    util,
};
use tracing::{debug, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "hostwatch")]
#[command(about = "Operator console for the fleet-monitoring backend", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// API server URL (overrides config file)
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// API authentication token (overrides config file)
    #[arg(short, long, value_name = "TOKEN")]
    token: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List monitored hosts
    Hosts,

    /// List the action catalog
    Actions,

    /// Poll a host and print its status on every change
    Watch {
        host: String,

        /// Fetch once, do not poll
        #[arg(long)]
        no_auto_refresh: bool,

        /// View to open
        #[arg(long, default_value = "overview")]
        view: View,
    },

    /// Run a catalog action on a host
    Run { host: String, action: String },

    /// Ask the advisory backend about a host
    Ask {
        host: String,
        question: String,

        /// Execute the n-th recommendation of the reply (1-based)
        #[arg(long, value_name = "N")]
        execute: Option<usize>,
    },

    /// Run the deep analysis of a host
    Analyze { host: String },
}

fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        util::get_log_level().map_or(LevelFilter::WARN, LevelFilter::from_level)
    };

    let filter = filter::Targets::new().with_targets(vec![("hostwatch", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config = ConsoleConfig::load(args.config.as_deref())?.with_env();

    // Override with CLI args if provided
    let config = ConsoleConfig {
        api_url: args.url.unwrap_or(config.api_url),
        api_token: args.token.or(config.api_token),
        ..config
    };
    debug!("using backend at {}", config.api_url);

    let client = HttpApiClient::new(&config)?;

    match args.command {
        Command::Hosts => list_hosts(&client).await,
        Command::Actions => list_actions(&client).await,
        Command::Watch {
            host,
            no_auto_refresh,
            view,
        } => {
            let config = ConsoleConfig {
                auto_refresh: !no_auto_refresh,
                ..config
            };
            watch(config, client, &host, view).await
        }
        Command::Run { host, action } => run(config, client, &host, &action).await,
        Command::Ask {
            host,
            question,
            execute,
        } => ask(config, client, &host, &question, execute).await,
        Command::Analyze { host } => analyze(config, client, &host).await,
    }
}

async fn list_hosts(client: &HttpApiClient) -> Result<()> {
    for host in client.hosts().await? {
        println!(
            "{:<16} {:<24} {}",
            host.id,
            host.name,
            host.address.as_deref().unwrap_or(PLACEHOLDER)
        );
    }
    Ok(())
}

async fn list_actions(client: &HttpApiClient) -> Result<()> {
    for action in client.actions().await? {
        let marker = if action.dangerous { " [dangerous]" } else { "" };
        println!("{:<20} {}{marker}", action.id, action.name);
        if !action.description.is_empty() {
            println!("{:<20} {}", "", action.description);
        }
    }
    Ok(())
}

/// Start a console for one-shot commands: no polling, opening `view`
async fn one_shot(
    config: ConsoleConfig,
    client: HttpApiClient,
    host: &str,
    view: View,
) -> Result<ConsoleHandle> {
    let config = ConsoleConfig {
        auto_refresh: false,
        advise_on_refresh: false,
        ..config
    };

    let console = start(config, client).await;
    console.switch_view(view).await?;
    console.select_host(host).await?;
    Ok(console)
}

async fn start(config: ConsoleConfig, client: HttpApiClient) -> ConsoleHandle {
    // An unreachable host list only disables host validation
    let hosts: Vec<Host> = match client.hosts().await {
        Ok(hosts) => hosts,
        Err(e) => {
            warn!("could not load host list: {e}");
            Vec::new()
        }
    };

    ConsoleHandle::spawn(config, Arc::new(client), hosts)
}

async fn watch(config: ConsoleConfig, client: HttpApiClient, host: &str, view: View) -> Result<()> {
    let console = start(config, client).await;
    console.switch_view(view).await?;
    console.select_host(host).await?;

    let mut updates = console.subscribe();
    let mut last_line = String::new();

    loop {
        let line = status_line(&updates.borrow_and_update());
        if line != last_line {
            println!("{line}");
            last_line = line;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted, shutting down");
                console.shutdown().await?;
                break;
            }
        }
    }

    Ok(())
}

fn status_line(state: &ConsoleState) -> String {
    let host = state.host_name().unwrap_or(PLACEHOLDER);

    let Some(snapshot) = &state.snapshot else {
        return format!("{host}: loading...");
    };

    let updated = state
        .last_update
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut line = format!(
        "[{updated}] {host} {} | CPU {} ({}, {}) | MEM {} ({} {}) | DISK {} ({} {}) | up {}",
        snapshot.status,
        snapshot.cpu,
        snapshot.cores,
        snapshot.load,
        snapshot.memory_percent,
        snapshot.memory_used,
        snapshot.memory_total,
        snapshot.disk_percent,
        snapshot.disk_used,
        snapshot.disk_total,
        snapshot.uptime,
    );

    if state.view == View::Actions
        && let Some(report) = &state.suggestions
    {
        line.push_str(&format!(" | {}", suggestions_summary(report)));
    }

    if let Some(error) = &state.error_message {
        line.push_str(&format!(" | error: {error}"));
    }

    line
}

async fn run(config: ConsoleConfig, client: HttpApiClient, host: &str, action: &str) -> Result<()> {
    let console = one_shot(config, client, host, View::Actions).await?;

    let id = match console.run_action(action).await? {
        TriggerOutcome::Running(id) => id,
        outcome => bail!("action was not started: {outcome:?}"),
    };

    let execution = wait_for_execution(&console, id).await?;
    print_execution(&execution);

    console.shutdown().await?;

    if execution.phase == "failed" {
        bail!("{} failed", execution.title);
    }
    Ok(())
}

async fn ask(
    config: ConsoleConfig,
    client: HttpApiClient,
    host: &str,
    question: &str,
    execute: Option<usize>,
) -> Result<()> {
    let console = one_shot(config, client, host, View::Chat).await?;
    console.ask(question).await?;

    let state = console
        .wait_until(|state| {
            state
                .chat
                .last()
                .is_some_and(|entry| entry.answer != ChatAnswer::Pending)
        })
        .await?;

    let answer = state
        .chat
        .last()
        .map(|entry| entry.answer.clone())
        .context("question was not recorded")?;

    match &answer {
        ChatAnswer::Advice(advice) => print_advice(advice),
        ChatAnswer::Text(text) => println!("{text}"),
        ChatAnswer::Failed(error) => bail!("{error}"),
        ChatAnswer::Pending => {}
    }

    if let Some(n) = execute {
        let ChatAnswer::Advice(advice) = &answer else {
            bail!("the reply has no recommendations to execute");
        };

        let recommendation = n
            .checked_sub(1)
            .and_then(|index| advice.recommendations.get(index))
            .with_context(|| format!("no recommendation #{n}"))?;

        let id = recommendation
            .execution
            .with_context(|| format!("recommendation #{n} is advisory only"))?;

        match console.trigger_recommendation(id).await? {
            TriggerOutcome::Running(id) | TriggerOutcome::Manual(id) => {
                let execution = wait_for_execution(&console, id).await?;
                print_execution(&execution);
            }
            TriggerOutcome::Ignored => println!("recommendation #{n} was not executed"),
        }
    }

    console.shutdown().await?;
    Ok(())
}

async fn analyze(config: ConsoleConfig, client: HttpApiClient, host: &str) -> Result<()> {
    let console = one_shot(config, client, host, View::Analysis).await?;
    console.analyze().await?;

    let state = console
        .wait_until(|state| !state.analysis.is_loading())
        .await?;
    console.shutdown().await?;

    match state.analysis {
        Panel::Ready(analysis) => {
            println!("== Disk usage by directory ==\n{}\n", analysis.disk_by_directory);
            println!("== Docker disk usage ==\n{}\n", analysis.docker_disk);
            println!("== Large files ==\n{}\n", analysis.large_files);
            println!("== Memory by process ==\n{}", analysis.memory_processes);
            Ok(())
        }
        Panel::Failed(error) | Panel::Unavailable(error) => bail!("{error}"),
        Panel::Empty | Panel::Loading => bail!("analysis did not run"),
    }
}

async fn wait_for_execution(console: &ConsoleHandle, id: u64) -> Result<ExecutionView> {
    let state = console
        .wait_until(|state| {
            state
                .execution(id)
                .is_some_and(|execution| !matches!(execution.phase.as_str(), "idle" | "running"))
        })
        .await?;

    state
        .execution(id)
        .cloned()
        .context("execution disappeared")
}

fn print_execution(execution: &ExecutionView) {
    println!("{}: {}", execution.title, execution.label);
    if let Some(detail) = &execution.detail {
        println!("{detail}");
    }
}

fn print_advice(advice: &AdviceView) {
    println!("{}\n", advice.summary);

    for (index, recommendation) in advice.recommendations.iter().enumerate() {
        println!(
            "{}. [{}] {}",
            index + 1,
            recommendation.risk.as_str(),
            recommendation.title
        );
        if !recommendation.description.is_empty() {
            println!("   {}", recommendation.description);
        }
        if let Some(command) = &recommendation.command {
            println!("   $ {command}");
        }
        if let Some(considerations) = &recommendation.considerations {
            println!("   note: {}", util::truncate(considerations, 200));
        }
    }

    if let Some(upgrade) = &advice.upgrade {
        println!(
            "\nUpgrade recommended: {}",
            upgrade.reason.as_deref().unwrap_or(PLACEHOLDER)
        );
        if let (Some(current), Some(recommended)) = (&upgrade.current_specs, &upgrade.recommended)
        {
            println!("  {current} -> {recommended}");
        }
    }
}
