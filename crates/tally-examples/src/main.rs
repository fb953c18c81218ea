use facet::Facet;
use figue as args;
use tally::Tracker;
use tracing::info;

mod scenarios;

type AnyResult<T> = Result<T, String>;

#[derive(Facet, Debug)]
struct Cli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    /// Print the final report as JSON instead of text.
    #[facet(args::named, default)]
    json: bool,
    /// Start with tracking disabled, overriding TALLY_ENABLED.
    #[facet(args::named, default)]
    disabled: bool,
    #[facet(args::subcommand)]
    command: CommandKind,
}

#[derive(Facet, Debug)]
#[repr(u8)]
enum CommandKind {
    DeadCode,
    InitOnce,
    ConcurrentInit,
    TagOverlap,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> AnyResult<()> {
    let cli = parse_cli()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let tracker = Tracker::from_env().map_err(|e| format!("failed to configure tracker: {e}"))?;
    if cli.disabled {
        tracker.set_enabled(false);
    }
    info!(command = ?cli.command, enabled = tracker.is_enabled(), "running scenario");

    dispatch_command(&tracker, cli.command)?;

    let report = tracker.report();
    if cli.json {
        let json = facet_json::to_string_pretty(&report).map_err(|e| format!("encode report: {e}"))?;
        println!("{json}");
    } else {
        println!("{report}");
    }
    Ok(())
}

fn parse_cli() -> AnyResult<Cli> {
    let figue_config = args::builder::<Cli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("tally-examples")
                .description("Run tally call-site tracking scenarios as subcommands")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();

    args::Driver::new(figue_config)
        .run()
        .into_result()
        .map(|v| v.value)
        .map_err(|e| e.to_string())
}

fn dispatch_command(tracker: &Tracker, command: CommandKind) -> AnyResult<()> {
    match command {
        CommandKind::DeadCode => scenarios::dead_code::run(tracker),
        CommandKind::InitOnce => scenarios::init_once::run(tracker),
        CommandKind::ConcurrentInit => scenarios::concurrent_init::run(tracker),
        CommandKind::TagOverlap => scenarios::tag_overlap::run(tracker),
    }
}
