use autovote_runner::{BrowserOptions, NewSite, RunConfig, SiteStore, Timings};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "autovote-runner")]
#[command(about = "Automated voting on session-based web forms")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Site configuration file
    #[arg(long, global = true, env = "AUTOVOTE_SITES", default_value = "sites.yaml")]
    sites: PathBuf,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with an identifier and vote until the form runs out
    Run(RunArgs),

    /// Manage saved sites
    #[command(subcommand)]
    Sites(SitesCommand),

    /// Validate the sites file without running
    Check,
}

#[derive(Args)]
struct RunArgs {
    /// Identifier typed into the login form
    identifier: String,

    /// Zero-based option to pick in every question
    #[arg(default_value_t = 1)]
    choice_index: usize,

    /// Saved site to run against
    #[arg(long, conflicts_with_all = ["login_url", "vote_url"])]
    site: Option<String>,

    /// Login page URL (with --vote-url, instead of --site)
    #[arg(long, requires = "vote_url")]
    login_url: Option<String>,

    /// Voting page URL
    #[arg(long, requires = "login_url")]
    vote_url: Option<String>,

    /// Voting rounds (defaults to the site's setting)
    #[arg(long)]
    iterations: Option<u32>,

    /// Run in headless mode
    #[arg(long)]
    headless: bool,
}

#[derive(Subcommand)]
enum SitesCommand {
    /// List saved sites
    List,

    /// Save a new site
    Add {
        name: String,
        login_url: String,
        vote_url: String,

        /// Default voting rounds
        #[arg(long)]
        iterations: Option<u32>,
    },

    /// Remove a saved site
    Remove { id: String },
}

#[tokio::main]
async fn main() -> autovote_runner::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    match cli.command {
        Command::Run(args) => run(&cli.sites, args).await,
        Command::Sites(cmd) => sites(&cli.sites, cmd),
        Command::Check => check(&cli.sites),
    }
}

async fn run(sites: &Path, args: RunArgs) -> autovote_runner::Result<()> {
    let config = match (&args.site, &args.login_url, &args.vote_url) {
        (Some(id), _, _) => {
            let store = SiteStore::open(sites)?;
            let site = store.resolve(id)?;
            println!("Site: {} ({})", site.name, site.id);
            site.run_config(&args.identifier, args.choice_index, args.iterations)?
        }
        (None, Some(login), Some(vote)) => RunConfig::new(&args.identifier, login, vote)?
            .choice_index(args.choice_index)
            .max_iterations(args.iterations.unwrap_or(1)),
        _ => {
            return Err(autovote_runner::Error::Config(
                "either --site or --login-url and --vote-url are required".into(),
            ))
        }
    };

    // Visible windows stay up for a moment after the run.
    let timings = Timings {
        close_delay_ms: if args.headless { 0 } else { 3000 },
        ..config.timings
    };
    let config = config.timings(timings);

    let browser = BrowserOptions {
        headless: args.headless,
        ..Default::default()
    };
    let log = |message: &str| println!("{}", message);

    let result = autovote_runner::run_vote(&config, &browser, &log).await;

    println!();
    match result {
        Ok(summary) => {
            println!("✓ Finished ({:?})", summary.reason);
            println!("  Rounds: {}", summary.iterations);
            println!("  Questions: {}", summary.groups_processed);
            println!("  Duration: {}ms", summary.duration_ms);
            Ok(())
        }
        Err(e) => {
            println!("✗ Failed");
            println!("  Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn sites(path: &Path, cmd: SitesCommand) -> autovote_runner::Result<()> {
    let mut store = SiteStore::open(path)?;
    match cmd {
        SitesCommand::List => {
            if store.list().is_empty() {
                println!("No sites in {}", store.path().display());
            }
            for site in store.list() {
                println!("{}  {}", site.id, site.name);
                println!("    Login: {}", site.login_url);
                println!("    Vote:  {}", site.vote_url);
                println!("    Iterations: {}", site.default_iterations);
            }
        }
        SitesCommand::Add {
            name,
            login_url,
            vote_url,
            iterations,
        } => {
            let site = store.create(NewSite {
                name,
                login_url,
                vote_url,
                default_iterations: iterations,
                labels: None,
            })?;
            println!("Added site {} ({})", site.id, site.name);
        }
        SitesCommand::Remove { id } => {
            let site = store.delete(&id)?;
            println!("Removed site {} ({})", site.id, site.name);
        }
    }
    Ok(())
}

fn check(path: &Path) -> autovote_runner::Result<()> {
    let store = SiteStore::open(path)?;
    println!("Sites valid: {}", store.path().display());
    println!("  Sites: {}", store.list().len());
    for site in store.list() {
        let overrides = if site.labels.is_some() {
            " (custom labels)"
        } else {
            ""
        };
        println!(
            "    - {} {}: {} rounds{}",
            site.id, site.name, site.default_iterations, overrides
        );
    }
    Ok(())
}
