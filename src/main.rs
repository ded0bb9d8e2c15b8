use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use trial_search::client::build_http_client;
use trial_search::client::geocode::NominatimGeocoder;
use trial_search::client::search::HttpSearchClient;
use trial_search::config::Config;
use trial_search::display::{format_chips, format_view};
use trial_search::recent::RecentSearches;
use trial_search::session::{Outcome, SearchSession};

#[derive(Parser)]
#[command(name = "trial-search", version, about = "Search clinical trials from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single search and print the results
    Search {
        /// Free-text query, e.g. "asthma trials near Denver"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Print a random sample of example queries
    Suggest,
    /// Print the recent-search list
    Recent,
    /// Interactive session with hover/click commands
    Shell,
}

type Session = SearchSession<HttpSearchClient, NominatimGeocoder>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the rendered view
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    tracing::debug!("Search endpoint: {}", config.search_url());

    match cli.command {
        Command::Search { query } => {
            let mut session = build_session(config)?;
            session.submit(&query.join(" ")).await;
            print!("{}", format_view(session.view()));
        }
        Command::Suggest => {
            let chips: Vec<String> = trial_search::suggestions::sample_default(config.suggestion_count)
                .into_iter()
                .map(str::to_string)
                .collect();
            println!("{}", format_chips("Try", &chips));
        }
        Command::Recent => {
            let recent = RecentSearches::open(&config.recent_searches_path());
            println!("{}", format_chips("Recent", recent.entries()));
        }
        Command::Shell => run_shell(build_session(config)?).await?,
    }

    Ok(())
}

fn build_session(config: Config) -> anyhow::Result<Session> {
    let client = build_http_client(&config)?;
    let backend = HttpSearchClient::new(client.clone(), config.search_url());
    let geocoder = NominatimGeocoder::new(client, config.geocoder.clone());
    Ok(SearchSession::new(config, backend, geocoder))
}

const SHELL_HELP: &str = "\
Type a query to search, or:
  :hover <id>    highlight a trial      :leave <id>   clear hover
  :click <id>    select a row           :popup <id>   follow a marker popup link
  :chip <n>      run suggestion n       :recent <n>   rerun recent search n
  :help          this text              :quit         exit";

async fn run_shell(mut session: Session) -> anyhow::Result<()> {
    println!("{}", format_chips("Try", session.suggestions()));
    println!("{}", format_chips("Recent", session.recent()));
    println!("{SHELL_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (cmd, arg) = match line.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (line, ""),
        };

        let redraw = match cmd {
            "" => false,
            ":quit" | ":q" => break,
            ":help" => {
                println!("{SHELL_HELP}");
                false
            }
            ":hover" => !session.view_mut().hover(arg).is_empty(),
            ":leave" => {
                session.view_mut().unhover(arg);
                true
            }
            ":click" => !session.view_mut().click_row(arg).is_empty(),
            ":popup" => {
                let touched = !session.view_mut().click_popup_link(arg).is_empty();
                if touched {
                    print!("{}", format_view(session.view()));
                    session.view_mut().end_flash();
                }
                false
            }
            ":chip" | ":recent" => {
                let outcome = match parse_index(arg) {
                    Some(i) if cmd == ":chip" => session.submit_suggestion(i).await,
                    Some(i) => session.submit_recent(i).await,
                    None => None,
                };
                if outcome.is_none() {
                    println!("No such entry: {arg}");
                }
                finish_search(&session, outcome)
            }
            other if other.starts_with(':') => {
                println!("Unknown command {other}; :help lists commands");
                false
            }
            _ => {
                let outcome = session.submit(line).await;
                finish_search(&session, Some(outcome))
            }
        };

        if redraw {
            print!("{}", format_view(session.view()));
        }
    }

    Ok(())
}

fn parse_index(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok().and_then(|n| n.checked_sub(1))
}

fn finish_search(session: &Session, outcome: Option<Outcome>) -> bool {
    match outcome {
        Some(Outcome::Rejected) | None => false,
        Some(_) => {
            println!("{}", format_chips("Recent", session.recent()));
            true
        }
    }
}
