use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::warn;

use til_feed::{
    feed::{commands, FeedController, FeedState},
    models::{CategoryFilter, Fact, FactId, VoteField},
    open_store,
    settings::Settings,
    utils::init_logging,
};

#[derive(Parser)]
#[command(name = "til", version, about = "Today I Learned: share and vote on facts")]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, default_value = "til.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the feed, optionally for one category
    List {
        #[arg(long, default_value = "all")]
        category: String,
    },
    /// Share a new fact
    Submit {
        text: String,
        source: String,
        category: String,
    },
    /// Vote on a fact: interesting, mindblowing or false
    Vote { id: FactId, field: String },
    /// List categories and their colors
    Categories,
    /// Write a settings file with the defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?.with_env();
    init_logging(settings.debug);

    match cli.command {
        Command::Categories => {
            for info in commands::list_categories() {
                println!("{:<14} {}", info.name, info.color);
            }
        }
        Command::Init => {
            Settings::default().save(&cli.config)?;
            println!("Wrote {}", cli.config.display());
        }
        Command::List { category } => {
            let filter: CategoryFilter = category.parse()?;
            let (controller, loaded) = start_feed(&settings).await?;
            if filter != CategoryFilter::All || !loaded {
                controller.refresh(filter).await?;
            }
            print_feed(&controller.snapshot().await);
        }
        Command::Submit {
            text,
            source,
            category,
        } => {
            let (controller, _) = start_feed(&settings).await?;
            let fact = controller.submit_fact(&text, &source, &category).await?;
            println!("Shared fact {}", fact.id);
            print_feed(&controller.snapshot().await);
        }
        Command::Vote { id, field } => {
            let field: VoteField = field.parse()?;
            let (controller, _) = start_feed(&settings).await?;
            let outcome = controller.cast_vote(id, field).await?;
            println!("{}", render_fact(outcome.fact()));
        }
    }

    Ok(())
}

/// Opens the configured store and runs the initial load. Returns whether that load succeeded.
async fn start_feed(settings: &Settings) -> Result<(FeedController, bool)> {
    let store = open_store(settings)?;
    let (controller, initial) = FeedController::start(store, settings.feed_options()).await;
    if let Err(err) = &initial {
        warn!("Initial load failed: {err}");
    }
    Ok((controller, initial.is_ok()))
}

fn render_fact(fact: &Fact) -> String {
    let disputed = if fact.is_disputed() {
        "[⛔️ DISPUTED] "
    } else {
        ""
    };
    let votes = VoteField::ALL
        .iter()
        .map(|field| format!("{} {}", field.emoji(), fact.votes(*field)))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "#{:<4} {}{} ({}) [{}] {}",
        fact.id, disputed, fact.text, fact.source, fact.category, votes
    )
}

fn print_feed(state: &FeedState) {
    if state.facts.is_empty() {
        println!("No facts for this category yet! Create the first one ✌️");
        return;
    }

    for fact in &state.facts {
        println!("{}", render_fact(fact));
    }
    println!(
        "There are {} facts in the database. Add your own!",
        state.facts.len()
    );
}
