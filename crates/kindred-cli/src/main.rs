//! Kindred CLI - Command-line interface for Kindred
//!
//! Manages a family dataset on disk, prints the list, tree and mindmap
//! views, and runs the websocket servers.

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use kindred_core::{DateParts, Gender, RelationshipKind};
use kindred_render::{MemberFilter, MemberSort, NodePath};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "kindred")]
#[command(author = "Kindred Contributors")]
#[command(version)]
#[command(about = "Family records, trees and mindmaps", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project directory (holds .kindred/)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Person fields shared by add-person and edit-person.
#[derive(Args, Debug, Default)]
pub struct PersonFields {
    /// Full name
    #[arg(long)]
    name: Option<String>,

    /// male, female or other
    #[arg(long)]
    gender: Option<Gender>,

    /// Birth date: YYYY, YYYY-MM or YYYY-MM-DD
    #[arg(long, value_parser = commands::parse_date)]
    birth: Option<DateParts>,

    /// Death date: YYYY, YYYY-MM or YYYY-MM-DD
    #[arg(long, value_parser = commands::parse_date)]
    death: Option<DateParts>,

    /// Mark as deceased
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    deceased: Option<bool>,

    /// Married into the family
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    in_law: Option<bool>,

    #[arg(long)]
    avatar: Option<String>,

    #[arg(long)]
    note: Option<String>,

    /// Contact details, visible to admins only
    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    occupation: Option<String>,

    #[arg(long)]
    residence: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Kindred in the project directory
    Init {
        /// Site name shown to viewers
        #[arg(long)]
        site_name: Option<String>,

        /// Admin token to accept at login
        #[arg(long)]
        token: Option<String>,
    },

    /// Import a family JSON document
    Import {
        file: PathBuf,
    },

    /// Export the family data to JSON
    Export {
        /// Output file
        #[arg(short, long, default_value = "kindred-export.json")]
        output: PathBuf,

        /// Read from the local store instead of the data file
        #[arg(long)]
        from_store: bool,
    },

    /// List members
    List {
        /// Name search
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(short, long, default_value = "all")]
        filter: MemberFilter,

        #[arg(long, default_value = "birth_asc")]
        sort: MemberSort,
    },

    /// Print the family tree
    Tree {
        /// Root person id
        #[arg(short, long)]
        root: Option<String>,

        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the family mindmap
    Mindmap {
        /// Root person id
        #[arg(short, long)]
        root: Option<String>,

        /// Levels expanded by default
        #[arg(short, long)]
        depth: Option<usize>,

        /// Node paths to expand: person ids from the root, e.g. p1/p4
        #[arg(long)]
        expand: Vec<NodePath>,

        /// Node paths to collapse
        #[arg(long)]
        collapse: Vec<NodePath>,

        #[arg(long)]
        json: bool,
    },

    /// Show one member in detail
    Show {
        id: String,

        /// Admin token, to include contact details
        #[arg(long)]
        token: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Add a person
    AddPerson {
        #[command(flatten)]
        fields: PersonFields,
    },

    /// Edit a person
    EditPerson {
        id: String,

        #[command(flatten)]
        fields: PersonFields,
    },

    /// Link two persons
    Link {
        /// First person (parent, or a spouse)
        person_a: String,

        /// Second person (child, or the other spouse)
        person_b: String,

        /// marriage, biological_child or adopted_child
        #[arg(short = 't', long = "type", default_value = "biological_child")]
        kind: RelationshipKind,

        #[arg(long)]
        note: Option<String>,
    },

    /// Start the Kindred servers
    Serve {
        /// Bind to 0.0.0.0 for remote access
        #[arg(long)]
        headless: bool,

        /// Serve from the local store instead of the data file
        #[arg(long)]
        store: bool,
    },

    /// Show project status and statistics
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let project = cli.project.as_path();
    let result = match cli.command {
        Commands::Init { site_name, token } => commands::init(project, site_name, token),
        Commands::Import { file } => commands::import(project, &file),
        Commands::Export { output, from_store } => commands::export(project, &output, from_store),
        Commands::List {
            search,
            filter,
            sort,
        } => commands::list(project, search, filter, sort),
        Commands::Tree { root, json } => commands::tree(project, root, json),
        Commands::Mindmap {
            root,
            depth,
            expand,
            collapse,
            json,
        } => commands::mindmap(project, root, depth, expand, collapse, json),
        Commands::Show { id, token, json } => commands::show(project, &id, token.as_deref(), json),
        Commands::AddPerson { fields } => commands::add_person(project, fields),
        Commands::EditPerson { id, fields } => commands::edit_person(project, &id, fields),
        Commands::Link {
            person_a,
            person_b,
            kind,
            note,
        } => commands::link(project, person_a, person_b, kind, note),
        Commands::Serve { headless, store } => commands::serve(project, headless, store).await,
        Commands::Status => commands::status(project),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
