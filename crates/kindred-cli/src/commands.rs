//! CLI command implementations.

use crate::PersonFields;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use kindred_core::{
    DateParts, FamilyDataset, KindredConfig, PersonCard, PersonDraft, PersonId, PrivateDraft,
    RelationshipDraft, RelationshipKind, Viewer, CONFIG_DIR,
};
use kindred_graph::{
    build_family_tree, natural_roots, select_root, FamilyGraph, FamilyStore, FamilyTree,
};
use kindred_render::{
    mindmap, ListQuery, MemberDetail, MemberFilter, MemberList, MemberSort, MindmapState,
    NodePath, TreeView,
};
use kindred_server::{
    FamilySource, JsonFileSource, KindredServer, ServerConfig, ServerContext, ServerSettings,
    StoreSource, SyncServer, SyncServerConfig, UpdateReason,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Error, Debug)]
enum CliError {
    #[error("Kindred is not initialized in {0} (run `kindred init`)")]
    NotInitialized(PathBuf),
    #[error("person not found: {0}")]
    UnknownPerson(String),
    #[error("nothing to change; pass at least one field")]
    NothingToChange,
}

/// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD`. Range checks happen when the
/// draft is validated.
pub fn parse_date(s: &str) -> std::result::Result<DateParts, String> {
    let bad = || format!("invalid date '{}': expected YYYY, YYYY-MM or YYYY-MM-DD", s);
    let mut parts = s.trim().split('-');

    let year = parts
        .next()
        .filter(|p| !p.is_empty())
        .map(str::parse::<i32>)
        .transpose()
        .map_err(|_| bad())?;
    let month = parts.next().map(str::parse::<u32>).transpose().map_err(|_| bad())?;
    let day = parts.next().map(str::parse::<u32>).transpose().map_err(|_| bad())?;

    if year.is_none() || parts.next().is_some() {
        return Err(bad());
    }
    Ok(DateParts::new(year, month, day))
}

/// An initialized project directory.
struct Project {
    root: PathBuf,
    config: KindredConfig,
}

impl Project {
    fn open(root: &Path) -> Result<Self> {
        if !KindredConfig::path_in(root).exists() {
            return Err(CliError::NotInitialized(root.to_path_buf()).into());
        }
        Ok(Self {
            root: root.to_path_buf(),
            config: KindredConfig::load(root)?,
        })
    }

    fn data_path(&self) -> PathBuf {
        self.root.join(&self.config.data_file)
    }

    fn store_path(&self) -> PathBuf {
        self.root.join(&self.config.store_path)
    }

    /// A missing data file is an empty family.
    fn load(&self) -> Result<FamilyDataset> {
        let path = self.data_path();
        if !path.exists() {
            debug!("{} does not exist yet", path.display());
            return Ok(FamilyDataset::default());
        }
        Ok(FamilyDataset::load_json_file(&path)?)
    }

    fn save(&self, dataset: &FamilyDataset) -> Result<()> {
        dataset.save_json_file(&self.data_path())?;
        Ok(())
    }

    fn load_graph(&self) -> Result<(FamilyDataset, FamilyGraph)> {
        let dataset = self.load()?;
        let graph = FamilyGraph::from_dataset(&dataset);
        Ok((dataset, graph))
    }
}

fn print_card(card: &PersonCard) {
    let name = if card.muted {
        card.name.dimmed()
    } else {
        card.name.cyan()
    };
    let badges = if card.badges.is_empty() {
        String::new()
    } else {
        format!(" [{}]", card.badges.join(", "))
    };
    println!(
        "  {} {} {}{}",
        card.id.as_str().dimmed(),
        name,
        format!("({})", card.life_span).dimmed(),
        badges.yellow()
    );
}

/// Builds the tree for the requested root, saying so when it falls back.
fn tree_for(graph: &FamilyGraph, root: Option<String>) -> Result<FamilyTree> {
    let requested = root.map(PersonId::from);
    let chosen = select_root(requested.as_ref(), graph);

    if let (Some(requested), Some(chosen)) = (&requested, &chosen) {
        if requested != chosen {
            println!(
                "{} {} not found; showing {}",
                "⚠".yellow(),
                requested,
                chosen.as_str().cyan()
            );
        }
    }

    let roots: Vec<PersonId> = chosen.into_iter().collect();
    Ok(build_family_tree(graph, &roots)?)
}

/// Initialize Kindred in a directory.
pub fn init(path: &Path, site_name: Option<String>, token: Option<String>) -> Result<()> {
    if KindredConfig::path_in(path).exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    let mut config = KindredConfig::default();
    if let Some(name) = site_name {
        config.site_name = name;
    }
    config.admin_tokens.extend(token.filter(|t| !t.trim().is_empty()));
    let config_path = config.save(path)?;

    let data_path = path.join(&config.data_file);
    if !data_path.exists() {
        FamilyDataset::default().save_json_file(&data_path)?;
    }

    println!("{} Initialized Kindred in {}", "✓".green(), path.display());
    println!("  Config: {}", config_path.display());
    println!("  Data:   {}", data_path.display());
    if config.admin_tokens.is_empty() {
        println!(
            "  {} No admin token set; add one to {} to allow edits over the server",
            "⚠".yellow(),
            CONFIG_DIR
        );
    }
    println!("  Run {} to load a family", "kindred import <file>".cyan());

    Ok(())
}

/// Import a family document into the data file and the local store.
pub fn import(path: &Path, file: &Path) -> Result<()> {
    let project = Project::open(path)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("Reading {}...", file.display()));

    let dataset = FamilyDataset::load_json_file(file)?;

    spinner.set_message("Resolving relationships...");
    let graph = FamilyGraph::from_dataset(&dataset);
    let stats = graph.stats();
    let cycle = graph.find_cycle();

    spinner.set_message("Saving...");
    project.save(&dataset)?;
    let store = FamilyStore::open(project.store_path())?;
    store.save_dataset(&dataset)?;

    spinner.finish_and_clear();

    println!(
        "{} Imported {} persons and {} relationships",
        "✓".green(),
        stats.persons.to_string().cyan(),
        stats.relationships.to_string().cyan()
    );
    if stats.dangling > 0 {
        println!(
            "{} {} relationships point at unknown persons and were ignored",
            "⚠".yellow(),
            stats.dangling
        );
    }
    if let Some(cycle) = cycle {
        let cycle: Vec<&str> = cycle.iter().map(PersonId::as_str).collect();
        println!(
            "{} Parent links form a loop: {}",
            "⚠".yellow(),
            cycle.join(" -> ").red()
        );
    }

    Ok(())
}

/// Export the family to JSON.
pub fn export(path: &Path, output: &Path, from_store: bool) -> Result<()> {
    let project = Project::open(path)?;

    let dataset = if from_store {
        FamilyStore::open(project.store_path())?
            .load_dataset()?
            .unwrap_or_default()
    } else {
        project.load()?
    };

    dataset.save_json_file(output)?;
    println!(
        "{} Exported {} persons to {}",
        "✓".green(),
        dataset.persons.len(),
        output.display()
    );

    Ok(())
}

/// List members.
pub fn list(path: &Path, search: String, filter: MemberFilter, sort: MemberSort) -> Result<()> {
    let project = Project::open(path)?;
    let dataset = project.load()?;

    let members = MemberList::build(&dataset.persons, &ListQuery { search, filter, sort });

    if let Some(message) = &members.empty_message {
        println!("{}", message);
        return Ok(());
    }

    println!(
        "{} ({} of {})\n",
        project.config.site_name.cyan().bold(),
        members.cards.len(),
        members.total
    );
    for card in &members.cards {
        print_card(card);
    }

    Ok(())
}

/// Print the family tree.
pub fn tree(path: &Path, root: Option<String>, json: bool) -> Result<()> {
    let project = Project::open(path)?;
    let (_, graph) = project.load_graph()?;

    let view = TreeView::new(&tree_for(&graph, root)?);
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", view.render_text());
    }

    Ok(())
}

/// Print the family mindmap.
pub fn mindmap(
    path: &Path,
    root: Option<String>,
    depth: Option<usize>,
    expand: Vec<NodePath>,
    collapse: Vec<NodePath>,
    json: bool,
) -> Result<()> {
    let project = Project::open(path)?;
    let (_, graph) = project.load_graph()?;

    let mut state = MindmapState::new(depth.unwrap_or(project.config.mindmap_default_depth));
    for node in expand {
        state.expand(node);
    }
    for node in collapse {
        state.collapse(node);
    }

    let tree = tree_for(&graph, root)?;
    let rows = mindmap::outline(&tree, &state);
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", mindmap::render_text(&rows));
    }

    Ok(())
}

/// Show one member.
pub fn show(path: &Path, id: &str, token: Option<&str>, json: bool) -> Result<()> {
    let project = Project::open(path)?;
    let (dataset, graph) = project.load_graph()?;

    let viewer = Viewer {
        is_admin: token.is_some_and(|t| project.config.is_admin_token(t)),
    };
    if token.is_some() && !viewer.is_admin {
        warn!("Token not accepted; showing public details only");
    }

    let detail = MemberDetail::build(&graph, &dataset, &PersonId::from(id), viewer)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        println!("{}", detail.render_text());
    }

    Ok(())
}

fn private_draft(fields: &PersonFields, existing: Option<PrivateDraft>) -> Option<PrivateDraft> {
    if fields.phone.is_none() && fields.occupation.is_none() && fields.residence.is_none() {
        return existing;
    }
    let mut draft = existing.unwrap_or_default();
    if let Some(phone) = &fields.phone {
        draft.phone_number = Some(phone.clone());
    }
    if let Some(occupation) = &fields.occupation {
        draft.occupation = Some(occupation.clone());
    }
    if let Some(residence) = &fields.residence {
        draft.current_residence = Some(residence.clone());
    }
    Some(draft)
}

fn apply_fields(draft: &mut PersonDraft, fields: &PersonFields) {
    if let Some(name) = &fields.name {
        draft.full_name = name.clone();
    }
    if let Some(gender) = fields.gender {
        draft.gender = gender;
    }
    if let Some(birth) = fields.birth {
        draft.birth = birth;
    }
    if let Some(death) = fields.death {
        draft.death = death;
        // A death date implies deceased unless said otherwise.
        draft.is_deceased = fields.deceased.unwrap_or(true);
    }
    if let Some(deceased) = fields.deceased {
        draft.is_deceased = deceased;
    }
    if let Some(in_law) = fields.in_law {
        draft.is_in_law = in_law;
    }
    if let Some(avatar) = &fields.avatar {
        draft.avatar_url = Some(avatar.clone());
    }
    if let Some(note) = &fields.note {
        draft.note = Some(note.clone());
    }
}

/// Add a person.
pub fn add_person(path: &Path, fields: PersonFields) -> Result<()> {
    let project = Project::open(path)?;
    let mut dataset = project.load()?;

    let mut draft = PersonDraft::default();
    apply_fields(&mut draft, &fields);
    let person = draft.into_person(PersonId::generate())?;

    if let Some(private) = private_draft(&fields, None) {
        dataset.upsert_private(private.into_details(person.id.clone()));
    }
    let card = PersonCard::from_person(&person);
    dataset.upsert_person(person);
    project.save(&dataset)?;

    println!("{} Added", "✓".green());
    print_card(&card);

    Ok(())
}

/// Edit a person.
pub fn edit_person(path: &Path, id: &str, fields: PersonFields) -> Result<()> {
    let project = Project::open(path)?;
    let mut dataset = project.load()?;
    let id = PersonId::from(id);

    let existing = dataset
        .person(&id)
        .ok_or_else(|| CliError::UnknownPerson(id.to_string()))?;

    let mut draft = PersonDraft::from_person(existing);
    apply_fields(&mut draft, &fields);
    if draft == PersonDraft::from_person(existing) && private_draft(&fields, None).is_none() {
        return Err(CliError::NothingToChange.into());
    }
    let person = draft.into_person(id.clone())?;

    let current_private = dataset.private_details(&id).map(|d| PrivateDraft {
        phone_number: d.phone_number.clone(),
        occupation: d.occupation.clone(),
        current_residence: d.current_residence.clone(),
    });
    if let Some(private) = private_draft(&fields, current_private) {
        dataset.upsert_private(private.into_details(id.clone()));
    }

    let card = PersonCard::from_person(&person);
    dataset.upsert_person(person);
    project.save(&dataset)?;

    println!("{} Updated", "✓".green());
    print_card(&card);

    Ok(())
}

/// Link two persons.
pub fn link(
    path: &Path,
    person_a: String,
    person_b: String,
    kind: RelationshipKind,
    note: Option<String>,
) -> Result<()> {
    let project = Project::open(path)?;
    let (mut dataset, graph) = project.load_graph()?;

    let relationship = RelationshipDraft {
        person_a: person_a.into(),
        person_b: person_b.into(),
        kind,
        note,
    }
    .validate(&dataset)?;
    graph.ensure_acyclic(&relationship)?;

    let names = |id: &PersonId| {
        dataset
            .person(id)
            .map(|p| p.full_name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let summary = format!(
        "{} {} {}",
        names(&relationship.person_a).cyan(),
        relationship.kind.to_string().yellow(),
        names(&relationship.person_b).cyan()
    );

    dataset.add_relationship(relationship);
    project.save(&dataset)?;
    println!("{} Linked {}", "✓".green(), summary);

    Ok(())
}

/// Start the RPC and sync servers.
pub async fn serve(path: &Path, headless: bool, use_store: bool) -> Result<()> {
    let project = Project::open(path)?;
    let config = &project.config;

    let source: Arc<dyn FamilySource> = if use_store {
        Arc::new(StoreSource::open(project.store_path())?)
    } else {
        Arc::new(JsonFileSource::new(project.data_path()))
    };

    println!(
        "{} {}",
        "Starting Kindred for".cyan(),
        config.site_name.cyan().bold()
    );
    println!("  Source: {}", source.describe());

    let context = Arc::new(ServerContext::new(source, ServerSettings::from(config)));
    context.reload(UpdateReason::Startup).await?;
    {
        let state = context.state.read().await;
        println!(
            "{} Loaded {} persons ({} relationships)",
            "✓".green(),
            state.graph.node_count(),
            state.graph.edge_count()
        );
    }

    let bind = |addr: SocketAddr| {
        if headless {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), addr.port())
        } else {
            addr
        }
    };
    let rpc_addr = bind(config.bind_addr);
    let sync_addr = bind(config.sync_addr);

    let rpc_server = KindredServer::new(context.clone(), ServerConfig { addr: rpc_addr });
    let sync_server = SyncServer::new(
        SyncServerConfig {
            addr: sync_addr,
            debounce_ms: config.debounce_ms,
        },
        context,
    );

    println!("{} RPC server on ws://{}", "✓".green(), rpc_addr);
    println!("{} Sync server on ws://{}", "✓".green(), sync_addr);
    if headless {
        println!("  Headless mode: accepting connections from any host");
    }
    println!("  Press {} to stop", "Ctrl+C".cyan());

    tokio::select! {
        result = rpc_server.run() => result.map_err(|e| e.to_string())?,
        result = sync_server.run() => result.map_err(|e| e.to_string())?,
        _ = tokio::signal::ctrl_c() => println!("\nShutting down"),
    }

    Ok(())
}

/// Show project status.
pub fn status(path: &Path) -> Result<()> {
    let project = match Project::open(path) {
        Ok(project) => project,
        Err(_) => {
            println!("{} Kindred not initialized in this directory", "✗".red());
            println!("  Run {} to initialize", "kindred init".cyan());
            return Ok(());
        }
    };
    let (_, graph) = project.load_graph()?;
    let stats = graph.stats();

    println!("{}", project.config.site_name.cyan().bold());
    println!();
    println!("  {} {}", "Data file:".dimmed(), project.data_path().display());
    println!(
        "  {} {}",
        "Store:".dimmed(),
        if project.store_path().exists() {
            project.store_path().display().to_string()
        } else {
            "not created".to_string()
        }
    );
    println!("  {} {}", "Persons:".dimmed(), stats.persons);
    println!("  {} {}", "Marriages:".dimmed(), stats.marriages);
    println!("  {} {}", "Child links:".dimmed(), stats.child_links);
    println!("  {} {}", "Root persons:".dimmed(), natural_roots(&graph).len());
    if stats.dangling > 0 {
        println!("  {} {}", "Dangling links:".dimmed(), stats.dangling.to_string().yellow());
    }
    match graph.find_cycle() {
        Some(cycle) => {
            let cycle: Vec<&str> = cycle.iter().map(PersonId::as_str).collect();
            println!("  {} {}", "Loop:".dimmed(), cycle.join(" -> ").red());
        }
        None => println!("  {} none", "Loop:".dimmed()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::Gender;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("1920"), Ok(DateParts::new(Some(1920), None, None)));
        assert_eq!(parse_date("1920-03"), Ok(DateParts::new(Some(1920), Some(3), None)));
        assert_eq!(
            parse_date("1920-03-07"),
            Ok(DateParts::new(Some(1920), Some(3), Some(7)))
        );
        assert!(parse_date("").is_err());
        assert!(parse_date("March 1920").is_err());
        assert!(parse_date("1920-03-07-01").is_err());
    }

    #[test]
    fn test_death_date_implies_deceased() {
        let mut draft = PersonDraft::new("A", Gender::Male);
        let fields = PersonFields {
            death: Some(DateParts::new(Some(2001), None, None)),
            ..PersonFields::default()
        };
        apply_fields(&mut draft, &fields);
        assert!(draft.is_deceased);

        let fields = PersonFields {
            death: Some(DateParts::new(Some(2001), None, None)),
            deceased: Some(false),
            ..PersonFields::default()
        };
        apply_fields(&mut draft, &fields);
        assert!(!draft.is_deceased);
    }

    #[test]
    fn test_private_fields_merge() {
        let fields = PersonFields {
            phone: Some("0900".into()),
            ..PersonFields::default()
        };
        let existing = PrivateDraft {
            occupation: Some("Teacher".into()),
            ..PrivateDraft::default()
        };

        let merged = private_draft(&fields, Some(existing)).unwrap();
        assert_eq!(merged.phone_number.as_deref(), Some("0900"));
        assert_eq!(merged.occupation.as_deref(), Some("Teacher"));
        assert!(private_draft(&PersonFields::default(), None).is_none());
    }

    #[test]
    fn test_commands_against_a_project() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path(), Some("Test Family".into()), Some("tok".into())).unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert_eq!(project.config.site_name, "Test Family");
        assert!(project.load().unwrap().is_empty());

        add_person(
            dir.path(),
            PersonFields {
                name: Some("Founder".into()),
                birth: Some(DateParts::new(Some(1900), None, None)),
                ..PersonFields::default()
            },
        )
        .unwrap();
        add_person(
            dir.path(),
            PersonFields {
                name: Some("Heir".into()),
                birth: Some(DateParts::new(Some(1930), None, None)),
                ..PersonFields::default()
            },
        )
        .unwrap();

        let dataset = project.load().unwrap();
        let founder = dataset.persons[0].id.to_string();
        let heir = dataset.persons[1].id.to_string();

        link(dir.path(), founder.clone(), heir.clone(), RelationshipKind::BiologicalChild, None)
            .unwrap();
        // The reverse link would make a loop.
        assert!(link(dir.path(), heir.clone(), founder.clone(), RelationshipKind::BiologicalChild, None).is_err());

        edit_person(
            dir.path(),
            &heir,
            PersonFields {
                deceased: Some(true),
                ..PersonFields::default()
            },
        )
        .unwrap();
        assert!(edit_person(dir.path(), &heir, PersonFields::default()).is_err());

        let dataset = project.load().unwrap();
        assert_eq!(dataset.relationships.len(), 1);
        assert!(dataset.persons.iter().any(|p| p.full_name == "Heir" && p.is_deceased));
    }

    #[test]
    fn test_uninitialized_project() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Project::open(dir.path()).is_err());
        assert!(status(dir.path()).is_ok());
    }
}
