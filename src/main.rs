//! HadronStore command-line demo.
//!
//! Opens (or creates) a RAM-resident repository of a built-in `Person`
//! class under the configured data directory and lets the caller
//! insert, fetch and list records from the shell.

use clap::{Parser, Subcommand};
use hadronstore::core::Config;
use hadronstore::repo::{IndexKind, RamObjectRepository};
use hadronstore::schema::{AdpRegistry, Class, Designation, MaxPopulation, Member, MinPopulation};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "hadronstore-cli", version, about = "HadronStore embedded object database demo")]
struct Cli {
    /// Configuration file path (defaults to hadronstore.toml, then built-in defaults).
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert a new person, printing the assigned object ID.
    Insert {
        /// Person's name (must be unique).
        name: String,
        /// Person's age.
        age: u16,
    },
    /// Fetch a person by object ID.
    Fetch {
        /// Object ID to fetch.
        id: u32,
    },
    /// List every non-deleted person.
    List,
    /// Export the current ADP profile to an XML file.
    ExportProfile {
        /// Destination path.
        path: String,
    },
}

fn person_class() -> Class {
    let mut class = Class::new("Person", Designation::User);
    class.add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 0)).expect("add name member");
    class.add_member(Member::new("age", "u16", MinPopulation::Optional, MaxPopulation::One, 1)).expect("add age member");
    class.freeze().expect("freeze Person class");
    class
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load().unwrap_or_default(),
    };
    hadronstore::init(&config);

    let adp = Arc::new(AdpRegistry::new(&config.storage.app_name));
    adp.init_standard();
    adp.register_class(person_class())?;
    let class = adp.class_by_name("Person").expect("Person just registered");
    for member in class.members().to_vec() {
        adp.register_member("Person", member)?;
    }
    let class = adp.class_by_name("Person").expect("Person just registered");

    std::fs::create_dir_all(&config.storage.data_dir)?;
    let strings = Arc::new(hadronstore::strings::StringTable::new());
    let repo = RamObjectRepository::open(config.storage.data_dir.join("person.delta"), class.clone(), adp.clone(), strings, &[("name", IndexKind::Unique)], None)?;

    match cli.command {
        Commands::Insert { name, age } => {
            let mut container = hadronstore::container::ObjectContainer::init(adp, class, None)?;
            container.set_value_text("name", &name)?;
            container.set_value_text("age", &age.to_string())?;
            let id = repo.insert(&container)?;
            info!(id, "inserted person");
            println!("{id}");
        }
        Commands::Fetch { id } => {
            let container = repo.fetch(id)?;
            println!("{}", serde_json::to_string_pretty(&container.export_json()?)?);
        }
        Commands::List => {
            for id in 1..=repo.population() {
                if repo.is_deleted(id) {
                    continue;
                }
                if let Ok(container) = repo.fetch(id) {
                    let name = container.get_value_by_name("name").map(|a| a.str()).unwrap_or_default();
                    println!("{id}\t{name}");
                }
            }
        }
        Commands::ExportProfile { path } => {
            adp.export(std::path::Path::new(&path))?;
            println!("wrote {path}");
        }
    }

    Ok(())
}
