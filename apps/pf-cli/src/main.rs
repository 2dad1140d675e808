use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pf_engine::{
    seed_state, EngineError, EngineResult, InMemoryEquipmentStates, LoggingActuator,
    LoggingCustody, OperationController, TransferRequest,
};
use pf_store::PlantStore;
use pf_topology::{build_topology, load_plant, validate_plant};

#[derive(Parser)]
#[command(name = "pf-cli")]
#[command(about = "Pipeflow CLI - plant pipeline routing and reservation tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate plant file syntax and structure
    Validate {
        /// Path to the plant YAML file
        plant_path: PathBuf,
    },
    /// Seed a fresh state snapshot from the plant file
    Init {
        /// Path to the plant YAML file
        plant_path: PathBuf,
        /// Path for the state snapshot JSON
        state_path: PathBuf,
    },
    /// Preview a route between two nodes as if every valve were open
    Suggest {
        plant_path: PathBuf,
        /// Start node name (e.g. R01_OUT)
        from_node: String,
        /// End node name (e.g. FZ1_IN)
        to_node: String,
        /// Intermediate equipment to route through
        #[arg(long)]
        via: Option<String>,
    },
    /// Start a transfer through currently open valves
    Start {
        plant_path: PathBuf,
        state_path: PathBuf,
        /// Source equipment name
        source: String,
        /// Destination equipment name
        dest: String,
        /// Intermediate equipment to route through
        #[arg(long)]
        via: Option<String>,
        /// Operation type label
        #[arg(long, default_value = "transfer")]
        op_type: String,
        /// Use the planning graph (every valve treated as open)
        #[arg(long)]
        unconstrained: bool,
    },
    /// Complete an active transfer
    Complete {
        plant_path: PathBuf,
        state_path: PathBuf,
        op_id: String,
    },
    /// Cancel an active transfer
    Cancel {
        plant_path: PathBuf,
        state_path: PathBuf,
        op_id: String,
        /// Equipment states to restore, as EQUIPMENT=LABEL
        #[arg(long = "restore", value_parser = parse_restore_pair)]
        restore: Vec<(String, String)>,
    },
    /// List active operations
    Active {
        plant_path: PathBuf,
        state_path: PathBuf,
    },
}

fn main() -> EngineResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { plant_path } => cmd_validate(&plant_path),
        Commands::Init {
            plant_path,
            state_path,
        } => cmd_init(&plant_path, &state_path),
        Commands::Suggest {
            plant_path,
            from_node,
            to_node,
            via,
        } => cmd_suggest(&plant_path, &from_node, &to_node, via.as_deref()),
        Commands::Start {
            plant_path,
            state_path,
            source,
            dest,
            via,
            op_type,
            unconstrained,
        } => cmd_start(
            &plant_path,
            &state_path,
            &source,
            &dest,
            via.as_deref(),
            &op_type,
            unconstrained,
        ),
        Commands::Complete {
            plant_path,
            state_path,
            op_id,
        } => cmd_complete(&plant_path, &state_path, &op_id),
        Commands::Cancel {
            plant_path,
            state_path,
            op_id,
            restore,
        } => cmd_cancel(&plant_path, &state_path, &op_id, &restore),
        Commands::Active {
            plant_path,
            state_path,
        } => cmd_active(&plant_path, &state_path),
    }
}

type CliController = OperationController<LoggingActuator, InMemoryEquipmentStates, LoggingCustody>;

fn build_controller(plant_path: &Path, state_path: &Path) -> EngineResult<(CliController, Arc<PlantStore>)> {
    let def = load_plant(plant_path)?;
    let topo = build_topology(&def)?;
    let store = Arc::new(PlantStore::load(state_path)?);
    let controller = OperationController::new(
        topo,
        store.clone(),
        LoggingActuator,
        InMemoryEquipmentStates::default(),
        LoggingCustody,
    );
    Ok((controller, store))
}

fn cmd_validate(plant_path: &Path) -> EngineResult<()> {
    println!("Validating plant: {}", plant_path.display());
    let def = load_plant(plant_path)?;
    validate_plant(&def)?;
    build_topology(&def)?;
    println!("✓ Plant definition is valid");
    Ok(())
}

fn cmd_init(plant_path: &Path, state_path: &Path) -> EngineResult<()> {
    let def = load_plant(plant_path)?;
    build_topology(&def)?;
    let store = PlantStore::new(seed_state(&def));
    store.save(state_path).map_err(EngineError::Store)?;
    println!(
        "Seeded state for '{}' at {}",
        def.name,
        state_path.display()
    );
    Ok(())
}

fn cmd_suggest(
    plant_path: &Path,
    from_node: &str,
    to_node: &str,
    via: Option<&str>,
) -> EngineResult<()> {
    let def = load_plant(plant_path)?;
    let topo = build_topology(&def)?;
    let store = Arc::new(PlantStore::new(seed_state(&def)));
    let controller = OperationController::new(
        topo,
        store,
        LoggingActuator,
        InMemoryEquipmentStates::default(),
        LoggingCustody,
    );

    let plan = controller.suggest_route(from_node, to_node, via)?;
    println!("Route ({} segments):", plan.segments.len());
    for segment in &plan.segments {
        println!("  {segment}");
    }
    println!("Valves to open:");
    for valve in &plan.valves_to_open {
        println!("  {valve}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_start(
    plant_path: &Path,
    state_path: &Path,
    source: &str,
    dest: &str,
    via: Option<&str>,
    op_type: &str,
    unconstrained: bool,
) -> EngineResult<()> {
    let (controller, store) = build_controller(plant_path, state_path)?;
    let req = TransferRequest {
        op_type,
        source,
        dest,
        via,
    };

    let started = if unconstrained {
        controller.start_unconstrained_transfer(&req)?
    } else {
        controller.start_transfer(&req)?
    };
    store.save(state_path).map_err(EngineError::Store)?;

    println!("Started operation {}", started.op_id);
    for segment in &started.route {
        println!("  {segment}");
    }
    Ok(())
}

fn cmd_complete(plant_path: &Path, state_path: &Path, op_id: &str) -> EngineResult<()> {
    let (controller, store) = build_controller(plant_path, state_path)?;
    let closed = controller.complete_transfer(op_id)?;
    store.save(state_path).map_err(EngineError::Store)?;

    println!("Completed operation {op_id}");
    for valve in &closed.closed_valves {
        println!("  closed {valve}");
    }
    Ok(())
}

fn cmd_cancel(
    plant_path: &Path,
    state_path: &Path,
    op_id: &str,
    restore: &[(String, String)],
) -> EngineResult<()> {
    let (controller, store) = build_controller(plant_path, state_path)?;
    let closed = controller.cancel_transfer(op_id, restore)?;
    store.save(state_path).map_err(EngineError::Store)?;

    println!("Cancelled operation {op_id}");
    for valve in &closed.closed_valves {
        println!("  closed {valve}");
    }
    Ok(())
}

fn cmd_active(plant_path: &Path, state_path: &Path) -> EngineResult<()> {
    let (controller, _store) = build_controller(plant_path, state_path)?;
    let active = controller.list_active_operations()?;

    if active.is_empty() {
        println!("No active operations");
        return Ok(());
    }
    println!(
        "{:<38} {:<16} {:<26} route",
        "operation", "type", "started"
    );
    for op in active {
        println!(
            "{:<38} {:<16} {:<26} {}",
            op.op_id,
            op.op_type,
            op.started_at,
            op.route.join(" -> ")
        );
    }
    Ok(())
}

/// Parse one `EQUIPMENT=LABEL` pair from the command line.
fn parse_restore_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(equipment, label)| (equipment.to_string(), label.to_string()))
        .ok_or_else(|| format!("expected EQUIPMENT=LABEL, got '{raw}'"))
}
