//! Demonstration driver for the bridge core.
//!
//! Opens a session with a sample chest, feeds it a scripted batch (or one
//! loaded from a JSON file passed as the first argument), and logs every
//! click frame the commit emits plus the batch responses.

use tokio::sync::mpsc;
use tracing::{error, info};

use mc_bridge_inventory::{ClickSink, ContainerCategory, ItemTable, RecipeTable};
use mc_bridge_proto::click::ClickFrame;
use mc_bridge_proto::request::{
    ContainerTag, ItemStackBatch, SlotRef, StackAction, StackRequest,
};
use mc_bridge_proto::ItemStack;
use mc_bridge_session::{run, BridgeConfig, Session, SessionCommand, SessionEvent};

const STONE: i32 = 1;
const PEARL: i32 = 7;

/// Sink that narrates each emitted click frame.
struct LoggingSink;

impl ClickSink for LoggingSink {
    fn send_click(&mut self, frame: ClickFrame) {
        info!(
            container = frame.container_id,
            revision = frame.revision,
            slot = frame.slot,
            kind = frame.kind,
            param = frame.param,
            "click frame"
        );
    }
}

fn demo_tables() -> (ItemTable, RecipeTable) {
    let mut items = ItemTable::new();
    items.register("bridge:stone", STONE, 64);
    items.register("bridge:pearl", PEARL, 16);
    (items, RecipeTable::new())
}

fn demo_batch() -> ItemStackBatch {
    ItemStackBatch {
        requests: vec![StackRequest {
            request_id: 1,
            actions: vec![
                StackAction::Take {
                    count: 20,
                    src: SlotRef::bare(ContainerTag::LevelEntity, 3),
                    dst: SlotRef::bare(ContainerTag::HotbarAndInventory, 0),
                },
                StackAction::Take {
                    count: 20,
                    src: SlotRef::bare(ContainerTag::LevelEntity, 3),
                    dst: SlotRef::bare(ContainerTag::HotbarAndInventory, 1),
                },
                StackAction::Drop {
                    count: 2,
                    src: SlotRef::bare(ContainerTag::HotbarAndInventory, 1),
                },
            ],
            filter_strings: Vec::new(),
        }],
    }
}

fn load_batch(path: &str) -> Option<ItemStackBatch> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to read batch file {path}: {e}");
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(batch) => Some(batch),
        Err(e) => {
            error!("failed to parse batch file {path}: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let config = match std::fs::metadata("bridge.toml") {
        Ok(_) => match BridgeConfig::load("bridge.toml") {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load bridge.toml: {e}");
                std::process::exit(1);
            }
        },
        Err(_) => BridgeConfig::default(),
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("mc-bridge v{} demo session", env!("CARGO_PKG_VERSION"));

    let batch = std::env::args()
        .nth(1)
        .and_then(|path| load_batch(&path))
        .unwrap_or_else(demo_batch);

    let (items, recipes) = demo_tables();
    let session = Session::new(config, items, recipes, LoggingSink);

    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (event_tx, mut event_rx) = mpsc::channel(16);
    let loop_task = tokio::spawn(run(session, cmd_rx, event_tx));

    let mut contents = vec![ItemStack::empty(); 27];
    contents[3] = ItemStack::new(STONE, 40);
    contents[5] = ItemStack::new(PEARL, 12);

    let commands = [
        SessionCommand::Open {
            container_id: 2,
            category: ContainerCategory::Generic { size: 27 },
            contents,
        },
        SessionCommand::Batch {
            container_id: 2,
            batch,
        },
        SessionCommand::Close { container_id: 2 },
    ];
    for command in commands {
        if cmd_tx.send(command).await.is_err() {
            error!("session loop ended early");
            break;
        }
    }
    drop(cmd_tx);

    while let Some(event) = event_rx.recv().await {
        match event {
            SessionEvent::Response {
                container_id,
                response,
            } => info!(container_id, ?response, "batch response"),
            SessionEvent::Resync { container_id } => {
                info!(container_id, "full resynchronization required")
            }
            SessionEvent::Closed { container_id } => info!(container_id, "window closed"),
        }
    }
    if let Err(e) = loop_task.await {
        error!("session loop panicked: {e}");
    }
}
