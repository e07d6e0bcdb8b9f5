//! Per-session container ownership and batch serialization.
//!
//! One `Session` is the single logical owner of a player's windows: the
//! always-present player window plus at most one open block container.
//! Batches are processed strictly in order against the active window; each
//! either commits wholesale (clicks emitted through the sink, model
//! replaced) or rejects with nothing sent. The command loop in [`run`]
//! serializes everything on one task, so no locking exists anywhere.

pub mod config;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use mc_bridge_inventory::model::CanonicalSlot;
use mc_bridge_inventory::synth::build_accept_response;
use mc_bridge_inventory::{
    ClickPlanner, ClickSink, ContainerCategory, InventoryModel, ItemTable, RecipeTable,
    RequestSynthesizer,
};
use mc_bridge_proto::request::ItemStackBatch;
use mc_bridge_proto::response::BatchResponse;
use mc_bridge_proto::ItemStack;

pub use config::BridgeConfig;

/// Window id of the always-present player window.
pub const PLAYER_WINDOW_ID: u8 = 0;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("container contents hold {got} slots, category needs {expected}")]
    WrongContentsSize { expected: usize, got: usize },
}

struct OpenWindow {
    container_id: u8,
    category: ContainerCategory,
    model: InventoryModel,
}

/// Single owner of a player's container state.
pub struct Session<S: ClickSink> {
    config: BridgeConfig,
    items: ItemTable,
    recipes: RecipeTable,
    sink: S,
    /// Player window model; persists across block-container windows.
    player: InventoryModel,
    open: Option<OpenWindow>,
    revision: i32,
}

impl<S: ClickSink> Session<S> {
    pub fn new(config: BridgeConfig, items: ItemTable, recipes: RecipeTable, sink: S) -> Self {
        Self {
            config,
            items,
            recipes,
            sink,
            player: InventoryModel::new(ContainerCategory::Player.size() as usize),
            open: None,
            revision: 0,
        }
    }

    /// Id of the window batches currently address.
    pub fn active_window_id(&self) -> u8 {
        self.open
            .as_ref()
            .map(|w| w.container_id)
            .unwrap_or(PLAYER_WINDOW_ID)
    }

    pub fn active_category(&self) -> ContainerCategory {
        self.open
            .as_ref()
            .map(|w| w.category)
            .unwrap_or(ContainerCategory::Player)
    }

    /// Authoritative model of the active window.
    pub fn model(&self) -> &InventoryModel {
        self.open.as_ref().map(|w| &w.model).unwrap_or(&self.player)
    }

    /// Seed the player window (e.g. from persistence) before play.
    pub fn load_player_contents(
        &mut self,
        contents: Vec<ItemStack>,
    ) -> Result<(), SessionError> {
        let expected = ContainerCategory::Player.size() as usize;
        if contents.len() != expected {
            return Err(SessionError::WrongContentsSize {
                expected,
                got: contents.len(),
            });
        }
        self.player = InventoryModel::from_contents(contents);
        Ok(())
    }

    /// Open a block container. `contents` covers only the container's own
    /// slots; the player storage region is carried into the new window.
    pub fn open_container(
        &mut self,
        container_id: u8,
        category: ContainerCategory,
        contents: Vec<ItemStack>,
    ) -> Result<(), SessionError> {
        let own = category.size() as usize - 36;
        if contents.len() != own {
            return Err(SessionError::WrongContentsSize {
                expected: own,
                got: contents.len(),
            });
        }
        if self.open.is_some() {
            // The back protocol replaces windows implicitly; mirror that.
            self.close_current();
        }

        let mut model = InventoryModel::new(category.size() as usize);
        let storage = category.temp_slot_range();
        let player_storage: Vec<ItemStack> = ContainerCategory::Player
            .temp_slot_range()
            .filter_map(|c| self.player.get(CanonicalSlot(c)).cloned())
            .collect();
        let mut own_iter = contents.into_iter();
        let mut storage_iter = player_storage.into_iter();
        for c in 0..category.size() as i16 {
            let stack = if storage.contains(&c) {
                storage_iter.next().unwrap_or_else(ItemStack::empty)
            } else {
                own_iter.next().unwrap_or_else(ItemStack::empty)
            };
            model.set(CanonicalSlot(c), stack);
        }
        model.set(CanonicalSlot::CURSOR, self.player.cursor().clone());
        model.raise_net_id_watermark(self.player.net_id_watermark());
        // Stacks arriving from the container side may lack ids.
        for c in 0..category.size() as i16 {
            let slot = CanonicalSlot(c);
            if let Some(stack) = model.get(slot) {
                if !stack.is_empty() && stack.net_id == 0 {
                    let mut stack = stack.clone();
                    stack.net_id = model.allocate_net_id();
                    model.set(slot, stack);
                }
            }
        }

        info!(container_id, ?category, "container opened");
        self.open = Some(OpenWindow {
            container_id,
            category,
            model,
        });
        Ok(())
    }

    /// Close the open container, carrying the player storage region (and
    /// cursor) back to the player window. Unknown ids are ignored.
    pub fn close_container(&mut self, container_id: u8) {
        match &self.open {
            Some(w) if w.container_id == container_id => {
                self.close_current();
                info!(container_id, "container closed");
            }
            _ => {
                debug!(container_id, "close for a container that is not open");
            }
        }
    }

    fn close_current(&mut self) {
        let Some(window) = self.open.take() else {
            return;
        };
        let storage: Vec<ItemStack> = window
            .category
            .temp_slot_range()
            .filter_map(|c| window.model.get(CanonicalSlot(c)).cloned())
            .collect();
        for (stack, c) in storage
            .into_iter()
            .zip(ContainerCategory::Player.temp_slot_range())
        {
            self.player.set(CanonicalSlot(c), stack);
        }
        self.player
            .set(CanonicalSlot::CURSOR, window.model.cursor().clone());
        self.player
            .raise_net_id_watermark(window.model.net_id_watermark());
    }

    /// Process one batch against the active window: synthesize against a
    /// shadow, then commit everything or nothing.
    pub fn handle_batch(&mut self, batch: &ItemStackBatch) -> BatchResponse {
        if let Some(response) = self.check_limits(batch) {
            return response;
        }
        let stripped;
        let batch = if self.config.behavior.strict_net_ids {
            batch
        } else {
            stripped = strip_claims(batch);
            &stripped
        };

        let category = self.active_category();
        let container_id = self.active_window_id();
        let model = match &self.open {
            Some(w) => &w.model,
            None => &self.player,
        };
        let synthesizer = RequestSynthesizer::new(category, &self.items, &self.recipes);
        let planner: ClickPlanner<'_> = match synthesizer.synthesize(model, batch) {
            Ok(planner) => planner,
            Err(err) => {
                debug!(%err, kind = ?err.kind(), "batch rejected");
                return BatchResponse::Rejected { kind: err.kind() };
            }
        };

        let response = build_accept_response(&planner);
        let new_model = planner.commit(container_id, self.revision, &mut self.sink);
        self.revision += 1;
        match &mut self.open {
            Some(w) => w.model = new_model,
            None => self.player = new_model,
        }
        response
    }

    fn check_limits(&self, batch: &ItemStackBatch) -> Option<BatchResponse> {
        let limits = &self.config.limits;
        if batch.requests.len() > limits.max_requests_per_batch
            || batch
                .requests
                .iter()
                .any(|r| r.actions.len() > limits.max_actions_per_request)
        {
            warn!(
                requests = batch.requests.len(),
                "batch exceeds configured limits"
            );
            return Some(BatchResponse::Rejected {
                kind: mc_bridge_proto::response::RejectKind::Structural,
            });
        }
        None
    }
}

/// Lenient mode: drop every claimed net id before synthesis.
fn strip_claims(batch: &ItemStackBatch) -> ItemStackBatch {
    use mc_bridge_proto::request::StackAction;
    let mut out = batch.clone();
    for request in &mut out.requests {
        for action in &mut request.actions {
            match action {
                StackAction::Take { src, dst, .. } | StackAction::Place { src, dst, .. } => {
                    src.claimed_net_id = 0;
                    dst.claimed_net_id = 0;
                }
                StackAction::Swap { src, dst } => {
                    src.claimed_net_id = 0;
                    dst.claimed_net_id = 0;
                }
                StackAction::Drop { src, .. } | StackAction::Consume { src, .. } => {
                    src.claimed_net_id = 0;
                }
                _ => {}
            }
        }
    }
    out
}

/// Commands the owning connection feeds the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    Open {
        container_id: u8,
        category: ContainerCategory,
        contents: Vec<ItemStack>,
    },
    Batch {
        container_id: u8,
        batch: ItemStackBatch,
    },
    Close {
        container_id: u8,
    },
}

/// Events the loop reports back.
#[derive(Debug)]
pub enum SessionEvent {
    Response {
        container_id: u8,
        response: BatchResponse,
    },
    /// The collaborator layer must broadcast the full inventory snapshot.
    Resync {
        container_id: u8,
    },
    Closed {
        container_id: u8,
    },
}

/// Single-task command loop: batches are serialized, and a batch addressed
/// to a window that closed while it was queued is discarded, never applied.
pub async fn run<S: ClickSink>(
    mut session: Session<S>,
    mut commands: mpsc::Receiver<SessionCommand>,
    events: mpsc::Sender<SessionEvent>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            SessionCommand::Open {
                container_id,
                category,
                contents,
            } => {
                if let Err(err) = session.open_container(container_id, category, contents) {
                    warn!(%err, container_id, "container open failed");
                }
            }
            SessionCommand::Batch {
                container_id,
                batch,
            } => {
                if container_id != session.active_window_id() {
                    debug!(
                        container_id,
                        active = session.active_window_id(),
                        "discarding batch for a window that is no longer open"
                    );
                    let _ = events
                        .send(SessionEvent::Response {
                            container_id,
                            response: BatchResponse::Rejected {
                                kind: mc_bridge_proto::response::RejectKind::Structural,
                            },
                        })
                        .await;
                    continue;
                }
                let response = session.handle_batch(&batch);
                let resync = response.needs_resync();
                let _ = events
                    .send(SessionEvent::Response {
                        container_id,
                        response,
                    })
                    .await;
                if resync {
                    let _ = events.send(SessionEvent::Resync { container_id }).await;
                }
            }
            SessionCommand::Close { container_id } => {
                session.close_container(container_id);
                let _ = events.send(SessionEvent::Closed { container_id }).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_bridge_proto::click::ClickFrame;
    use mc_bridge_proto::request::{ContainerTag, SlotRef, StackAction, StackRequest};
    use mc_bridge_proto::response::RejectKind;

    const STONE: i32 = 1;

    fn items() -> ItemTable {
        let mut table = ItemTable::new();
        table.register("bridge:stone", STONE, 64);
        table
    }

    fn session() -> Session<Vec<ClickFrame>> {
        Session::new(BridgeConfig::default(), items(), RecipeTable::new(), Vec::new())
    }

    fn take(count: u16, src: SlotRef, dst: SlotRef) -> ItemStackBatch {
        ItemStackBatch {
            requests: vec![StackRequest {
                request_id: 1,
                actions: vec![StackAction::Take { count, src, dst }],
                filter_strings: Vec::new(),
            }],
        }
    }

    fn chest_contents(fill: &[(usize, ItemStack)]) -> Vec<ItemStack> {
        let mut contents = vec![ItemStack::empty(); 27];
        for (slot, stack) in fill {
            contents[*slot] = stack.clone();
        }
        contents
    }

    #[test]
    fn accepted_batch_commits_clicks_and_state() {
        let mut session = session();
        session
            .open_container(
                3,
                ContainerCategory::Generic { size: 27 },
                chest_contents(&[(3, ItemStack::new(STONE, 40))]),
            )
            .unwrap();

        let response = session.handle_batch(&take(
            40,
            SlotRef::bare(ContainerTag::LevelEntity, 3),
            SlotRef::bare(ContainerTag::HotbarAndInventory, 9),
        ));
        assert!(response.is_accepted());
        assert_eq!(session.sink.len(), 2);
        assert!(session.sink.iter().all(|f| f.container_id == 3));
        assert!(session.model().get(CanonicalSlot(3)).unwrap().is_empty());
        assert_eq!(session.model().get(CanonicalSlot(27)).unwrap().count, 40);
    }

    #[test]
    fn rejected_batch_sends_nothing_and_changes_nothing() {
        let mut session = session();
        session
            .open_container(
                3,
                ContainerCategory::Generic { size: 27 },
                chest_contents(&[(3, ItemStack::new(STONE, 40))]),
            )
            .unwrap();
        let before_id = session.model().get(CanonicalSlot(3)).unwrap().net_id;

        // Claim a wrong net id: stale state, whole batch rejected.
        let response = session.handle_batch(&take(
            40,
            SlotRef::claiming(ContainerTag::LevelEntity, 3, before_id + 100),
            SlotRef::bare(ContainerTag::Cursor, 0),
        ));
        assert_eq!(
            response,
            BatchResponse::Rejected {
                kind: RejectKind::StaleState
            }
        );
        assert!(response.needs_resync());
        assert!(session.sink.is_empty());
        assert_eq!(session.model().get(CanonicalSlot(3)).unwrap().count, 40);
        assert_eq!(session.model().get(CanonicalSlot(3)).unwrap().net_id, before_id);
    }

    #[test]
    fn lenient_mode_ignores_claims() {
        let mut config = BridgeConfig::default();
        config.behavior.strict_net_ids = false;
        let mut session =
            Session::new(config, items(), RecipeTable::new(), Vec::<ClickFrame>::new());
        session
            .open_container(
                3,
                ContainerCategory::Generic { size: 27 },
                chest_contents(&[(3, ItemStack::new(STONE, 40))]),
            )
            .unwrap();
        let response = session.handle_batch(&take(
            40,
            SlotRef::claiming(ContainerTag::LevelEntity, 3, 9999),
            SlotRef::bare(ContainerTag::Cursor, 0),
        ));
        assert!(response.is_accepted());
    }

    #[test]
    fn oversized_batch_rejected_structurally() {
        let mut session = session();
        let batch = ItemStackBatch {
            requests: (0..40)
                .map(|i| StackRequest {
                    request_id: i,
                    actions: Vec::new(),
                    filter_strings: Vec::new(),
                })
                .collect(),
        };
        assert_eq!(
            session.handle_batch(&batch),
            BatchResponse::Rejected {
                kind: RejectKind::Structural
            }
        );
    }

    #[test]
    fn storage_carries_across_windows() {
        let mut session = session();
        let mut player = vec![ItemStack::empty(); 46];
        player[9] = ItemStack::new(STONE, 13); // first backpack slot
        session.load_player_contents(player).unwrap();

        session
            .open_container(5, ContainerCategory::Generic { size: 27 }, chest_contents(&[]))
            .unwrap();
        // Backpack slot 9 of the player window is canonical 27 in a chest.
        assert_eq!(session.model().get(CanonicalSlot(27)).unwrap().count, 13);

        session.close_container(5);
        assert_eq!(session.active_window_id(), PLAYER_WINDOW_ID);
        assert_eq!(session.model().get(CanonicalSlot(9)).unwrap().count, 13);
    }

    #[test]
    fn wrong_contents_size_is_an_error() {
        let mut session = session();
        let err = session
            .open_container(
                5,
                ContainerCategory::Generic { size: 27 },
                vec![ItemStack::empty(); 9],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::WrongContentsSize {
                expected: 27,
                got: 9
            }
        ));
    }

    #[test]
    fn revision_advances_per_commit() {
        let mut session = session();
        session
            .open_container(
                3,
                ContainerCategory::Generic { size: 27 },
                chest_contents(&[(0, ItemStack::new(STONE, 10))]),
            )
            .unwrap();
        session.handle_batch(&take(
            10,
            SlotRef::bare(ContainerTag::LevelEntity, 0),
            SlotRef::bare(ContainerTag::LevelEntity, 1),
        ));
        session.handle_batch(&take(
            10,
            SlotRef::bare(ContainerTag::LevelEntity, 1),
            SlotRef::bare(ContainerTag::LevelEntity, 2),
        ));
        assert_eq!(session.sink[0].revision, 0);
        assert_eq!(session.sink.last().unwrap().revision, 1);
    }

    #[tokio::test]
    async fn loop_discards_batches_for_closed_windows() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let mut session = session();
        session
            .open_container(
                7,
                ContainerCategory::Generic { size: 27 },
                chest_contents(&[(0, ItemStack::new(STONE, 10))]),
            )
            .unwrap();
        let handle = tokio::spawn(run(session, cmd_rx, event_tx));

        cmd_tx
            .send(SessionCommand::Close { container_id: 7 })
            .await
            .unwrap();
        // Queued after the close: must be discarded, not applied.
        cmd_tx
            .send(SessionCommand::Batch {
                container_id: 7,
                batch: take(
                    10,
                    SlotRef::bare(ContainerTag::LevelEntity, 0),
                    SlotRef::bare(ContainerTag::Cursor, 0),
                ),
            })
            .await
            .unwrap();
        drop(cmd_tx);

        let mut saw_close = false;
        let mut saw_reject = false;
        while let Some(event) = event_rx.recv().await {
            match event {
                SessionEvent::Closed { container_id: 7 } => saw_close = true,
                SessionEvent::Response { response, .. } => {
                    assert!(!response.is_accepted());
                    saw_reject = true;
                }
                _ => {}
            }
        }
        handle.await.unwrap();
        assert!(saw_close);
        assert!(saw_reject);
    }

    #[tokio::test]
    async fn loop_reports_resync_after_stale_claims() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let mut session = session();
        session
            .open_container(
                7,
                ContainerCategory::Generic { size: 27 },
                chest_contents(&[(0, ItemStack::new(STONE, 10))]),
            )
            .unwrap();
        let handle = tokio::spawn(run(session, cmd_rx, event_tx));

        cmd_tx
            .send(SessionCommand::Batch {
                container_id: 7,
                batch: take(
                    10,
                    SlotRef::claiming(ContainerTag::LevelEntity, 0, 4242),
                    SlotRef::bare(ContainerTag::Cursor, 0),
                ),
            })
            .await
            .unwrap();
        drop(cmd_tx);

        let mut saw_resync = false;
        while let Some(event) = event_rx.recv().await {
            if let SessionEvent::Resync { container_id } = event {
                assert_eq!(container_id, 7);
                saw_resync = true;
            }
        }
        handle.await.unwrap();
        assert!(saw_resync);
    }
}
