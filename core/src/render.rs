//! Render-layer seam: the on-screen list of message nodes, addressed by the
//! message's log index.

use std::collections::BTreeSet;
use std::collections::HashMap;

use tokio::sync::oneshot;

/// Outcome of one asset load. Failures still count as completed.
pub type AssetLoadResult = Result<(), String>;

/// Completion handle of an asset load (an image, typically) started by
/// materializing a node.
#[derive(Debug)]
pub struct AssetLoad {
    rx: oneshot::Receiver<AssetLoadResult>,
}

impl AssetLoad {
    /// Creates a load that completes when the returned sender fires. Dropping
    /// the sender completes it as a failure.
    pub fn pending() -> (oneshot::Sender<AssetLoadResult>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    pub(crate) async fn wait(self) -> AssetLoadResult {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err("asset load was abandoned".to_string()),
        }
    }
}

/// Operations the render window and the hidden-marker sync need from the
/// host's list view.
pub trait RenderLayer {
    /// Removes every materialized node.
    fn clear(&mut self);

    /// Materializes `key` after the current last node.
    fn append(&mut self, key: usize);

    /// Materializes `key` directly before the node keyed `anchor`.
    fn insert_before(&mut self, anchor: usize, key: usize);

    fn remove(&mut self, key: usize);

    /// Shifts every key above `removed` down by one after a log deletion.
    fn renumber_after(&mut self, removed: usize);

    /// Toggles the cosmetic hidden marker. Keys that are not materialized are
    /// ignored.
    fn set_hidden_marker(&mut self, key: usize, hidden: bool);

    /// Drains the asset loads started by materialization since the last call.
    fn take_pending_asset_loads(&mut self) -> Vec<AssetLoad>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNode {
    pub key: usize,
    pub hidden_marker: bool,
}

/// In-memory [`RenderLayer`].
///
/// Keys registered with [`RenderList::mark_has_asset`] start an asset load
/// each time they are materialized; tests finish them with
/// [`RenderList::complete_asset`]. Dropping a node abandons its load, which
/// then completes as a failure.
#[derive(Debug, Default)]
pub struct RenderList {
    nodes: Vec<RenderedNode>,
    asset_keys: BTreeSet<usize>,
    loading: HashMap<usize, oneshot::Sender<AssetLoadResult>>,
    pending: Vec<AssetLoad>,
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_has_asset(&mut self, key: usize) {
        self.asset_keys.insert(key);
    }

    /// Finishes the in-flight load of `key`. Returns `false` when nothing was
    /// loading for it.
    pub fn complete_asset(&mut self, key: usize, result: AssetLoadResult) -> bool {
        match self.loading.remove(&key) {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    pub fn keys(&self) -> Vec<usize> {
        self.nodes.iter().map(|node| node.key).collect()
    }

    pub fn node(&self, key: usize) -> Option<&RenderedNode> {
        self.nodes.iter().find(|node| node.key == key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn materialize(&mut self, key: usize) -> RenderedNode {
        if self.asset_keys.contains(&key) {
            let (tx, load) = AssetLoad::pending();
            self.loading.insert(key, tx);
            self.pending.push(load);
        }
        RenderedNode {
            key,
            hidden_marker: false,
        }
    }
}

impl RenderLayer for RenderList {
    fn clear(&mut self) {
        self.nodes.clear();
        self.loading.clear();
        self.pending.clear();
    }

    fn append(&mut self, key: usize) {
        let node = self.materialize(key);
        self.nodes.push(node);
    }

    fn insert_before(&mut self, anchor: usize, key: usize) {
        let position = self
            .nodes
            .iter()
            .position(|node| node.key == anchor)
            .unwrap_or(0);
        let node = self.materialize(key);
        self.nodes.insert(position, node);
    }

    fn remove(&mut self, key: usize) {
        self.nodes.retain(|node| node.key != key);
        self.loading.remove(&key);
    }

    fn renumber_after(&mut self, removed: usize) {
        let shift = |key: usize| if key > removed { key - 1 } else { key };
        for node in &mut self.nodes {
            node.key = shift(node.key);
        }
        self.asset_keys = self
            .asset_keys
            .iter()
            .filter(|key| **key != removed)
            .map(|key| shift(*key))
            .collect();
        self.loading = std::mem::take(&mut self.loading)
            .into_iter()
            .map(|(key, tx)| (shift(key), tx))
            .collect();
    }

    fn set_hidden_marker(&mut self, key: usize, hidden: bool) {
        if let Some(node) = self.nodes.iter_mut().find(|node| node.key == key) {
            node.hidden_marker = hidden;
        }
    }

    fn take_pending_asset_loads(&mut self) -> Vec<AssetLoad> {
        std::mem::take(&mut self.pending)
    }
}
