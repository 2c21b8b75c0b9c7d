use std::sync::RwLock;

use tokio::sync::broadcast;
use vulndex_model::VulnerabilityRow;

use crate::server::SharedState;

/// Bounded length of the live feed.
pub const FEED_CAPACITY: usize = 20;

/// In-memory feed of the most recently stored rows.
///
/// Insertions apply in arrival order; an incoming row supersedes an existing
/// row with the same id instead of duplicating it, and the list never grows
/// past [`FEED_CAPACITY`].
pub struct Feed {
    items: RwLock<Vec<VulnerabilityRow>>,
    realtime: bool,
}

impl Feed {
    pub fn new(realtime: bool) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            realtime,
        }
    }

    /// Whether insertion events reach this feed at all. Without realtime
    /// credentials the feed only ever shows its bootstrap contents.
    pub fn realtime(&self) -> bool {
        self.realtime
    }

    /// Replace the feed with rows read from the store at startup.
    pub fn bootstrap(&self, mut rows: Vec<VulnerabilityRow>) {
        rows.truncate(FEED_CAPACITY);
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        *items = rows;
    }

    pub fn apply_insert(&self, row: VulnerabilityRow) {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.retain(|existing| existing.id != row.id);
        items.insert(0, row);
        items.truncate(FEED_CAPACITY);
    }

    pub fn snapshot(&self) -> Vec<VulnerabilityRow> {
        self.items.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Apply insertion events to the feed in arrival order.
pub async fn pump(state: SharedState, mut events: broadcast::Receiver<VulnerabilityRow>) {
    loop {
        match events.recv().await {
            Ok(row) => state.feed.apply_insert(row),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("Live feed lagged, skipped {skipped} events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
