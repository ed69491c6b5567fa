use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::{decode_state, encode_state, AppState, StateCacheTrait};
use crate::errors::Result;
use crate::models::{InventoryItem, ProductDraft, User};

/// Owner of the in-memory [`AppState`] and its persisted mirror.
///
/// Reads hand out cheap `Arc` snapshots. Every mutation goes through one
/// write gate, replaces the snapshot and then rewrites the whole blob in the
/// cache, so two writers can never interleave partial blobs.
///
/// The store also tracks a session epoch. It is bumped whenever the signed-in
/// identity changes or the state is cleared; writes tagged with an older
/// epoch are discarded.
pub struct StateStore {
    cache: Arc<dyn StateCacheTrait>,
    current: RwLock<Arc<AppState>>,
    write_gate: Mutex<()>,
    epoch: AtomicU64,
}

impl StateStore {
    pub fn new(cache: Arc<dyn StateCacheTrait>) -> Self {
        Self {
            cache,
            current: RwLock::new(Arc::new(AppState::default())),
            write_gate: Mutex::new(()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Loads the cached blob into memory, falling back to the default state
    /// when it is missing or unreadable. Never fails.
    pub async fn hydrate(&self) -> Arc<AppState> {
        let _gate = self.write_gate.lock().await;
        let state = match self.cache.load().await {
            Ok(Some(blob)) => match decode_state(&blob) {
                Ok(state) => {
                    log::info!("[StateStore] Hydrated state from cache");
                    state
                }
                Err(err) => {
                    log::warn!("[StateStore] Ignoring unreadable cached state: {}", err);
                    AppState::default()
                }
            },
            Ok(None) => {
                log::debug!("[StateStore] No cached state; starting empty");
                AppState::default()
            }
            Err(err) => {
                log::warn!("[StateStore] Cache load failed: {}", err);
                AppState::default()
            }
        };
        let state = Arc::new(state);
        *self.current.write().await = state.clone();
        state
    }

    /// Current state snapshot.
    pub async fn snapshot(&self) -> Arc<AppState> {
        self.current.read().await.clone()
    }

    /// Epoch of the current session.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Applies `mutate` and persists the full state.
    ///
    /// The in-memory state is replaced even when persisting fails; the error
    /// is returned so the caller can report it.
    pub async fn update<F, R>(&self, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut AppState) -> R,
    {
        let _gate = self.write_gate.lock().await;
        self.apply(mutate).await
    }

    /// Like [`update`](Self::update) but only when `epoch` still names the
    /// current session. Returns `Ok(None)` for a stale write.
    pub async fn update_for_session<F, R>(&self, epoch: u64, mutate: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut AppState) -> R,
    {
        let _gate = self.write_gate.lock().await;
        if self.epoch() != epoch {
            log::warn!(
                "[StateStore] Discarding write for stale session epoch {} (current {})",
                epoch,
                self.epoch()
            );
            return Ok(None);
        }
        self.apply(mutate).await.map(Some)
    }

    /// Installs the signed-in user. An identity change resets the
    /// role-scoped slots and starts a new session epoch.
    ///
    /// Returns whether the identity changed.
    pub async fn sign_in(&self, user: User) -> Result<bool> {
        let _gate = self.write_gate.lock().await;
        let mut changed = false;
        let result = self
            .apply(|state| {
                changed = state.sign_in(user);
            })
            .await;
        if changed {
            self.epoch.fetch_add(1, Ordering::SeqCst);
        }
        result.map(|_| changed)
    }

    /// Resets memory to the default state and deletes the cache entry.
    pub async fn clear(&self) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.current.write().await = Arc::new(AppState::default());
        self.cache.remove().await?;
        log::info!("[StateStore] Cleared state and cache entry");
        Ok(())
    }

    pub async fn stage_reservation(&self, item: InventoryItem) -> Result<()> {
        self.update(|state| state.handoff.reservation_item = Some(item))
            .await
    }

    /// Reads and clears the reservation handoff.
    pub async fn take_reservation(&self) -> Result<Option<InventoryItem>> {
        self.update(|state| state.handoff.reservation_item.take())
            .await
    }

    pub async fn stage_product_draft(&self, draft: ProductDraft) -> Result<()> {
        self.update(|state| state.handoff.product_draft = Some(draft))
            .await
    }

    /// Reads and clears the product-draft handoff.
    pub async fn take_product_draft(&self) -> Result<Option<ProductDraft>> {
        self.update(|state| state.handoff.product_draft.take())
            .await
    }

    async fn apply<F, R>(&self, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut AppState) -> R,
    {
        let mut next = self.snapshot().await.as_ref().clone();
        let out = mutate(&mut next);
        let blob = encode_state(&next)?;
        *self.current.write().await = Arc::new(next);

        if let Err(err) = self.cache.save(blob).await {
            log::error!("[StateStore] Failed to persist state: {}", err);
            return Err(err);
        }
        Ok(out)
    }
}
