use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::errors::Result;
use crate::models::{HistoryLookup, Role, User};
use crate::remote::RemoteDataService;
use crate::state::{AppState, StateStore};

/// Pulls backend data into the [`StateStore`].
///
/// A cycle runs in two stages. The public inventory and reviews are fetched
/// together first; then, for a signed-in user, order history, notifications
/// and the role's own slots are fetched together. Each slot is written
/// through to the cache as soon as it arrives. A failed fetch leaves its
/// slot untouched. All writes are tagged with the session epoch seen at the
/// start of the cycle, so responses that land after a logout or account
/// switch are dropped.
pub struct RefreshCoordinator {
    store: Arc<StateStore>,
    remote: RemoteDataService,
    in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RefreshCoordinator {
    pub fn new(store: Arc<StateStore>, remote: RemoteDataService) -> Self {
        Self {
            store,
            remote,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// True while any refresh cycle is running.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Runs one cycle. Returns `false` only when the cycle could not run to
    /// completion (a state write failed); individual failed fetches do not
    /// count.
    pub async fn refresh(&self) -> bool {
        let _in_flight = InFlight::enter(&self.in_flight);
        let started = Instant::now();

        match self.run_cycle().await {
            Ok(()) => {
                log::info!(
                    "[Refresh] Cycle complete in {} ms",
                    started.elapsed().as_millis()
                );
                true
            }
            Err(err) => {
                log::error!("[Refresh] Cycle aborted: {}", err);
                false
            }
        }
    }

    async fn run_cycle(&self) -> Result<()> {
        let epoch = self.store.epoch();
        let user = self.store.snapshot().await.current_user.clone();

        let (inventory, reviews) = futures::join!(
            self.remote.fetch_inventory(),
            self.remote.fetch_reviews()
        );
        futures::try_join!(
            self.apply(epoch, "inventory", inventory, |state, rows| state.inventory = rows),
            self.apply(epoch, "reviews", reviews, |state, rows| state.reviews = rows),
        )?;

        let Some(user) = user else {
            return Ok(());
        };

        futures::try_join!(
            self.refresh_history(epoch, &user),
            self.refresh_notifications(epoch, &user),
            self.refresh_role_slots(epoch, &user),
        )?;
        Ok(())
    }

    async fn refresh_history(&self, epoch: u64, user: &User) -> Result<()> {
        let lookup = HistoryLookup::for_user(user);
        let history = self.remote.fetch_history(&lookup).await;
        self.apply(epoch, "history", history, |state, rows| {
            state.order_history = rows
        })
        .await
    }

    async fn refresh_notifications(&self, epoch: u64, user: &User) -> Result<()> {
        let notifications = self.remote.fetch_notifications(&user.email).await;
        self.apply(epoch, "notifications", notifications, |state, rows| {
            state.notifications = rows
        })
        .await
    }

    async fn refresh_role_slots(&self, epoch: u64, user: &User) -> Result<()> {
        match user.role {
            Role::Recipient => {
                futures::try_join!(
                    async {
                        let rows = self.remote.fetch_addresses(&user.email).await;
                        self.apply(epoch, "addresses", rows, |state, rows| {
                            state.addresses = rows
                        })
                        .await
                    },
                    async {
                        let rows = self.remote.fetch_saved_items(&user.email).await;
                        self.apply(epoch, "saved items", rows, |state, rows| {
                            state.saved_item_ids = rows
                        })
                        .await
                    },
                )?;
            }
            Role::Admin => {
                futures::try_join!(
                    async {
                        let rows = self.remote.fetch_reports().await;
                        self.apply(epoch, "reports", rows, |state, rows| state.reports = rows)
                            .await
                    },
                    async {
                        let rows = self.remote.fetch_all_users().await;
                        self.apply(epoch, "users", rows, |state, rows| state.all_users = rows)
                            .await
                    },
                )?;
            }
            Role::Partner => {}
        }
        Ok(())
    }

    async fn apply<T, F>(&self, epoch: u64, slot: &str, rows: Option<T>, write: F) -> Result<()>
    where
        F: FnOnce(&mut AppState, T),
    {
        let Some(rows) = rows else {
            log::warn!("[Refresh] {} fetch failed; keeping cached value", slot);
            return Ok(());
        };
        let applied = self
            .store
            .update_for_session(epoch, |state| write(state, rows))
            .await?;
        if applied.is_none() {
            log::warn!("[Refresh] Discarded {} response from a previous session", slot);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::models::{InventoryItem, RecordId};
    use crate::remote::Envelope;
    use crate::state::{MemoryStateCache, StateCacheTrait};
    use crate::test_support::FakeGateway;
    use async_trait::async_trait;
    use serde_json::json;

    fn coordinator(gateway: Arc<FakeGateway>) -> (RefreshCoordinator, Arc<StateStore>) {
        let store = Arc::new(StateStore::new(Arc::new(MemoryStateCache::new())));
        let coordinator = RefreshCoordinator::new(store.clone(), RemoteDataService::new(gateway));
        (coordinator, store)
    }

    fn user(role: Role) -> User {
        User {
            id: "u-1".to_string(),
            name: "Warung Bu Sri".to_string(),
            email: "sri@mail.com".to_string(),
            role,
            ..Default::default()
        }
    }

    fn items(count: usize) -> Vec<InventoryItem> {
        (0..count)
            .map(|i| InventoryItem {
                id: RecordId::from(i as u64),
                name: format!("Item {}", i),
                ..Default::default()
            })
            .collect()
    }

    async fn script_everything(gateway: &FakeGateway) {
        gateway
            .on_fetch(
                "get_inventory",
                Envelope::ok().with_data(json!([{"id": 1, "name": "Nasi", "amount": "2 Porsi"}])),
            )
            .await;
        gateway
            .on_fetch("get_reviews", Envelope::ok().with_data(json!([{"id": 1, "rating": 5}])))
            .await;
        gateway
            .on_fetch("get_history", Envelope::ok().with_data(json!([{"id": "ORD-1"}])))
            .await;
        gateway
            .on_fetch("get_notifications", Envelope::ok().with_data(json!([{"id": 1}])))
            .await;
        gateway
            .on_fetch("get_addresses", Envelope::ok().with_data(json!([{"id": 1, "address": "Jl. A"}])))
            .await;
        gateway
            .on_fetch("get_saved_items", Envelope::ok().with_data(json!([1])))
            .await;
        gateway
            .on_fetch("get_reports", Envelope::ok().with_data(json!([{"id": 1}])))
            .await;
        gateway
            .on_fetch("get_all_users", Envelope::ok().with_data(json!([{"id": 9, "name": "X"}])))
            .await;
    }

    #[tokio::test]
    async fn failed_inventory_fetch_keeps_cached_items() {
        let gateway = FakeGateway::new();
        gateway
            .on_fetch("get_inventory", Envelope::failure("offline"))
            .await;
        gateway
            .on_fetch("get_reviews", Envelope::ok().with_data(json!([])))
            .await;
        let (coordinator, store) = coordinator(gateway);
        store.update(|state| state.inventory = items(4)).await.unwrap();

        assert!(coordinator.refresh().await);
        assert_eq!(store.snapshot().await.inventory.len(), 4);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn signed_out_refresh_only_touches_public_slots() {
        let gateway = FakeGateway::new();
        script_everything(&gateway).await;
        let (coordinator, store) = coordinator(gateway.clone());

        assert!(coordinator.refresh().await);
        let state = store.snapshot().await;
        assert_eq!(state.inventory.len(), 1);
        assert_eq!(state.inventory[0].amount_value, 2);
        assert_eq!(state.reviews.len(), 1);
        assert!(state.order_history.is_empty());
        assert!(gateway.fetched("get_history").await.is_empty());
    }

    #[tokio::test]
    async fn recipient_refresh_never_fills_admin_slots() {
        let gateway = FakeGateway::new();
        script_everything(&gateway).await;
        let (coordinator, store) = coordinator(gateway.clone());
        store.sign_in(user(Role::Recipient)).await.unwrap();

        assert!(coordinator.refresh().await);
        let state = store.snapshot().await;
        assert_eq!(state.addresses.len(), 1);
        assert_eq!(state.saved_item_ids, vec![RecordId::from("1")]);
        assert_eq!(state.order_history.len(), 1);
        assert_eq!(state.notifications.len(), 1);
        assert!(state.reports.is_empty());
        assert!(state.all_users.is_empty());

        let history = gateway.fetched("get_history").await;
        assert_eq!(
            history[0],
            vec![
                ("role".to_string(), "USER".to_string()),
                ("identifier".to_string(), "sri@mail.com".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn partner_history_is_keyed_by_display_name() {
        let gateway = FakeGateway::new();
        script_everything(&gateway).await;
        let (coordinator, store) = coordinator(gateway.clone());
        store.sign_in(user(Role::Partner)).await.unwrap();

        assert!(coordinator.refresh().await);
        let history = gateway.fetched("get_history").await;
        assert_eq!(history[0][1].1, "Warung Bu Sri");

        let state = store.snapshot().await;
        assert!(state.addresses.is_empty());
        assert!(state.reports.is_empty());
        assert!(gateway.fetched("get_addresses").await.is_empty());
    }

    #[tokio::test]
    async fn admin_refresh_fills_reports_and_users() {
        let gateway = FakeGateway::new();
        script_everything(&gateway).await;
        let (coordinator, store) = coordinator(gateway.clone());
        store.sign_in(user(Role::Admin)).await.unwrap();

        assert!(coordinator.refresh().await);
        let state = store.snapshot().await;
        assert_eq!(state.reports.len(), 1);
        assert_eq!(state.all_users.len(), 1);
        assert!(state.addresses.is_empty());
        assert!(gateway.fetched("get_saved_items").await.is_empty());
    }

    #[tokio::test]
    async fn responses_after_logout_are_discarded() {
        let gateway = FakeGateway::new();
        script_everything(&gateway).await;
        let release = gateway.hold("get_history").await;
        let (coordinator, store) = coordinator(gateway.clone());
        store.sign_in(user(Role::Recipient)).await.unwrap();

        let coordinator = Arc::new(coordinator);
        let running = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.refresh().await })
        };

        // Wait until the cycle is parked on the history fetch.
        while gateway.fetched("get_history").await.is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(coordinator.is_refreshing());
        store.clear().await.unwrap();
        release.notify_one();

        assert!(running.await.unwrap());
        assert_eq!(*store.snapshot().await, AppState::default());
        assert!(!coordinator.is_refreshing());
    }

    struct BrokenCache;

    #[async_trait]
    impl StateCacheTrait for BrokenCache {
        async fn load(&self) -> Result<Option<String>> {
            Ok(None)
        }
        async fn save(&self, _blob: String) -> Result<()> {
            Err(Error::storage("read-only"))
        }
        async fn remove(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn persist_failure_reports_false() {
        let gateway = FakeGateway::new();
        script_everything(&gateway).await;
        let store = Arc::new(StateStore::new(Arc::new(BrokenCache)));
        let coordinator = RefreshCoordinator::new(store, RemoteDataService::new(gateway));

        assert!(!coordinator.refresh().await);
        assert!(!coordinator.is_refreshing());
    }
}
