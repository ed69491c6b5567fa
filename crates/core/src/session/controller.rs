use std::sync::Arc;

use tokio::sync::watch;

use crate::ai::{AnalysisGatewayTrait, AnalysisRequest};
use crate::errors::{Error, Result};
use crate::models::{
    Address, Coordinates, FoodRequest, InventoryItem, LocationInfo, NewInventoryItem, NewOrder,
    NewReport, NewReview, Order, OrderStatus, ProductDraft, ProfileUpdate, QualityCheckRecord,
    RecordId, RegisteredUser, Registration, Report, Review, User,
};
use crate::navigation::{AppMode, Layout, NavigationState, Screen};
use crate::refresh::RefreshCoordinator;
use crate::remote::{DataGatewayTrait, RemoteDataService, RemoteWrite};
use crate::state::{AppState, StateCacheTrait, StateStore};
use crate::sync::{
    PendingSync, PendingSyncRepositoryTrait, RetrySummary, SyncDispatcher, SyncOutcome,
};
use crate::utils::contact::format_phone_number;

/// Label shown after pinning a new address without a name.
const PINNED_LOCATION_LABEL: &str = "Lokasi Terpilih";
const FALLBACK_PARTNER_NAME: &str = "Mitra";
const FALLBACK_RECIPIENT_NAME: &str = "User";
const FALLBACK_DESCRIPTION: &str = "Makanan surplus berkualitas";

/// Reservation form input; the item comes from the reservation handoff.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReservationRequest {
    pub quantity: u32,
    pub total_price: String,
    pub delivery_address: String,
    pub payment_method: String,
}

/// The application's single entry point for screens.
///
/// Owns navigation and the derived mode, and funnels every state mutation
/// through the [`StateStore`]. Backend writes that follow a local change go
/// through the pending-sync outbox and report a [`SyncOutcome`]; failures
/// are surfaced, never rolled back.
pub struct SessionController {
    store: Arc<StateStore>,
    remote: RemoteDataService,
    analysis: Arc<dyn AnalysisGatewayTrait>,
    refresher: Arc<RefreshCoordinator>,
    sync: SyncDispatcher,
    navigation: watch::Sender<NavigationState>,
    mode: watch::Sender<AppMode>,
}

impl SessionController {
    pub fn new(
        cache: Arc<dyn StateCacheTrait>,
        gateway: Arc<dyn DataGatewayTrait>,
        analysis: Arc<dyn AnalysisGatewayTrait>,
        outbox: Arc<dyn PendingSyncRepositoryTrait>,
    ) -> Self {
        let store = Arc::new(StateStore::new(cache));
        let remote = RemoteDataService::new(gateway);
        let refresher = Arc::new(RefreshCoordinator::new(store.clone(), remote.clone()));
        let sync = SyncDispatcher::new(remote.clone(), outbox);
        let (navigation, _) = watch::channel(NavigationState::new());
        let (mode, _) = watch::channel(AppMode::Guest);
        Self {
            store,
            remote,
            analysis,
            refresher,
            sync,
            navigation,
            mode,
        }
    }

    /// Hydrates the cached state, runs the first refresh and, when a user
    /// was restored, moves from the login screen to that user's home.
    ///
    /// Outbox writes left unfinished by a previous run are marked failed
    /// first, so [`retry_failed_syncs`](Self::retry_failed_syncs) picks
    /// them up.
    pub async fn start(&self) -> bool {
        let state = self.store.hydrate().await;
        let mode = state.mode();
        self.mode.send_replace(mode);

        if let Err(err) = self.sync.recover_interrupted().await {
            log::warn!("[Sync] Could not recover interrupted writes: {}", err);
        }

        let refreshed = self.refresher.refresh().await;

        if state.current_user.is_some() && self.current_screen() == Screen::Login {
            self.reset_to(mode.home_screen());
        }
        refreshed
    }

    pub async fn refresh(&self) -> bool {
        self.refresher.refresh().await
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher.is_refreshing()
    }

    pub async fn ping(&self) -> bool {
        self.remote.ping().await
    }

    pub async fn check_email_exists(&self, email: &str) -> bool {
        self.remote.check_email_exists(email).await
    }

    /// Signs in and lands on the role's home screen.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let user = self.remote.login(email, password).await?;
        self.authenticate(user.clone()).await;
        log::info!("Signed in as {} ({})", user.email, user.role.as_wire());
        Ok(user)
    }

    /// Creates an account. Does not sign in.
    pub async fn register(&self, registration: &Registration) -> Result<RegisteredUser> {
        RemoteWrite::register_user(registration)?;
        if self.remote.check_email_exists(&registration.email).await {
            return Err(Error::rejected("Email ini sudah terdaftar."));
        }
        self.remote.register_user(registration).await
    }

    /// Drops the session: state, cache entry and outbox are cleared and the
    /// login screen is shown with an empty back stack.
    pub async fn logout(&self) -> Result<()> {
        let cleared = self.store.clear().await;
        let outbox = self.sync.clear().await;
        self.mode.send_replace(AppMode::Guest);
        self.reset_to(Screen::Login);
        log::info!("Signed out");
        cleared.and(outbox)
    }

    async fn authenticate(&self, user: User) {
        let mode = AppMode::from_role(Some(user.role));
        let changed = match self.store.sign_in(user).await {
            Ok(changed) => changed,
            Err(err) => {
                log::warn!("Signed-in user not persisted: {}", err);
                true
            }
        };
        self.mode.send_replace(mode);
        self.reset_to(mode.home_screen());
        if changed {
            self.refresher.refresh().await;
        }
    }

    pub fn navigate(&self, target: Screen) {
        self.navigation.send_modify(|nav| nav.navigate(target));
    }

    pub fn go_back(&self) -> bool {
        self.navigation.send_if_modified(|nav| nav.go_back())
    }

    pub fn reset_to(&self, target: Screen) {
        self.navigation.send_modify(|nav| nav.reset_to(target));
    }

    /// Bottom-tab and admin-sidebar selection: root screens drop the
    /// drill-down history.
    pub fn select_tab(&self, tab: Screen) {
        self.reset_to(tab);
    }

    pub fn current_screen(&self) -> Screen {
        self.navigation.borrow().current()
    }

    pub fn navigation(&self) -> NavigationState {
        self.navigation.borrow().clone()
    }

    /// Receives every navigation change.
    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.navigation.subscribe()
    }

    pub fn mode(&self) -> AppMode {
        *self.mode.borrow()
    }

    pub fn layout(&self) -> Layout {
        self.mode().layout(self.current_screen())
    }

    pub async fn snapshot(&self) -> Arc<AppState> {
        self.store.snapshot().await
    }

    pub async fn set_location_label(&self, label: &str) -> Result<()> {
        let label = label.trim().to_string();
        if label.is_empty() {
            return Err(Error::validation("Lokasi wajib diisi"));
        }
        self.store
            .update(|state| state.current_location_label = label)
            .await
    }

    /// Hands `item` to the next screen and opens it (detail or form).
    pub async fn select_item(&self, item: InventoryItem, target: Screen) -> Result<()> {
        self.store.stage_reservation(item).await?;
        self.navigate(target);
        Ok(())
    }

    /// Reads and clears the product draft staged for the upload form.
    pub async fn take_product_draft(&self) -> Result<Option<ProductDraft>> {
        self.store.take_product_draft().await
    }

    pub async fn toggle_saved_item(&self, id: &RecordId) -> Result<SyncOutcome> {
        let ids = self
            .store
            .update(|state| {
                state.toggle_saved(id);
                state.saved_item_ids.clone()
            })
            .await?;
        self.sync_saved_items(ids).await
    }

    pub async fn remove_saved_items(&self, ids: &[RecordId]) -> Result<SyncOutcome> {
        let remaining = self
            .store
            .update(|state| {
                state.saved_item_ids.retain(|saved| !ids.contains(saved));
                state.saved_item_ids.clone()
            })
            .await?;
        self.sync_saved_items(remaining).await
    }

    async fn sync_saved_items(&self, ids: Vec<RecordId>) -> Result<SyncOutcome> {
        let Some(user) = self.current_user().await else {
            return Ok(SyncOutcome::LocalOnly);
        };
        let write = RemoteWrite::sync_saved_items(&user.email, &ids)?;
        Ok(self.sync.dispatch(write).await)
    }

    /// Places a reservation for the item in the reservation handoff.
    ///
    /// On success the order is prepended to the history, the item's stock is
    /// decremented (never below zero), the handoff is cleared and the
    /// success screen is shown. On failure the handoff is kept so the form
    /// can retry.
    pub async fn reserve_item(&self, request: &ReservationRequest) -> Result<Order> {
        let user = self.require_user().await?;
        let snapshot = self.store.snapshot().await;
        let item = snapshot
            .handoff
            .reservation_item
            .clone()
            .ok_or_else(|| Error::validation("Tidak ada item yang dipilih"))?;
        if request.quantity == 0 {
            return Err(Error::validation("Jumlah minimal 1"));
        }
        let available = snapshot
            .inventory_item(&item.id)
            .map(|current| current.amount_value)
            .unwrap_or(item.amount_value);
        if request.quantity > available {
            return Err(Error::validation("Stok tidak mencukupi"));
        }

        let new_order = NewOrder {
            partner: item.partner_name.clone(),
            partner_id: String::new(),
            item: item.name.clone(),
            item_id: item.id.clone(),
            quantity: request.quantity,
            unit: item.amount_unit.clone(),
            total_price: request.total_price.clone(),
            delivery_address: request.delivery_address.clone(),
            payment_method: request.payment_method.clone(),
        };
        let receipt = self.remote.create_order(&new_order, &user).await?;

        let order = Order {
            id: receipt.order_id,
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            partner: new_order.partner,
            partner_id: new_order.partner_id,
            item: new_order.item,
            item_id: new_order.item_id,
            quantity: format!("{} {}", request.quantity, item.amount_unit)
                .trim()
                .to_string(),
            status: OrderStatus::Active.as_wire().to_string(),
            pickup_code: receipt.pickup_code,
            total_price: new_order.total_price,
            delivery_address: new_order.delivery_address,
            payment_method: new_order.payment_method,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let quantity = request.quantity;
        let stored = order.clone();
        self.store
            .update(move |state| {
                state.order_history.insert(0, stored);
                if let Some(listed) = state.inventory.iter_mut().find(|i| i.id == item.id) {
                    listed.reserve(quantity);
                }
                state.handoff.reservation_item = None;
            })
            .await?;

        self.navigate(Screen::ReservationSuccess);
        Ok(order)
    }

    pub async fn update_order_status(
        &self,
        order_id: &RecordId,
        status: OrderStatus,
    ) -> Result<SyncOutcome> {
        let user = self.current_user().await;
        let write = RemoteWrite::update_order_status(
            order_id,
            status,
            user.as_ref().map(|u| u.email.as_str()),
        )?;
        let found = self
            .store
            .update(|state| {
                let Some(order) = state.order_history.iter_mut().find(|o| &o.id == order_id)
                else {
                    return false;
                };
                order.status = status.as_wire().to_string();
                true
            })
            .await?;
        if !found {
            log::warn!("Order {} not in local history; sending status anyway", order_id);
        }
        Ok(self.sync.dispatch(write).await)
    }

    pub async fn submit_review(&self, input: NewReview) -> Result<(Review, SyncOutcome)> {
        let user = self.require_user().await?;
        let now = chrono::Utc::now();
        let review = Review {
            id: RecordId::from(now.timestamp_millis().to_string()),
            order_id: input.order_id,
            partner_name: input.partner_name,
            product_name: input.product_name,
            user: user.name,
            user_email: user.email,
            rating: input.rating,
            comment: input.comment.trim().to_string(),
            date: now.format("%d/%m/%Y").to_string(),
            extra: Default::default(),
        };
        let write = RemoteWrite::submit_review(&review)?;

        let stored = review.clone();
        self.store
            .update(move |state| state.reviews.insert(0, stored))
            .await?;
        let outcome = self.sync.dispatch(write).await;
        Ok((review, outcome))
    }

    /// Rewrites a review on this device. The backend has no edit action, so
    /// the change stays local.
    pub async fn edit_review(
        &self,
        review_id: &RecordId,
        rating: u32,
        comment: &str,
    ) -> Result<SyncOutcome> {
        if !(1..=5).contains(&rating) {
            return Err(Error::validation("Rating harus antara 1 dan 5"));
        }
        let comment = comment.trim().to_string();
        let found = self
            .store
            .update(|state| {
                let Some(review) = state.reviews.iter_mut().find(|r| &r.id == review_id) else {
                    return false;
                };
                review.rating = rating;
                review.comment = comment;
                review.date = "Baru saja".to_string();
                true
            })
            .await?;
        if !found {
            return Err(Error::validation("Ulasan tidak ditemukan"));
        }
        Ok(SyncOutcome::LocalOnly)
    }

    pub async fn submit_report(&self, input: NewReport) -> Result<SyncOutcome> {
        let reporter = self
            .current_user()
            .await
            .map(|user| user.email)
            .unwrap_or_else(|| "Guest".to_string());
        let mut report = Report {
            reporter_email: reporter,
            report_type: input.report_type.unwrap_or_default(),
            title: input.title.unwrap_or_default(),
            reason: input.reason,
            description: input.description.trim().to_string(),
            date: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        };
        if let Some(target) = input.target_item_id {
            report
                .extra
                .insert("itemId".to_string(), serde_json::Value::from(target.as_str()));
        }
        let write = RemoteWrite::submit_report(&report)?;
        Ok(self.sync.dispatch(write).await)
    }

    pub async fn create_request(&self, request: &FoodRequest) -> Result<SyncOutcome> {
        let email = self
            .current_user()
            .await
            .map(|user| user.email)
            .unwrap_or_default();
        let write = RemoteWrite::create_request(&email, request)?;
        Ok(self.sync.dispatch(write).await)
    }

    /// Adds an address at the front of the list and makes it the current
    /// location. Only synced when signed in.
    pub async fn save_address(&self, mut address: Address) -> Result<SyncOutcome> {
        if address.address.trim().is_empty() {
            return Err(Error::validation("Alamat wajib diisi"));
        }
        if address.id.is_empty() {
            address.id = RecordId::from(chrono::Utc::now().timestamp_millis().to_string());
        }
        let user = self.current_user().await;
        let write = match &user {
            Some(user) => Some(RemoteWrite::save_address(&address, &user.email)?),
            None => None,
        };

        if address.label.trim().is_empty() {
            address.label = PINNED_LOCATION_LABEL.to_string();
        }
        let label = address.label.clone();
        self.store
            .update(move |state| {
                state.addresses.insert(0, address);
                state.current_location_label = label;
            })
            .await?;

        match write {
            Some(write) => Ok(self.sync.dispatch(write).await),
            None => Ok(SyncOutcome::LocalOnly),
        }
    }

    /// Places matching `query`; empty when the lookup fails.
    pub async fn search_locations(
        &self,
        query: &str,
        near: Option<Coordinates>,
    ) -> Vec<LocationInfo> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        match self.analysis.search_locations(query, near).await {
            Ok(places) => places,
            Err(err) => {
                log::warn!("Location search failed: {}", err);
                Vec::new()
            }
        }
    }

    /// Describes the device position. Falls back to the bare coordinates
    /// when the lookup fails.
    pub async fn locate(&self, at: Coordinates) -> LocationInfo {
        match self.analysis.locate(at).await {
            Ok(place) => place,
            Err(err) => {
                log::warn!("Location lookup failed: {}", err);
                LocationInfo::unresolved(at)
            }
        }
    }

    /// Saves a looked-up place as a pinned address and makes it the current
    /// location.
    pub async fn pin_location(&self, place: &LocationInfo) -> Result<SyncOutcome> {
        let (name, phone) = match self.current_user().await {
            Some(user) if !user.name.trim().is_empty() => (user.name, user.phone),
            Some(user) => (FALLBACK_RECIPIENT_NAME.to_string(), user.phone),
            None => (FALLBACK_RECIPIENT_NAME.to_string(), String::new()),
        };
        self.save_address(place.to_address(&name, &phone)).await
    }

    /// Makes a saved address the current location and leaves the picker.
    pub async fn choose_address(&self, id: &RecordId) -> Result<()> {
        let label = self
            .store
            .snapshot()
            .await
            .addresses
            .iter()
            .find(|address| &address.id == id)
            .map(|address| address.label.clone())
            .ok_or_else(|| Error::validation("Alamat tidak ditemukan"))?;
        self.set_location_label(&label).await?;
        self.go_back();
        Ok(())
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(User, SyncOutcome)> {
        let mut user = self.require_user().await?;
        if update.name.trim().is_empty() {
            return Err(Error::validation("Nama wajib diisi"));
        }
        user.name = update.name.trim().to_string();
        user.phone = format_phone_number(update.phone.trim());
        user.avatar = update.avatar;
        user.address = update.address.trim().to_string();
        user.owner_name = update.owner_name.trim().to_string();
        let write = RemoteWrite::update_profile(&user)?;

        self.store.sign_in(user.clone()).await?;
        let outcome = self.sync.dispatch(write).await;
        Ok((user, outcome))
    }

    /// Lists a product.
    ///
    /// A product backed by an AI verdict must pass the quality gate. The
    /// listing only appears locally once the backend has assigned it an id.
    pub async fn add_inventory(&self, mut item: NewInventoryItem) -> Result<InventoryItem> {
        if let Some(verdict) = &item.quality {
            if !verdict.is_qualified() {
                return Err(Error::validation(format!(
                    "Produk belum memenuhi standar kualitas ({}%, {})",
                    verdict.quality_percentage,
                    if verdict.is_halal { "halal" } else { "non-halal" }
                )));
            }
        }
        if item.amount_value == 0 {
            return Err(Error::validation("Mohon lengkapi data produk"));
        }
        if item.description.trim().is_empty() {
            item.description = FALLBACK_DESCRIPTION.to_string();
        }
        let partner_name = self
            .current_user()
            .await
            .map(|user| user.name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_PARTNER_NAME.to_string());

        let id = self.remote.add_inventory(&item, &partner_name).await?;
        let listed = item.into_item(id, &partner_name);

        let stored = listed.clone();
        self.store
            .update(move |state| {
                state.inventory.insert(0, stored);
                state.handoff.product_draft = None;
            })
            .await?;
        self.navigate(Screen::Success);
        Ok(listed)
    }

    /// Removes a listing locally right away, then tells the backend. Saved
    /// ids pointing at it are left alone; they are filtered when read.
    pub async fn delete_inventory(&self, id: &RecordId) -> Result<SyncOutcome> {
        let write = RemoteWrite::delete_inventory(id)?;
        self.store
            .update(|state| {
                state.inventory.retain(|item| &item.id != id);
            })
            .await?;
        Ok(self.sync.dispatch(write).await)
    }

    /// Analyses a photo, records the check and logs it to the backend.
    pub async fn run_quality_check(
        &self,
        request: &AnalysisRequest,
    ) -> Result<(QualityCheckRecord, SyncOutcome)> {
        if request.image_jpeg.is_empty() {
            return Err(Error::validation("Foto wajib diisi"));
        }
        let analysis = self.analysis.analyze_food_quality(request).await?;
        let now = chrono::Utc::now();
        let record = QualityCheckRecord {
            id: now.timestamp_millis().to_string(),
            analysis,
            image_data_url: request.data_url(),
            timestamp: now.to_rfc3339(),
        };

        let stored = record.clone();
        self.store
            .update(move |state| state.quality_check_history.insert(0, stored))
            .await?;

        let partner_name = self
            .current_user()
            .await
            .map(|user| user.name)
            .unwrap_or_default();
        let write = RemoteWrite::log_quality_check(&record.analysis, &partner_name);
        let outcome = self.sync.dispatch(write).await;
        Ok((record, outcome))
    }

    /// Prefills the upload form from a safe quality check and opens it.
    pub async fn stage_product_draft(&self, record: &QualityCheckRecord) -> Result<ProductDraft> {
        if !record.analysis.is_safe {
            return Err(Error::validation("Produk tidak aman untuk dijual"));
        }
        let draft = record.to_product_draft();
        self.store.stage_product_draft(draft.clone()).await?;
        self.navigate(Screen::UploadProduct);
        Ok(draft)
    }

    /// Comma-joined ingredients seen in the photo; empty when the analysis
    /// fails.
    pub async fn detect_ingredients(&self, image_jpeg: &[u8]) -> String {
        match self.analysis.detect_ingredients(image_jpeg).await {
            Ok(ingredients) => ingredients,
            Err(err) => {
                log::warn!("Ingredient detection failed: {}", err);
                String::new()
            }
        }
    }

    pub async fn retry_failed_syncs(&self) -> Result<RetrySummary> {
        self.sync.retry_failed().await
    }

    pub async fn failed_syncs(&self) -> Result<Vec<PendingSync>> {
        self.sync.failed().await
    }

    async fn current_user(&self) -> Option<User> {
        self.store.snapshot().await.current_user.clone()
    }

    async fn require_user(&self) -> Result<User> {
        self.current_user()
            .await
            .ok_or_else(|| Error::validation("Silakan login terlebih dahulu"))
    }
}
