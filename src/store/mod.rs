//! Local record store: the single owner of users, products, orders and
//! tickets. Every mutation rewrites the full collection snapshot in the
//! key-value backend; every operation resolves after the configured latency.

pub mod credentials;
pub mod latency;
pub mod model;
pub mod seed;

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::storage::{KvError, KvStore};
use credentials::{password_matches, PasswordScheme};
use latency::Latency;
use model::{
    Order, OrderStatus, Product, ProductPatch, Ticket, TicketPriority, TicketStatus, User,
    UserStatus,
};

pub const DEFAULT_NAMESPACE: &str = "tallypro";
pub const DEFAULT_DELAY: Duration = Duration::from_millis(600);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] KvError),

    #[error("snapshot {key} is unreadable: {source}")]
    Snapshot {
        key: String,
        source: serde_json::Error,
    },

    #[error("snapshot {key} could not be encoded: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },

    #[error("credential error: {0}")]
    Credential(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Users,
    Products,
    Orders,
    Tickets,
}

impl Collection {
    fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Products => "products",
            Collection::Orders => "orders",
            Collection::Tickets => "tickets",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub namespace: String,
    pub latency: Latency,
    pub scheme: PasswordScheme,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            latency: Latency::new(DEFAULT_DELAY),
            scheme: PasswordScheme::Argon2,
        }
    }
}

struct Collections {
    users: Vec<User>,
    products: Vec<Product>,
    orders: Vec<Order>,
    tickets: Vec<Ticket>,
}

pub struct RecordStore {
    kv: Arc<dyn KvStore>,
    namespace: String,
    latency: Latency,
    scheme: PasswordScheme,
    data: Mutex<Collections>,
}

fn snapshot_key(namespace: &str, c: Collection) -> String {
    format!("{}_{}", namespace, c.name())
}

fn write_snapshot<T: Serialize>(
    kv: &dyn KvStore,
    key: &str,
    items: &[T],
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(items).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    kv.set(key, &bytes)?;
    Ok(())
}

fn load_or_seed<T, F>(kv: &dyn KvStore, key: &str, seed: F) -> Result<Vec<T>, StoreError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<Vec<T>, StoreError>,
{
    if let Some(bytes) = kv.get(key)? {
        let items: Vec<T> = serde_json::from_slice(&bytes).map_err(|source| {
            StoreError::Snapshot {
                key: key.to_string(),
                source,
            }
        })?;
        debug!(key, count = items.len(), "snapshot loaded");
        return Ok(items);
    }

    let items = seed()?;
    write_snapshot(kv, key, &items)?;
    info!(key, count = items.len(), "collection seeded");
    Ok(items)
}

/// 9-character lowercase id, optionally prefixed (`ord_`, `tkt_`).
pub fn new_id(prefix: &str) -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &raw[..9])
}

impl RecordStore {
    /// Loads every collection from `kv`, seeding the ones that were never
    /// written.
    pub fn open(kv: Arc<dyn KvStore>, options: StoreOptions) -> Result<Self, StoreError> {
        let StoreOptions {
            namespace,
            latency,
            scheme,
        } = options;

        let users = load_or_seed(&*kv, &snapshot_key(&namespace, Collection::Users), || {
            seed::users(scheme).map_err(|e| StoreError::Credential(e.to_string()))
        })?;
        let products =
            load_or_seed(&*kv, &snapshot_key(&namespace, Collection::Products), || {
                Ok(seed::products())
            })?;
        let orders = load_or_seed(&*kv, &snapshot_key(&namespace, Collection::Orders), || {
            Ok(seed::orders())
        })?;
        let tickets = load_or_seed(&*kv, &snapshot_key(&namespace, Collection::Tickets), || {
            Ok(seed::tickets())
        })?;

        info!(
            namespace = %namespace,
            delay_ms = latency.delay().as_millis() as u64,
            users = users.len(),
            products = products.len(),
            orders = orders.len(),
            tickets = tickets.len(),
            "record store ready"
        );

        Ok(Self {
            kv,
            namespace,
            latency,
            scheme,
            data: Mutex::new(Collections {
                users,
                products,
                orders,
                tickets,
            }),
        })
    }

    /// Writes a full snapshot. Failures are logged and swallowed; the
    /// in-memory collection stays authoritative.
    fn persist<T: Serialize>(&self, c: Collection, items: &[T]) {
        let key = snapshot_key(&self.namespace, c);
        if let Err(e) = write_snapshot(&*self.kv, &key, items) {
            error!(error = %e, key = %key, "failed to persist snapshot");
        }
    }

    // --- Products ---

    /// All products, active and inactive.
    pub async fn get_products(&self) -> Vec<Product> {
        let products = self.data.lock().await.products.clone();
        self.latency.settle(products).await
    }

    pub async fn get_product(&self, id: &str) -> Option<Product> {
        let product = {
            let data = self.data.lock().await;
            data.products.iter().find(|p| p.id == id).cloned()
        };
        self.latency.settle(product).await
    }

    pub async fn add_product(&self, product: Product) -> Product {
        {
            let mut data = self.data.lock().await;
            data.products.insert(0, product.clone());
            self.persist(Collection::Products, &data.products);
        }
        debug!(product_id = %product.id, "product added");
        self.latency.settle(product).await
    }

    /// Merges `patch` into the product with `id`. Unknown ids are ignored.
    pub async fn update_product(&self, id: &str, patch: ProductPatch) {
        {
            let mut data = self.data.lock().await;
            if let Some(p) = data.products.iter_mut().find(|p| p.id == id) {
                patch.apply(p);
                self.persist(Collection::Products, &data.products);
                debug!(product_id = %id, "product updated");
            }
        }
        self.latency.settle(()).await
    }

    /// Soft delete: the record stays, flagged inactive.
    pub async fn delete_product(&self, id: &str) {
        self.update_product(id, ProductPatch::deactivate()).await
    }

    // --- Users ---

    pub async fn get_users(&self) -> Vec<User> {
        let users = self.data.lock().await.users.clone();
        self.latency.settle(users).await
    }

    pub async fn get_user(&self, id: &str) -> Option<User> {
        let user = {
            let data = self.data.lock().await;
            data.users.iter().find(|u| u.id == id).cloned()
        };
        self.latency.settle(user).await
    }

    /// Case-insensitive email lookup.
    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        let user = {
            let data = self.data.lock().await;
            data.users.iter().find(|u| u.email_matches(email)).cloned()
        };
        self.latency.settle(user).await
    }

    /// Returns the user when the email exists and either no password is set
    /// or `password` matches the stored one.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Option<User> {
        let user = {
            let data = self.data.lock().await;
            data.users.iter().find(|u| u.email_matches(email)).cloned()
        };
        let verified = user.filter(|u| match u.password.as_deref() {
            Some(stored) => password_matches(stored, password),
            None => true,
        });
        self.latency.settle(verified).await
    }

    /// Returns `false` when no user has `email`.
    pub async fn update_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<bool, StoreError> {
        let sealed = self
            .scheme
            .seal(new_password)
            .map_err(|e| StoreError::Credential(e.to_string()))?;

        let updated = {
            let mut data = self.data.lock().await;
            match data.users.iter_mut().find(|u| u.email_matches(email)) {
                Some(u) => {
                    u.password = Some(sealed);
                    debug!(user_id = %u.id, "password updated");
                    self.persist(Collection::Users, &data.users);
                    true
                }
                None => false,
            }
        };
        Ok(self.latency.settle(updated).await)
    }

    pub async fn update_user_profile(&self, user_id: &str, name: &str) -> Option<User> {
        let updated = {
            let mut data = self.data.lock().await;
            let found = data.users.iter_mut().find(|u| u.id == user_id).map(|u| {
                u.name = name.to_string();
                u.clone()
            });
            if found.is_some() {
                self.persist(Collection::Users, &data.users);
            }
            found
        };
        self.latency.settle(updated).await
    }

    /// Appends `user`, sealing its plaintext password with the configured
    /// scheme. Email uniqueness is the caller's responsibility.
    pub async fn add_user(&self, mut user: User) -> Result<User, StoreError> {
        if let Some(plain) = user.password.take() {
            let sealed = self
                .scheme
                .seal(&plain)
                .map_err(|e| StoreError::Credential(e.to_string()))?;
            user.password = Some(sealed);
        }
        {
            let mut data = self.data.lock().await;
            data.users.push(user.clone());
            self.persist(Collection::Users, &data.users);
        }
        debug!(user_id = %user.id, "user added");
        Ok(self.latency.settle(user).await)
    }

    pub async fn update_user_status(&self, id: &str, status: UserStatus) {
        {
            let mut data = self.data.lock().await;
            if let Some(u) = data.users.iter_mut().find(|u| u.id == id) {
                u.status = status;
                self.persist(Collection::Users, &data.users);
            }
        }
        self.latency.settle(()).await
    }

    /// Flips active/inactive under one lock. `None` for unknown ids.
    pub async fn toggle_user_status(&self, id: &str) -> Option<User> {
        let updated = {
            let mut data = self.data.lock().await;
            let found = data.users.iter_mut().find(|u| u.id == id).map(|u| {
                u.status = u.status.toggled();
                u.clone()
            });
            if found.is_some() {
                self.persist(Collection::Users, &data.users);
            }
            found
        };
        self.latency.settle(updated).await
    }

    // --- Orders ---

    /// Records a successful purchase and grants ownership. Always writes an
    /// order, even when the user already owns the product; ownership is
    /// never duplicated. `None` when the user does not exist.
    pub async fn create_order(&self, user_id: &str, product: &Product) -> Option<User> {
        let result = {
            let mut data = self.data.lock().await;
            match data.users.iter().position(|u| u.id == user_id) {
                None => None,
                Some(idx) => {
                    let order = Order {
                        id: new_id("ord_"),
                        user_id: user_id.to_string(),
                        user_name: data.users[idx].name.clone(),
                        product_id: product.id.clone(),
                        product_name: product.name.clone(),
                        amount: product.price,
                        status: OrderStatus::Success,
                        date: OffsetDateTime::now_utc(),
                    };
                    info!(
                        order_id = %order.id,
                        user_id = %user_id,
                        product_id = %product.id,
                        amount = order.amount,
                        "order created"
                    );
                    data.orders.insert(0, order);
                    self.persist(Collection::Orders, &data.orders);

                    if !data.users[idx].owns(&product.id) {
                        data.users[idx].purchased_products.push(product.id.clone());
                        self.persist(Collection::Users, &data.users);
                    }
                    Some(data.users[idx].clone())
                }
            }
        };
        self.latency.settle(result).await
    }

    /// Most recent first.
    pub async fn get_orders(&self) -> Vec<Order> {
        let orders = self.data.lock().await.orders.clone();
        self.latency.settle(orders).await
    }

    /// Sum of `amount` over successful orders.
    pub async fn get_revenue(&self) -> u64 {
        let revenue = {
            let data = self.data.lock().await;
            data.orders
                .iter()
                .filter(|o| o.status == OrderStatus::Success)
                .map(|o| o.amount)
                .sum()
        };
        self.latency.settle(revenue).await
    }

    // --- Tickets ---

    /// Most recent first.
    pub async fn get_tickets(&self) -> Vec<Ticket> {
        let tickets = self.data.lock().await.tickets.clone();
        self.latency.settle(tickets).await
    }

    pub async fn create_ticket(
        &self,
        user_id: &str,
        subject: &str,
        priority: TicketPriority,
    ) -> Ticket {
        let ticket = Ticket {
            id: new_id("tkt_"),
            user_id: user_id.to_string(),
            subject: subject.to_string(),
            status: TicketStatus::Open,
            priority,
            created_at: OffsetDateTime::now_utc(),
        };
        {
            let mut data = self.data.lock().await;
            data.tickets.insert(0, ticket.clone());
            self.persist(Collection::Tickets, &data.tickets);
        }
        debug!(ticket_id = %ticket.id, user_id = %user_id, "ticket created");
        self.latency.settle(ticket).await
    }

    pub async fn update_ticket_status(&self, id: &str, status: TicketStatus) {
        {
            let mut data = self.data.lock().await;
            if let Some(t) = data.tickets.iter_mut().find(|t| t.id == id) {
                t.status = status;
                self.persist(Collection::Tickets, &data.tickets);
            }
        }
        self.latency.settle(()).await
    }

    /// Flips open/closed under one lock. With `owner` set, tickets of other
    /// users are treated as absent.
    pub async fn toggle_ticket_status(&self, id: &str, owner: Option<&str>) -> Option<Ticket> {
        let updated = {
            let mut data = self.data.lock().await;
            let found = data
                .tickets
                .iter_mut()
                .find(|t| t.id == id && owner.map_or(true, |o| t.user_id == o))
                .map(|t| {
                    t.status = t.status.toggled();
                    t.clone()
                });
            if found.is_some() {
                self.persist(Collection::Tickets, &data.tickets);
            }
            found
        };
        self.latency.settle(updated).await
    }
}

#[cfg(test)]
mod tests {
    use super::model::{Category, LicenseType, UserRole};
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::Instant;

    /// Memory backend whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: AtomicBool,
    }

    impl KvStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &[u8]) -> Result<(), KvError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(KvError::Storage("disk full".into()));
            }
            self.inner.set(key, value)
        }
    }

    fn options() -> StoreOptions {
        StoreOptions {
            namespace: DEFAULT_NAMESPACE.to_string(),
            latency: Latency::none(),
            scheme: PasswordScheme::Plain,
        }
    }

    fn fixture() -> (Arc<MemoryStore>, RecordStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = RecordStore::open(kv.clone(), options()).unwrap();
        (kv, store)
    }

    fn reopen(kv: &Arc<MemoryStore>) -> RecordStore {
        RecordStore::open(kv.clone(), options()).unwrap()
    }

    fn sample_product(id: &str, price: u64) -> Product {
        Product {
            id: id.into(),
            name: format!("Product {id}"),
            description: String::new(),
            price,
            category: Category::Reports,
            image_url: "https://example.invalid/p.png".into(),
            features: vec!["Feature 1".into()],
            active: true,
            version: Some("1.0".into()),
            license_type: LicenseType::Lifetime,
            file: None,
            demo_file: None,
        }
    }

    fn customer(id: &str, email: &str) -> User {
        User {
            id: id.into(),
            name: "New Customer".into(),
            email: email.into(),
            password: Some("secret99".into()),
            role: UserRole::Customer,
            status: UserStatus::Active,
            joined_at: OffsetDateTime::now_utc(),
            purchased_products: vec![],
        }
    }

    #[tokio::test]
    async fn seeds_and_persists_every_collection() {
        let (kv, store) = fixture();
        assert_eq!(store.get_users().await.len(), 3);
        assert_eq!(store.get_products().await.len(), 4);
        assert!(store.get_products().await.iter().all(|p| p.active));
        assert_eq!(store.get_orders().await.len(), 1);
        assert_eq!(store.get_tickets().await.len(), 1);

        for key in ["users", "products", "orders", "tickets"] {
            assert!(kv.get(&format!("tallypro_{key}")).unwrap().is_some(), "{key}");
        }
    }

    #[tokio::test]
    async fn delete_product_is_soft() {
        let (_kv, store) = fixture();
        store.delete_product("2").await;

        let products = store.get_products().await;
        let p = products.iter().find(|p| p.id == "2").unwrap();
        assert!(!p.active);
        assert_eq!(products.len(), 4);
    }

    #[tokio::test]
    async fn update_unknown_product_is_noop() {
        let (_kv, store) = fixture();
        let before = store.get_products().await;
        store
            .update_product(
                "missing",
                ProductPatch {
                    name: Some("x".into()),
                    ..ProductPatch::default()
                },
            )
            .await;
        assert_eq!(store.get_products().await, before);
    }

    #[tokio::test]
    async fn add_product_prepends() {
        let (_kv, store) = fixture();
        let stored = store.add_product(sample_product("p9", 999)).await;
        assert_eq!(stored.id, "p9");
        assert_eq!(store.get_products().await[0].id, "p9");
    }

    #[tokio::test]
    async fn create_order_grants_ownership_once() {
        let (_kv, store) = fixture();
        let product = store.get_product("3").await.unwrap();

        let user = store.create_order("u2", &product).await.unwrap();
        assert_eq!(user.purchased_products, vec!["3".to_string()]);

        let orders = store.get_orders().await;
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].amount, product.price);
        assert_eq!(orders[0].user_name, "Amit Patel");
        assert_eq!(orders[0].product_name, product.name);
        assert_eq!(orders[0].status, OrderStatus::Success);
        assert!(orders[0].id.starts_with("ord_"));
    }

    #[tokio::test]
    async fn repeat_purchase_writes_order_but_not_ownership() {
        let (_kv, store) = fixture();
        let product = store.get_product("3").await.unwrap();

        store.create_order("u2", &product).await.unwrap();
        let user = store.create_order("u2", &product).await.unwrap();

        assert_eq!(user.purchased_products.iter().filter(|p| *p == "3").count(), 1);
        let for_u2 = store
            .get_orders()
            .await
            .into_iter()
            .filter(|o| o.user_id == "u2")
            .count();
        assert_eq!(for_u2, 2);
    }

    #[tokio::test]
    async fn create_order_for_unknown_user_is_absent() {
        let (_kv, store) = fixture();
        let product = store.get_product("1").await.unwrap();
        assert!(store.create_order("ghost", &product).await.is_none());
        assert_eq!(store.get_orders().await.len(), 1);
    }

    #[tokio::test]
    async fn revenue_counts_only_successful_orders() {
        let kv = Arc::new(MemoryStore::new());
        let orders = serde_json::json!([
            { "id": "ord_a", "userId": "u1", "userName": "Rajesh Kumar", "productId": "1",
              "productName": "Auto-GST Reconciliation Pro", "amount": 4999, "status": "success",
              "date": "2024-01-01T00:00:00Z" },
            { "id": "ord_b", "userId": "u1", "userName": "Rajesh Kumar", "productId": "2",
              "productName": "Dynamic Digital Signature", "amount": 2499, "status": "refunded",
              "date": "2024-01-02T00:00:00Z" },
            { "id": "ord_c", "userId": "u2", "userName": "Amit Patel", "productId": "3",
              "productName": "WhatsApp Automation Toolkit", "amount": 3500, "status": "pending",
              "date": "2024-01-03T00:00:00Z" }
        ]);
        kv.set("tallypro_orders", orders.to_string().as_bytes()).unwrap();

        let store = RecordStore::open(kv, options()).unwrap();
        assert_eq!(store.get_revenue().await, 4999);

        let product = store.get_product("4").await.unwrap();
        store.create_order("u2", &product).await.unwrap();
        assert_eq!(store.get_revenue().await, 4999 + 1999);
    }

    #[tokio::test]
    async fn verify_credentials_is_case_insensitive_on_email() {
        let (_kv, store) = fixture();
        let user = store
            .verify_credentials("USER@TALLYPRO.IN", "password123")
            .await
            .unwrap();
        assert_eq!(user.id, "u1");
        assert!(user.owns("1"));

        assert!(store.verify_credentials("user@tallypro.in", "wrong").await.is_none());
        assert!(store.verify_credentials("nobody@tallypro.in", "password123").await.is_none());
    }

    #[tokio::test]
    async fn user_without_password_accepts_anything() {
        let (_kv, store) = fixture();
        let mut u = customer("u9", "open@tallypro.in");
        u.password = None;
        store.add_user(u).await.unwrap();
        assert!(store.verify_credentials("open@tallypro.in", "").await.is_some());
        assert!(store.verify_credentials("open@tallypro.in", "anything").await.is_some());
    }

    #[tokio::test]
    async fn argon2_scheme_hashes_seeds_and_updates() {
        let kv = Arc::new(MemoryStore::new());
        let store = RecordStore::open(
            kv,
            StoreOptions {
                scheme: PasswordScheme::Argon2,
                latency: Latency::none(),
                ..StoreOptions::default()
            },
        )
        .unwrap();

        let admin = store.get_user("admin_1").await.unwrap();
        assert!(admin.password.as_deref().unwrap().starts_with("$argon2"));
        assert!(store
            .verify_credentials(seed::SUPER_ADMIN_EMAIL, seed::SUPER_ADMIN_PASSWORD)
            .await
            .is_some());

        assert!(store.update_password("amit@business.com", "n3wpass").await.unwrap());
        assert!(store.verify_credentials("amit@business.com", "n3wpass").await.is_some());
        assert!(store.verify_credentials("amit@business.com", "password123").await.is_none());
    }

    #[tokio::test]
    async fn legacy_plaintext_snapshot_still_authenticates() {
        let kv = Arc::new(MemoryStore::new());
        {
            RecordStore::open(kv.clone(), options()).unwrap();
        }
        let store = RecordStore::open(
            kv,
            StoreOptions {
                latency: Latency::none(),
                ..StoreOptions::default()
            },
        )
        .unwrap();
        assert!(store.verify_credentials("user@tallypro.in", "password123").await.is_some());
    }

    #[tokio::test]
    async fn update_password_unknown_email_is_false() {
        let (_kv, store) = fixture();
        assert!(!store.update_password("ghost@tallypro.in", "whatever").await.unwrap());
        assert!(store.update_password("Amit@Business.com", "changed1").await.unwrap());
        assert!(store.verify_credentials("amit@business.com", "changed1").await.is_some());
    }

    #[tokio::test]
    async fn update_profile_returns_updated_user_or_absent() {
        let (_kv, store) = fixture();
        let u = store.update_user_profile("u2", "Amit P.").await.unwrap();
        assert_eq!(u.name, "Amit P.");
        assert!(store.update_user_profile("ghost", "x").await.is_none());
    }

    #[tokio::test]
    async fn add_user_does_not_reject_duplicates() {
        let (_kv, store) = fixture();
        store.add_user(customer("dup", "user@tallypro.in")).await.unwrap();
        assert_eq!(store.get_users().await.len(), 4);
        assert_eq!(store.get_users().await.last().unwrap().id, "dup");
    }

    #[tokio::test]
    async fn update_user_status_sets_field() {
        let (_kv, store) = fixture();
        store.update_user_status("u2", UserStatus::Inactive).await;
        assert_eq!(store.get_user("u2").await.unwrap().status, UserStatus::Inactive);
        store.update_user_status("ghost", UserStatus::Inactive).await;
    }

    #[tokio::test]
    async fn ticket_toggle_round_trip() {
        let (_kv, store) = fixture();
        store.update_ticket_status("tkt_1", TicketStatus::Closed).await;
        let t = store.get_tickets().await.into_iter().find(|t| t.id == "tkt_1").unwrap();
        assert_eq!(t.status, TicketStatus::Closed);

        store.update_ticket_status("tkt_1", t.status.toggled()).await;
        let t = store.get_tickets().await.into_iter().find(|t| t.id == "tkt_1").unwrap();
        assert_eq!(t.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn failed_write_keeps_mutation_in_memory() {
        let kv = Arc::new(FlakyStore::default());
        let store = RecordStore::open(kv.clone(), options()).unwrap();
        kv.fail_writes.store(true, Ordering::SeqCst);

        store.delete_product("1").await;
        assert!(!store.get_product("1").await.unwrap().active);

        let product = store.get_product("3").await.unwrap();
        let user = store.create_order("u2", &product).await.unwrap();
        assert!(user.owns("3"));
        assert_eq!(store.get_orders().await.len(), 2);

        // the backend still holds the pre-failure snapshot
        kv.fail_writes.store(false, Ordering::SeqCst);
        let reloaded = RecordStore::open(kv, options()).unwrap();
        assert!(reloaded.get_product("1").await.unwrap().active);
        assert_eq!(reloaded.get_orders().await.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_toggles_do_not_collapse() {
        let kv = Arc::new(MemoryStore::new());
        let store = RecordStore::open(
            kv,
            StoreOptions {
                latency: Latency::new(Duration::from_millis(5)),
                ..options()
            },
        )
        .unwrap();

        let (a, b) = tokio::join!(
            store.toggle_ticket_status("tkt_1", None),
            store.toggle_ticket_status("tkt_1", None)
        );
        assert_ne!(a.unwrap().status, b.unwrap().status);
        let t = store.get_tickets().await.into_iter().find(|t| t.id == "tkt_1").unwrap();
        assert_eq!(t.status, TicketStatus::Open);

        let (a, b) = tokio::join!(store.toggle_user_status("u2"), store.toggle_user_status("u2"));
        assert_ne!(a.unwrap().status, b.unwrap().status);
        assert_eq!(store.get_user("u2").await.unwrap().status, UserStatus::Active);
    }

    #[tokio::test]
    async fn owner_scoped_toggle_ignores_other_users() {
        let (_kv, store) = fixture();
        assert!(store.toggle_ticket_status("tkt_1", Some("u2")).await.is_none());
        assert!(store.toggle_user_status("ghost").await.is_none());
        let t = store.toggle_ticket_status("tkt_1", Some("u1")).await.unwrap();
        assert_eq!(t.status, TicketStatus::Closed);
    }

    #[tokio::test]
    async fn create_ticket_is_open_and_first() {
        let (_kv, store) = fixture();
        let t = store
            .create_ticket("u2", "License key not accepted", TicketPriority::Low)
            .await;
        assert_eq!(t.status, TicketStatus::Open);
        assert!(t.id.starts_with("tkt_"));
        assert_eq!(store.get_tickets().await[0].id, t.id);
    }

    #[tokio::test]
    async fn mutations_survive_reload() {
        let (kv, store) = fixture();
        let product = store.add_product(sample_product("p9", 1200)).await;
        store.delete_product("4").await;
        store.create_order("u2", &product).await.unwrap();
        store.add_user(customer("u7", "new@tallypro.in")).await.unwrap();
        store.update_user_status("u1", UserStatus::Inactive).await;
        store.create_ticket("u7", "Need invoice", TicketPriority::High).await;
        store.update_ticket_status("tkt_1", TicketStatus::InProgress).await;

        let reloaded = reopen(&kv);
        assert_eq!(reloaded.get_users().await, store.get_users().await);
        assert_eq!(reloaded.get_products().await, store.get_products().await);
        assert_eq!(reloaded.get_orders().await, store.get_orders().await);
        assert_eq!(reloaded.get_tickets().await, store.get_tickets().await);
    }

    #[tokio::test]
    async fn corrupt_snapshot_fails_open() {
        let kv = Arc::new(MemoryStore::new());
        kv.set("tallypro_products", b"{not json").unwrap();
        let err = RecordStore::open(kv, options()).err().unwrap();
        assert!(matches!(err, StoreError::Snapshot { .. }));
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let kv = Arc::new(MemoryStore::new());
        let a = RecordStore::open(kv.clone(), options()).unwrap();
        a.delete_product("1").await;

        let b = RecordStore::open(
            kv,
            StoreOptions {
                namespace: "staging".into(),
                ..options()
            },
        )
        .unwrap();
        assert!(b.get_product("1").await.unwrap().active);
    }

    #[tokio::test(start_paused = true)]
    async fn operations_resolve_after_delay_even_when_absent() {
        let kv = Arc::new(MemoryStore::new());
        let store = RecordStore::open(
            kv,
            StoreOptions {
                latency: Latency::new(DEFAULT_DELAY),
                ..options()
            },
        )
        .unwrap();

        let started = Instant::now();
        assert!(store.get_user_by_email("ghost@tallypro.in").await.is_none());
        assert!(started.elapsed() >= DEFAULT_DELAY);

        let started = Instant::now();
        store.update_ticket_status("missing", TicketStatus::Closed).await;
        assert!(started.elapsed() >= DEFAULT_DELAY);
    }

    #[test]
    fn new_id_shape() {
        let id = new_id("ord_");
        assert!(id.starts_with("ord_"));
        assert_eq!(id.len(), 13);
        assert_eq!(new_id("").len(), 9);
    }
}
