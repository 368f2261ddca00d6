use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{json, Map, Value};
use tokio::sync::{broadcast, Notify};

use crate::error::{AuthError, DataError};
use crate::models::{AuthSession, Credentials, Identity, Tier};
use crate::query::{Direction, Filter, Query};
use crate::remote::{AuthBackend, AuthEvent, AuthSubscription, RemoteStore, SignUpOutcome};

/// Operations that can be counted or made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
}

/// Server-side access policy for writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WritePolicy {
    #[default]
    AllowAll,
    /// Only a signed-in identity whose profile tier is `admin` may write.
    AdminsOnly,
}

#[derive(Debug)]
struct Account {
    id: String,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    accounts: HashMap<String, Account>,
    session: Option<AuthSession>,
    failures: HashMap<Op, VecDeque<DataError>>,
    auth_failures: VecDeque<AuthError>,
    calls: HashMap<Op, usize>,
    policy: WritePolicy,
    auto_confirm: bool,
    write_gate: Option<Arc<Notify>>,
    read_gate: Option<Arc<Notify>>,
    clock: u64,
}

/// In-memory backend for testing and for running the app without a hosted
/// project. Implements both [`RemoteStore`] and [`AuthBackend`].
#[derive(Clone, Debug)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Arc::default(),
            events,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append rows to a table as-is.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Register an account with a profile of the given tier. Returns the identity id.
    pub fn add_user(&self, email: &str, password: &str, tier: Tier) -> String {
        let mut state = self.lock();
        let id = format!("user-{}", state.accounts.len() + 1);
        state.accounts.insert(
            email.to_string(),
            Account {
                id: id.clone(),
                password: password.to_string(),
            },
        );
        let created_at = state.tick();
        state
            .tables
            .entry("profiles".to_string())
            .or_default()
            .push(json!({ "id": id, "email": email, "tier": tier, "created_at": created_at }));
        id
    }

    /// Snapshot of a table.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn set_write_policy(&self, policy: WritePolicy) {
        self.lock().policy = policy;
    }

    /// Make sign-up return a live session instead of requiring confirmation.
    pub fn set_auto_confirm(&self, auto_confirm: bool) {
        self.lock().auto_confirm = auto_confirm;
    }

    /// Queue an error for the next call of `op`.
    pub fn fail_next(&self, op: Op, err: DataError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    /// Queue an error for the next auth call.
    pub fn fail_next_auth(&self, err: AuthError) {
        self.lock().auth_failures.push_back(err);
    }

    /// How many times `op` has been called.
    pub fn calls(&self, op: Op) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Total number of row calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Hold every subsequent write until the returned gate is notified once per write.
    pub fn hold_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().write_gate = Some(gate.clone());
        gate
    }

    pub fn release_writes(&self) {
        if let Some(gate) = self.lock().write_gate.take() {
            gate.notify_waiters();
        }
    }

    /// Hold every subsequent select after it has read its rows, until the
    /// returned gate is notified. Models a slow response carrying old data.
    pub fn hold_reads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().read_gate = Some(gate.clone());
        gate
    }

    pub fn release_reads(&self) {
        if let Some(gate) = self.lock().read_gate.take() {
            gate.notify_waiters();
        }
    }

    /// Drop the current session as if the token expired on the server.
    pub fn expire_session(&self) {
        self.lock().session = None;
        self.emit(AuthEvent::SignedOut);
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Record the call and pop an injected failure, if any.
    fn begin(&self, op: Op) -> Result<(), DataError> {
        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;
        match state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn begin_write(&self, op: Op) -> Result<(), DataError> {
        let gate = {
            let mut state = self.lock();
            *state.calls.entry(op).or_default() += 1;
            state.write_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let mut state = self.lock();
        if let Some(err) = state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        state.authorize_write()
    }

    fn begin_auth(&self) -> Result<(), AuthError> {
        match self.lock().auth_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl State {
    fn tick(&mut self) -> String {
        self.clock += 1;
        let n = self.clock;
        format!(
            "2024-01-01T{:02}:{:02}:{:02}Z",
            (n / 3600) % 24,
            (n / 60) % 60,
            n % 60
        )
    }

    fn authorize_write(&self) -> Result<(), DataError> {
        if self.policy == WritePolicy::AllowAll {
            return Ok(());
        }
        let Some(session) = &self.session else {
            return Err(DataError::Forbidden);
        };
        let is_admin = self
            .tables
            .get("profiles")
            .into_iter()
            .flatten()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(session.identity.id.as_str()))
            .and_then(|row| row.get("tier"))
            .and_then(|tier| serde_json::from_value::<Tier>(tier.clone()).ok())
            .is_some_and(|tier| tier.is_admin());
        if is_admin {
            Ok(())
        } else {
            Err(DataError::Forbidden)
        }
    }

    fn select(&self, query: &Query) -> Result<Vec<Value>, DataError> {
        let mut rows: Vec<Value> = self
            .tables
            .get(&query.table)
            .into_iter()
            .flatten()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if query.single {
            match rows.len() {
                0 => return Err(DataError::NotFound(format!("row in {}", query.table))),
                1 => {}
                n => {
                    return Err(DataError::Conflict(format!(
                        "expected one row in {}, found {n}",
                        query.table
                    )))
                }
            }
        }
        Ok(rows)
    }

    fn next_id(&self, table: &str) -> i64 {
        self.tables
            .get(table)
            .into_iter()
            .flatten()
            .filter_map(|row| row.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal),
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        // Missing values sort last.
        (Some(Value::Null) | None, _) => Ordering::Greater,
        (_, Some(Value::Null) | None) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

impl RemoteStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, DataError> {
        self.begin(Op::Select)?;
        let (rows, gate) = {
            let state = self.lock();
            (state.select(query), state.read_gate.clone())
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        rows
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, DataError> {
        self.begin_write(Op::Insert).await?;
        let Value::Object(mut fields) = row else {
            return Err(DataError::Malformed("insert body must be an object".to_string()));
        };
        let mut state = self.lock();
        if !fields.contains_key("id") {
            fields.insert("id".to_string(), json!(state.next_id(table)));
        }
        let stored = Value::Object(fields);
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<(), DataError> {
        self.begin_write(Op::Update).await?;
        let Value::Object(patch) = patch else {
            return Err(DataError::Malformed("update body must be an object".to_string()));
        };
        let mut state = self.lock();
        let mut matched = 0;
        for row in state.tables.entry(table.to_string()).or_default() {
            if filter.matches(row) {
                if let Value::Object(fields) = row {
                    merge(fields, &patch);
                    matched += 1;
                }
            }
        }
        if matched == 0 {
            return Err(DataError::NotFound(format!(
                "{table} {}",
                filter.value_text()
            )));
        }
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), DataError> {
        self.begin_write(Op::Delete).await?;
        let mut state = self.lock();
        let rows = state.tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        if rows.len() == before {
            return Err(DataError::NotFound(format!(
                "{table} {}",
                filter.value_text()
            )));
        }
        Ok(())
    }
}

fn merge(fields: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        fields.insert(key.clone(), value.clone());
    }
}

impl AuthBackend for MemoryStore {
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        self.begin_auth()?;
        let auto_confirm = {
            let state = self.lock();
            if state.accounts.contains_key(&credentials.email) {
                return Err(AuthError::Rejected("User already registered".to_string()));
            }
            state.auto_confirm
        };
        let id = self.add_user(&credentials.email, &credentials.password, Tier::Free);
        if !auto_confirm {
            return Ok(SignUpOutcome::ConfirmationRequired);
        }
        let session = AuthSession {
            identity: Identity {
                id,
                email: credentials.email.clone(),
            },
            access_token: format!("token-{}", credentials.email),
        };
        self.lock().session = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        self.begin_auth()?;
        let session = {
            let mut state = self.lock();
            let account = state
                .accounts
                .get(&credentials.email)
                .filter(|account| account.password == credentials.password)
                .ok_or(AuthError::InvalidCredentials)?;
            let session = AuthSession {
                identity: Identity {
                    id: account.id.clone(),
                    email: credentials.email.clone(),
                },
                access_token: format!("token-{}", credentials.email),
            };
            state.session = Some(session.clone());
            session
        };
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let failure = self.begin_auth();
        self.lock().session = None;
        self.emit(AuthEvent::SignedOut);
        failure
    }

    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        self.begin_auth()?;
        Ok(self.lock().session.clone())
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.events.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, Project};
    use crate::remote::{fetch_all, fetch_one};

    fn project(id: i64, title: &str) -> Value {
        json!({ "id": id, "title": title, "description": "d", "tech_stack": [] })
    }

    #[tokio::test]
    async fn test_select_orders_and_filters() {
        let store = MemoryStore::new();
        store.seed("projects", [project(3, "C"), project(1, "A"), project(2, "B")]);

        let projects: Vec<Project> = fetch_all(&store).await.unwrap();
        let ids: Vec<i64> = projects.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let rows = store
            .select(&Query::table("projects").eq("title", "B"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(store.calls(Op::Select), 2);
    }

    #[tokio::test]
    async fn test_single_select_requires_one_row() {
        let store = MemoryStore::new();
        store.seed("projects", [project(1, "A")]);

        let found: Project = fetch_one(&store, &1).await.unwrap();
        assert_eq!(found.title, "A");

        let missing = fetch_one::<Project>(&store, &9).await.unwrap_err();
        assert!(matches!(missing, DataError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_insert_assigns_next_id() {
        let store = MemoryStore::new();
        store.seed("projects", [project(4, "D")]);

        let row = store
            .insert("projects", json!({ "title": "E", "description": "e", "tech_stack": [] }))
            .await
            .unwrap();
        assert_eq!(row["id"], json!(5));
        assert_eq!(store.rows("projects").len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_report_missing_rows() {
        let store = MemoryStore::new();
        store.seed("projects", [project(1, "A")]);

        store
            .update("projects", &Filter::eq("id", 1), json!({ "title": "AA" }))
            .await
            .unwrap();
        assert_eq!(store.rows("projects")[0]["title"], json!("AA"));

        let err = store
            .update("projects", &Filter::eq("id", 2), json!({ "title": "B" }))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::NotFound(_)));

        store.delete("projects", &Filter::eq("id", 1)).await.unwrap();
        assert!(store.rows("projects").is_empty());
        assert!(store.delete("projects", &Filter::eq("id", 1)).await.is_err());
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let store = MemoryStore::new();
        store.fail_next(Op::Select, DataError::Network("offline".to_string()));

        assert!(store.select(&Query::table("projects")).await.is_err());
        assert!(store.select(&Query::table("projects")).await.is_ok());
    }

    #[tokio::test]
    async fn test_admins_only_policy_rejects_other_writers() {
        let store = MemoryStore::new();
        store.set_write_policy(WritePolicy::AdminsOnly);
        store.add_user("admin@example.com", "pw", Tier::Admin);
        store.add_user("free@example.com", "pw", Tier::Free);
        let row = json!({ "title": "X", "description": "x", "tech_stack": [] });

        assert_eq!(
            store.insert("projects", row.clone()).await.unwrap_err(),
            DataError::Forbidden
        );

        store
            .sign_in_with_password(&Credentials::new("free@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(
            store.insert("projects", row.clone()).await.unwrap_err(),
            DataError::Forbidden
        );

        store
            .sign_in_with_password(&Credentials::new("admin@example.com", "pw"))
            .await
            .unwrap();
        assert!(store.insert("projects", row).await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_in_emits_event_and_checks_password() {
        let store = MemoryStore::new();
        let id = store.add_user("ada@example.com", "secret", Tier::Paid);
        let mut events = store.subscribe();

        let err = store
            .sign_in_with_password(&Credentials::new("ada@example.com", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);

        let session = store
            .sign_in_with_password(&Credentials::new("ada@example.com", "secret"))
            .await
            .unwrap();
        assert_eq!(session.identity.id, id);
        assert_eq!(events.next().await, Some(AuthEvent::SignedIn(session.clone())));
        assert_eq!(store.get_session().await.unwrap(), Some(session));

        let profile: Profile = fetch_one(&store, &id).await.unwrap();
        assert_eq!(profile.tier, Tier::Paid);
    }

    #[tokio::test]
    async fn test_sign_up_requires_confirmation_by_default() {
        let store = MemoryStore::new();
        let outcome = store
            .sign_up(&Credentials::new("new@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(outcome, SignUpOutcome::ConfirmationRequired);
        assert_eq!(store.get_session().await.unwrap(), None);

        let again = store
            .sign_up(&Credentials::new("new@example.com", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(again, AuthError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_auto_confirmed_sign_up_starts_a_session() {
        let store = MemoryStore::new();
        store.set_auto_confirm(true);
        let mut events = store.subscribe();

        let outcome = store
            .sign_up(&Credentials::new("new@example.com", "pw"))
            .await
            .unwrap();
        let SignUpOutcome::SignedIn(session) = outcome else {
            panic!("expected a live session, got {outcome:?}");
        };
        assert_eq!(session.identity.email, "new@example.com");
        assert_eq!(store.get_session().await.unwrap(), Some(session.clone()));
        assert_eq!(events.next().await, Some(AuthEvent::SignedIn(session)));
    }

    #[tokio::test]
    async fn test_held_select_returns_rows_read_before_release() {
        let store = MemoryStore::new();
        store.seed("projects", [project(1, "A")]);
        let gate = store.hold_reads();

        let query = Query::table("projects");
        let (rows, ()) = tokio::join!(store.select(&query), async {
            while store.calls(Op::Select) < 1 {
                tokio::task::yield_now().await;
            }
            store.seed("projects", [project(2, "B")]);
            gate.notify_waiters();
        });
        assert_eq!(rows.unwrap().len(), 1);
        assert_eq!(store.rows("projects").len(), 2);
    }

    #[tokio::test]
    async fn test_profiles_order_newest_first() {
        let store = MemoryStore::new();
        store.add_user("first@example.com", "pw", Tier::Free);
        store.add_user("second@example.com", "pw", Tier::Free);

        let profiles: Vec<Profile> = fetch_all(&store).await.unwrap();
        assert_eq!(profiles[0].email.as_deref(), Some("second@example.com"));
    }
}
