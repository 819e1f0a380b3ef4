//! Shared test utilities for integration tests.
//!
//! `FakeBackend` is an in-memory stand-in for the hosted backend: tables are
//! vectors of JSON rows, filters are evaluated with `Query::matches`, and
//! every data call is logged so tests can assert on what was (or was not)
//! sent.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use rt_api::{Backend, Session, SignUp};
use rt_core::config::{AppConfig, BackendConfig};
use rt_core::error::{BackendError, RtError, RtResult, UNIQUE_VIOLATION};
use rt_models::query::{compare_values, lookup, Query};
use rt_models::Principal;
use rt_realtime::RealtimeClient;
use rt_services::RoomThere;
use tokio::sync::mpsc;

/// One logged data call: operation and table (or RPC function name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: &'static str,
    pub target: String,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    calls: Vec<Call>,
    principal: Option<Principal>,
    accounts: HashMap<String, (String, Principal)>,
    session: Option<Session>,
    /// Columns that must be unique together, per table.
    unique: HashMap<String, Vec<&'static str>>,
    /// Rows another client inserts just before our next insert into a table.
    racing: HashMap<String, Value>,
    /// Error returned by the next call of the given operation.
    fail_next: Option<(&'static str, BackendError)>,
    clock: i64,
}

/// In-memory backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.unique("conversations", vec!["user1_id", "user2_id"]);
        fake.unique("saved_listings", vec!["renter_id", "listing_id"]);
        fake
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake backend lock poisoned")
    }

    /// Act as `id` from now on.
    pub fn sign_in_as(&self, id: Uuid) {
        self.lock().principal = Some(Principal::new(id));
    }

    pub fn sign_out_locally(&self) {
        self.lock().principal = None;
    }

    pub fn register_account(&self, email: &str, password: &str, id: Uuid) {
        let mut principal = Principal::new(id);
        principal.email = Some(email.to_string());
        self.lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), principal));
    }

    pub fn unique(&self, table: &str, columns: Vec<&'static str>) {
        self.lock().unique.insert(table.to_string(), columns);
    }

    /// Simulate a concurrent writer landing `row` in `table` right before
    /// the next insert there.
    pub fn race_next_insert(&self, table: &str, row: Value) {
        self.lock().racing.insert(table.to_string(), row);
    }

    /// Fail the next `op` call ("select", "insert", ...) with `error`.
    pub fn fail_next(&self, op: &'static str, error: BackendError) {
        self.lock().fail_next = Some((op, error));
    }

    /// Insert a row directly, filling `id` and `created_at` when absent.
    pub fn seed(&self, table: &str, row: Value) -> Value {
        let mut state = self.lock();
        let row = fill_defaults(&mut state, table, row);
        state.tables.entry(table.to_string()).or_default().push(row.clone());
        row
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.op == op).count()
    }

    fn record(&self, op: &'static str, target: &str) -> RtResult<()> {
        let mut state = self.lock();
        state.calls.push(Call {
            op,
            target: target.to_string(),
        });
        match state.fail_next.take() {
            Some((failing, error)) if failing == op => Err(RtError::Backend(error)),
            pending => {
                state.fail_next = pending;
                Ok(())
            }
        }
    }
}

fn fill_defaults(state: &mut State, table: &str, mut row: Value) -> Value {
    state.clock += 1;
    let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(state.clock);
    let Some(object) = row.as_object_mut() else {
        return row;
    };
    object
        .entry("id")
        .or_insert_with(|| json!(Uuid::new_v4()));
    object
        .entry("created_at")
        .or_insert_with(|| json!(stamp.to_rfc3339()));
    match table {
        "messages" => {
            object.entry("is_read").or_insert(json!(false));
        }
        "room_listings" => {
            object.entry("is_active").or_insert(json!(true));
            object.entry("view_count").or_insert(json!(0));
        }
        _ => {}
    }
    row
}

fn sort_rows(rows: &mut [Value], query: &Query) {
    rows.sort_by(|a, b| {
        for order in &query.order {
            let left = lookup(a, &order.column).unwrap_or(&Value::Null);
            let right = lookup(b, &order.column).unwrap_or(&Value::Null);
            let ordering = compare_values(left, right).unwrap_or(Ordering::Equal);
            let ordering = if order.ascending { ordering } else { ordering.reverse() };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn unique_violation(table: &str) -> BackendError {
    BackendError {
        status: 409,
        code: Some(UNIQUE_VIOLATION.to_string()),
        message: format!("duplicate key value violates unique constraint on \"{table}\""),
        details: None,
        hint: None,
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn current_user(&self) -> RtResult<Option<Principal>> {
        Ok(self.lock().principal.clone())
    }

    async fn session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    async fn set_session(&self, session: Option<Session>) {
        let mut state = self.lock();
        state.principal = session.as_ref().map(|s| s.user.clone());
        state.session = session;
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> RtResult<SignUp> {
        let mut principal = Principal::new(Uuid::new_v4());
        principal.email = Some(email.to_string());
        principal.user_metadata = metadata;
        self.lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), principal.clone()));
        Ok(SignUp {
            user: principal,
            session: None,
        })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> RtResult<Session> {
        let mut state = self.lock();
        let principal = match state.accounts.get(email) {
            Some((expected, principal)) if expected == password => principal.clone(),
            _ => {
                return Err(RtError::Backend(
                    BackendError::new(400, "Invalid login credentials").with_code("invalid_grant"),
                ))
            }
        };
        let session = Session {
            access_token: format!("token-{}", principal.id),
            refresh_token: Some("refresh".to_string()),
            token_type: "bearer".to_string(),
            expires_in: Some(3600),
            expires_at: None,
            user: principal.clone(),
        };
        state.principal = Some(principal);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> RtResult<()> {
        let mut state = self.lock();
        state.principal = None;
        state.session = None;
        Ok(())
    }

    async fn select(&self, query: &Query) -> RtResult<Vec<Value>> {
        self.record("select", &query.table)?;
        let state = self.lock();
        let mut rows: Vec<Value> = state
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        sort_rows(&mut rows, query);
        Ok(rows)
    }

    async fn insert(&self, query: &Query, row: Value) -> RtResult<Vec<Value>> {
        self.record("insert", &query.table)?;
        let mut state = self.lock();

        if let Some(racer) = state.racing.remove(&query.table) {
            let racer = fill_defaults(&mut state, &query.table, racer);
            state.tables.entry(query.table.clone()).or_default().push(racer);
        }

        if let Some(columns) = state.unique.get(&query.table).cloned() {
            let existing = state.tables.get(&query.table).cloned().unwrap_or_default();
            let clash = existing
                .iter()
                .any(|other| columns.iter().all(|c| other.get(*c) == row.get(*c)));
            if clash {
                return Err(RtError::Backend(unique_violation(&query.table)));
            }
        }

        let row = fill_defaults(&mut state, &query.table, row);
        state.tables.entry(query.table.clone()).or_default().push(row.clone());
        Ok(vec![row])
    }

    async fn update(&self, query: &Query, patch: Value) -> RtResult<Vec<Value>> {
        self.record("update", &query.table)?;
        let mut state = self.lock();
        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(&query.table) {
            for row in rows.iter_mut().filter(|r| query.matches(r)) {
                if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                    for (key, value) in fields {
                        target.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> RtResult<()> {
        self.record("delete", &query.table)?;
        let mut state = self.lock();
        if let Some(rows) = state.tables.get_mut(&query.table) {
            rows.retain(|r| !query.matches(r));
        }
        Ok(())
    }

    async fn count(&self, query: &Query) -> RtResult<Option<u64>> {
        self.record("count", &query.table)?;
        let state = self.lock();
        let count = state
            .tables
            .get(&query.table)
            .map_or(0, |rows| rows.iter().filter(|r| query.matches(r)).count());
        Ok(Some(count as u64))
    }

    async fn rpc(&self, function: &str, args: Value) -> RtResult<Value> {
        self.record("rpc", function)?;
        let mut state = self.lock();
        if function == "increment_listing_views" {
            let id = args.get("listing_uuid").cloned().unwrap_or(Value::Null);
            if let Some(rows) = state.tables.get_mut("room_listings") {
                for row in rows.iter_mut().filter(|r| r.get("id") == Some(&id)) {
                    let views = row.get("view_count").and_then(Value::as_i64).unwrap_or(0);
                    row["view_count"] = json!(views + 1);
                }
            }
        }
        Ok(Value::Null)
    }
}

/// Create a default test configuration pointing at a fake project.
pub fn create_test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.backend = BackendConfig {
        url: "https://test-project.supabase.co".to_string(),
        anon_key: "anon-key".to_string(),
        ..Default::default()
    };
    config
}

/// The composition root over a fresh fake backend.
///
/// The receiver collects outbound realtime frames; hold it for the test's
/// duration or subscriptions fail.
pub fn create_test_app() -> (RoomThere, FakeBackend, mpsc::UnboundedReceiver<String>) {
    let fake = FakeBackend::new();
    let config = create_test_config();
    let (realtime, outbound) = RealtimeClient::new(&config.backend, &config.realtime);
    let app = RoomThere::new(Arc::new(fake.clone()), realtime);
    (app, fake, outbound)
}

pub fn user(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// A listing row with the required columns.
pub fn listing_row(homeowner: Uuid, title: &str, rent: f64, discount: f64) -> Value {
    json!({
        "homeowner_id": homeowner,
        "title": title,
        "monthly_rent": rent,
        "help_discount_amount": discount,
        "amenities": [],
        "help_types_needed": [],
        "photos": [],
    })
}
