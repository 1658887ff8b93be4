//! Account handlers: level summaries, order recording and interface choice.
//!
//! Level and features are derived from `order_count` on every response and
//! never stored.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pressly_core::level::{
    Feature, LevelChange, LevelSummary, SessionProfile, record_completed_order,
    resolve_preferred_interface,
};
use pressly_core::store::Repository;
use pressly_core::{Account, AccountId, InterfaceKind, Role};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Build the accounts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/accounts", get(index))
        .route("/api/accounts/{id}", get(show).put(upsert))
        .route("/api/accounts/{id}/orders", post(record_order))
        .route("/api/accounts/{id}/interface", put(set_interface))
}

/// An account with everything derived from it.
#[derive(Debug, Serialize)]
pub struct AccountView {
    #[serde(flatten)]
    pub account: Account,
    pub level: LevelSummary,
    pub interface: InterfaceKind,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        let level = LevelSummary::for_account(&account);
        let interface = resolve_preferred_interface(&SessionProfile::from(&account));
        Self {
            account,
            level,
            interface,
        }
    }
}

/// Body for creating or renaming an account.
#[derive(Debug, Deserialize)]
pub struct UpsertAccountRequest {
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Body for setting or clearing the interface preference.
#[derive(Debug, Deserialize)]
pub struct InterfaceRequest {
    /// `null` clears the preference and falls back to the derived default.
    pub interface: Option<InterfaceKind>,
}

/// Response after an order was recorded.
#[derive(Debug, Serialize)]
pub struct OrderRecorded {
    pub account: AccountView,
    pub change: LevelChange,
    pub leveled_up: bool,
    pub unlocked_features: Vec<Feature>,
}

async fn load(state: &AppState, id: AccountId) -> Result<Account> {
    let account = Repository::<Account>::get(state.store(), id).await?;
    account.ok_or_else(|| AppError::NotFound(format!("account {id}")))
}

/// List all accounts.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<AccountView>>> {
    let accounts = Repository::<Account>::list(state.store()).await?;
    Ok(Json(accounts.into_iter().map(AccountView::from).collect()))
}

/// Show one account with its level summary and resolved interface.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<Json<AccountView>> {
    Ok(Json(load(&state, id).await?.into()))
}

/// Create an account, or update name and role of an existing one.
///
/// Order history and interface preference survive updates. An omitted role
/// means consumer on create and leaves the role unchanged on update.
///
/// # Errors
///
/// Returns `BadRequest` for a blank name, or a store error.
#[instrument(skip(state, body), fields(account_id = %id))]
pub async fn upsert(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Json(body): Json<UpsertAccountRequest>,
) -> Result<(StatusCode, Json<AccountView>)> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    let _guard = state.lock_account_writes().await;
    let existing = Repository::<Account>::get(state.store(), id).await?;
    let (account, status) = match existing {
        Some(mut account) => {
            account.name = name.to_string();
            if let Some(role) = body.role {
                account.role = role;
            }
            (account, StatusCode::OK)
        }
        None => (
            Account::new(id, name, body.role.unwrap_or_default()),
            StatusCode::CREATED,
        ),
    };
    state.store().put(account.clone()).await?;

    tracing::info!(role = %account.role, created = status == StatusCode::CREATED, "Account saved");
    Ok((status, Json(account.into())))
}

/// Count a completed order and report any level change.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id, or a store error.
#[instrument(skip(state), fields(account_id = %id))]
pub async fn record_order(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<Json<OrderRecorded>> {
    let _guard = state.lock_account_writes().await;
    let mut account = load(&state, id).await?;
    let change = record_completed_order(&mut account, Utc::now());
    state.store().put(account.clone()).await?;

    let unlocked_features = change.unlocked_features();
    if change.leveled_up() {
        tracing::info!(
            previous = %change.previous,
            current = %change.current,
            order_count = account.order_count,
            "Account leveled up"
        );
        add_breadcrumb(
            "level",
            "Account leveled up",
            &[
                ("account_id", id.to_string()),
                ("level", change.current.to_string()),
            ],
        );
    }

    Ok(Json(OrderRecorded {
        account: account.into(),
        leveled_up: change.leveled_up(),
        change,
        unlocked_features,
    }))
}

/// Set or clear the explicit interface preference.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id, or a store error.
#[instrument(skip(state, body), fields(account_id = %id))]
pub async fn set_interface(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Json(body): Json<InterfaceRequest>,
) -> Result<Json<AccountView>> {
    let _guard = state.lock_account_writes().await;
    let mut account = load(&state, id).await?;
    account.interface_preference = body.interface;
    state.store().put(account.clone()).await?;

    Ok(Json(account.into()))
}
