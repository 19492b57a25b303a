//! Admin and user accounts, login, and admin checks.
//!
//! Passwords are bcrypt-hashed off the async runtime with
//! [`tokio::task::spawn_blocking`]. Hashes are never serialized.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, StoreError};
use crate::models::{Person, PersonUpdate, Role};
use crate::state::AppState;

// ---

/// bcrypt work factor for stored admin passwords.
const BCRYPT_COST: u32 = 10;

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/admins", post(add_admin).get(list_people))
        .route(
            "/api/admins/{id}",
            get(get_admin).put(update_admin).delete(delete_admin),
        )
        .route("/api/admins/{id}/check", get(check_admin))
        .route("/api/login", post(login))
        .route("/api/users", post(add_user).get(list_people))
        .route("/api/users/{id}", get(get_user))
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

fn message(message: &'static str) -> Json<MessageResponse> {
    Json(MessageResponse { message })
}

#[derive(Debug, Default, Deserialize)]
struct NewAdminRequest {
    #[serde(default, alias = "adminId")]
    id: Option<String>,
    #[serde(default, alias = "adminName")]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "adminPass")]
    password: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpdateAdminRequest {
    #[serde(default, alias = "adminName")]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "adminPass")]
    password: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NewUserRequest {
    #[serde(default, alias = "userId")]
    id: Option<String>,
    #[serde(default, alias = "userName")]
    name: Option<String>,
    #[serde(default, alias = "useremail")]
    email: Option<String>,
    #[serde(default, alias = "userphone")]
    phone: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    id: String,
    role: Role,
    email: String,
}

#[derive(Debug, Serialize)]
struct RoleResponse {
    role: Role,
}

#[derive(Debug, Serialize)]
struct UserCreated {
    message: &'static str,
    user: Person,
}

/// Unwrap a required field, treating blank strings as missing.
fn required(field: Option<String>) -> Result<String, AppError> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("All fields are required.".to_string()))
}

/// Turn a store uniqueness violation into `conflict`; other failures stay 500s.
fn on_duplicate(conflict: AppError) -> impl FnOnce(StoreError) -> AppError {
    move |e| match e {
        StoreError::Duplicate(_) => conflict,
        other => other.into(),
    }
}

async fn hash_password(password: String) -> Result<String, AppError> {
    // ---
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    // ---
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password check task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password check failed: {e}")))
}

/// Handle `POST /api/admins`.
async fn add_admin(
    State(state): State<AppState>,
    Json(request): Json<NewAdminRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // ---
    let id = required(request.id)?;
    let name = required(request.name)?;
    let email = required(request.email)?;
    let password = required(request.password)?;
    let phone = required(request.phone)?;
    let date = required(request.date)?;

    let store = &state.store;
    if store.get_person(&id).await?.is_some() || store.find_person_by_email(&email).await?.is_some()
    {
        return Err(AppError::BadRequest("Admin already exists.".to_string()));
    }

    let admin = Person {
        id,
        role: Role::Admin,
        name,
        email,
        phone,
        date,
        password_hash: Some(hash_password(password).await?),
    };
    store
        .insert_person(&admin)
        .await
        .map_err(on_duplicate(AppError::BadRequest(
            "Admin already exists.".to_string(),
        )))?;

    info!("Admin added with id {}", admin.id);
    Ok(message("Admin registered successfully!"))
}

/// Handle `GET /api/admins` and `GET /api/users`: every account.
async fn list_people(State(state): State<AppState>) -> Result<Json<Vec<Person>>, AppError> {
    Ok(Json(state.store.list_people().await?))
}

/// Handle `GET /api/admins/{id}`.
async fn get_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Person>, AppError> {
    state
        .store
        .get_person(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Admin not found.".to_string()))
}

/// Handle `PUT /api/admins/{id}`. A new password is rehashed.
async fn update_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAdminRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // ---
    if let Some(email) = &request.email {
        if let Some(owner) = state.store.find_person_by_email(email).await? {
            if owner.id != id {
                return Err(AppError::Conflict("Email already in use.".to_string()));
            }
        }
    }

    let password_hash = match request.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };

    let update = PersonUpdate {
        name: request.name,
        email: request.email,
        phone: request.phone,
        date: request.date,
        password_hash,
    };

    let updated = state
        .store
        .update_person(&id, &update)
        .await
        .map_err(on_duplicate(AppError::Conflict(
            "Email already in use.".to_string(),
        )))?;
    if !updated {
        return Err(AppError::NotFound("Admin not found.".to_string()));
    }

    info!("Admin {} updated", id);
    Ok(message("Admin updated successfully."))
}

/// Handle `DELETE /api/admins/{id}`.
async fn delete_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    // ---
    if !state.store.delete_person(&id).await? {
        return Err(AppError::NotFound("Admin not found.".to_string()));
    }
    info!("Admin {} deleted", id);
    Ok(message("Admin deleted successfully."))
}

/// Handle `GET /api/admins/{id}/check`: 403 unless the account is an admin.
async fn check_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RoleResponse>, AppError> {
    // ---
    let person = state
        .store
        .get_person(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found.".to_string()))?;

    if person.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Forbidden: Not an authorized admin.".to_string(),
        ));
    }
    Ok(Json(RoleResponse { role: person.role }))
}

/// Handle `POST /api/login`.
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    // ---
    let person = state
        .store
        .find_person_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::BadRequest("Admin data is incorrect.".to_string()))?;

    let valid = match person.password_hash.clone() {
        Some(hash) => verify_password(request.password, hash).await?,
        None => false,
    };
    if !valid {
        warn!("Failed login for {}", person.id);
        return Err(AppError::Unauthorized("Incorrect password.".to_string()));
    }

    info!("Login succeeded for {}", person.id);
    Ok(Json(LoginResponse {
        id: person.id,
        role: person.role,
        email: person.email,
    }))
}

/// Handle `POST /api/users`.
async fn add_user(
    State(state): State<AppState>,
    Json(request): Json<NewUserRequest>,
) -> Result<(StatusCode, Json<UserCreated>), AppError> {
    // ---
    let id = required(request.id)?;
    let name = required(request.name)?;
    let email = required(request.email)?;
    let phone = required(request.phone)?;
    let date = required(request.date)?;

    let store = &state.store;
    if store.get_person(&id).await?.is_some() || store.find_person_by_email(&email).await?.is_some()
    {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let user = Person {
        id,
        role: Role::User,
        name,
        email,
        phone,
        date,
        password_hash: None,
    };
    store
        .insert_person(&user)
        .await
        .map_err(on_duplicate(AppError::Conflict(
            "User already exists".to_string(),
        )))?;

    info!("User added with id {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(UserCreated {
            message: "User successfully registered",
            user,
        }),
    ))
}

/// Handle `GET /api/users/{id}`.
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Person>, AppError> {
    state
        .store
        .get_person(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
}
