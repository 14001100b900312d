use crate::{
    auth::{CurrentUser, LoginInput, SignupInput},
    entities::user,
    errors::ServiceError,
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::checkout::OrderResponse;

/// Account as rendered to the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub mobile_number: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
            mobile_number: model.mobile_number,
        }
    }
}

/// Session token plus the account it belongs to.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Profile page payload: the account and its orders, newest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub orders: Vec<OrderResponse>,
}

/// Register an account
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupInput,
    responses(
        (status = 201, description = "Account created and logged in", body = AuthResponse),
        (status = 400, description = "Invalid signup fields", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username or email already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> Result<(StatusCode, Json<AuthResponse>), ServiceError> {
    let (account, token) = state.services.auth.signup(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse::from(account),
        }),
    ))
}

/// Log in
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid username or password", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthResponse>, ServiceError> {
    let (account, token) = state.services.auth.login(input).await?;
    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(account),
    }))
}

/// The caller's profile and order history
#[utoipa::path(
    get,
    path = "/api/v1/auth/profile",
    responses(
        (status = 200, description = "Profile with orders, newest first", body = ProfileResponse),
        (status = 401, description = "Not logged in", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ProfileResponse>, ServiceError> {
    let account = state.services.auth.fetch_user(user.id).await?;
    let orders = state.services.orders.list_for_user(user.id).await?;

    Ok(Json(ProfileResponse {
        user: UserResponse::from(account),
        orders: orders.into_iter().map(OrderResponse::from).collect(),
    }))
}
