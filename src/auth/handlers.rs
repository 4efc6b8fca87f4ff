//! Auth HTTP handlers: thin glue mapping the routes onto the `Auth` service.

use axum::{extract::State, response::Redirect, Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::{CurrentUser, SESSION_COOKIE};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetTokenForm {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordForm {
    pub email: String,
    pub reset_token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    pub email: String,
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub email: String,
}

/// POST /users — register a new account.
pub async fn register(
    State(state): State<AppState>,
    Form(body): Form<RegisterForm>,
) -> Result<Json<MessageResponse>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state
        .auth()
        .register_user(&body.email, &body.password)
        .await?;

    Ok(Json(MessageResponse {
        email: user.email,
        message: "user created".to_string(),
    }))
}

/// POST /sessions — log in; sets the session cookie on success.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(body): Form<LoginForm>,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if !state.auth().valid_login(&body.email, &body.password).await? {
        return Err(AppError::InvalidCredentials);
    }

    let session_id = state
        .auth()
        .create_session(&body.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .build();

    Ok((
        jar.add(cookie),
        Json(MessageResponse {
            email: body.email,
            message: "logged in".to_string(),
        }),
    ))
}

/// DELETE /sessions — log out the cookie's user and redirect home.
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Redirect, AppError> {
    state.auth().destroy_session(user.id).await?;
    Ok(Redirect::to("/"))
}

/// GET /profile — the cookie's user.
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse { email: user.email })
}

/// POST /reset_password — issue a reset token for the email.
pub async fn reset_password_token(
    State(state): State<AppState>,
    Form(body): Form<ResetTokenForm>,
) -> Result<Json<ResetTokenResponse>, AppError> {
    let reset_token = state.auth().get_reset_password_token(&body.email).await?;

    Ok(Json(ResetTokenResponse {
        email: body.email,
        reset_token,
    }))
}

/// PUT /reset_password — consume a reset token and store the new password.
pub async fn update_password(
    State(state): State<AppState>,
    Form(body): Form<UpdatePasswordForm>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth()
        .update_password(&body.reset_token, &body.new_password)
        .await?;

    Ok(Json(MessageResponse {
        email: body.email,
        message: "Password updated".to_string(),
    }))
}
