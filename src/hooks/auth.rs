//! Account flows.
//!
//! Multi-step flows (signup, password reset, email change) keep the token
//! from their first step in the session and consume it on success, so the
//! second step only needs what the user typed.

use std::future::Future;

use tracing::{info, warn};

use crate::api::endpoints::auth as endpoints;
use crate::api::types::{
  Credentials, EmailAddress, FlowToken, LoginResponse, OtpResend, OtpVerification, PasswordChange,
  PasswordReset, Profile, SignupForm,
};
use crate::api::{ApiClient, ApiError, Envelope};
use crate::cache::{Mutation, Query, QueryKey, QueryTag};
use crate::context::AdminContext;
use crate::session::{OneTimeToken, Session, SessionError, SessionKey};

use super::{mutation, query};

/// Where a fresh session lands.
pub const HOME_ROUTE: &str = "/dashboard";
pub const LOGIN_ROUTE: &str = "/login";
pub const VERIFY_ROUTE: &str = "/verify-otp";
pub const RESET_ROUTE: &str = "/reset-password";

fn session_error(err: SessionError) -> ApiError {
  ApiError::Session(err.to_string())
}

/// A session write the flow depends on; failure fails the mutation.
fn store(result: Result<(), SessionError>, what: &str) -> Result<(), ApiError> {
  result.map_err(|err| {
    warn!(%err, what, "failed to update session");
    session_error(err)
  })
}

/// Cleanup after the server already accepted the step; failure is only logged.
fn tidy(result: Result<(), SessionError>, what: &str) {
  if let Err(err) = result {
    warn!(%err, what, "failed to clear session value");
  }
}

fn store_login(session: &Session, response: &LoginResponse) -> Result<(), ApiError> {
  store(session.set_token(&response.token), "token")?;
  if let Err(err) = store(session.set_user(&response.user), "user") {
    // Token without user is half a session
    tidy(session.remove_token(), "token");
    return Err(err);
  }
  info!(user = %response.user.id, "signed in");
  Ok(())
}

fn stored(session: &Session, kind: OneTimeToken, flow: &str) -> Result<String, ApiError> {
  session
    .one_time(kind)
    .map_err(session_error)?
    .ok_or_else(|| ApiError::Session(format!("no {flow} in progress")))
}

/// Mutation that reads or writes the session around its request.
fn session_mutation<A, T, F, Fut>(ctx: &AdminContext, run: F) -> Mutation<A, T>
where
  A: Send + 'static,
  T: Send + 'static,
  F: Fn(ApiClient, Session, A) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Envelope<T>, ApiError>> + Send + 'static,
{
  let api = ctx.api.clone();
  let session = ctx.session.clone();
  Mutation::new(
    ctx.queries.clone(),
    ctx.notifier.clone(),
    ctx.navigator.clone(),
    move |args| run(api.clone(), session.clone(), args),
  )
}

pub fn profile(ctx: &AdminContext) -> Query<Profile> {
  query(ctx, QueryKey::new(QueryTag::Profile), endpoints::profile)
}

pub fn login(ctx: &AdminContext) -> Mutation<Credentials, LoginResponse> {
  session_mutation(ctx, |api, session, credentials: Credentials| async move {
    let envelope = api.call(endpoints::login(&credentials)).await?;
    if let Some(response) = envelope.payload() {
      store_login(&session, response)?;
    }
    Ok::<_, ApiError>(envelope)
  })
  .success_message("Welcome back")
  .error_fallback("Invalid email or password")
  .navigate_to(HOME_ROUTE)
}

/// Drop the session and every cached read, then return to the login page.
pub fn logout(ctx: &AdminContext) -> Result<(), SessionError> {
  ctx.logout()?;
  ctx.navigator.navigate(LOGIN_ROUTE);
  Ok(())
}

/// First signup step. Keeps the activation token and the resend payload.
pub fn signup(ctx: &AdminContext) -> Mutation<SignupForm, FlowToken> {
  session_mutation(ctx, |api, session, form: SignupForm| async move {
    let envelope = api.call(endpoints::signup(&form)).await?;
    if let Some(flow) = envelope.payload() {
      store(
        session.set_one_time(OneTimeToken::SignupActivation, &flow.token),
        "activation token",
      )?;
      store(
        session.set_json(
          SessionKey::OtpResend,
          &OtpResend {
            email: form.email.clone(),
            token: flow.token.clone(),
          },
        ),
        "resend payload",
      )?;
    }
    Ok::<_, ApiError>(envelope)
  })
  .success_message("Verification code sent to your email")
  .error_fallback("Could not create account")
  .navigate_to(VERIFY_ROUTE)
}

/// Second signup step: exchange the emailed code for a session.
pub fn verify_signup(ctx: &AdminContext) -> Mutation<String, LoginResponse> {
  session_mutation(ctx, |api, session, otp: String| async move {
    let token = stored(&session, OneTimeToken::SignupActivation, "signup")?;
    let envelope = api
      .call(endpoints::verify_signup(&OtpVerification { token, otp }))
      .await?;
    if let Some(response) = envelope.payload() {
      store_login(&session, response)?;
      tidy(
        session.remove_one_time(OneTimeToken::SignupActivation),
        "activation token",
      );
      tidy(session.remove(SessionKey::OtpResend), "resend payload");
    }
    Ok::<_, ApiError>(envelope)
  })
  .success_message("Account verified")
  .error_fallback("Invalid or expired code")
  .navigate_to(HOME_ROUTE)
}

/// Send the signup code again using the stored resend payload.
pub fn resend_otp(ctx: &AdminContext) -> Mutation<(), FlowToken> {
  session_mutation(ctx, |api, session, ()| async move {
    let payload: OtpResend = session
      .get_json(SessionKey::OtpResend)
      .map_err(session_error)?
      .ok_or_else(|| ApiError::Session("no signup in progress".to_string()))?;
    let envelope = api.call(endpoints::resend_otp(&payload)).await?;
    if let Some(flow) = envelope.payload() {
      store(
        session.set_one_time(OneTimeToken::SignupActivation, &flow.token),
        "activation token",
      )?;
      store(
        session.set_json(
          SessionKey::OtpResend,
          &OtpResend {
            email: payload.email.clone(),
            token: flow.token.clone(),
          },
        ),
        "resend payload",
      )?;
    }
    Ok::<_, ApiError>(envelope)
  })
  .success_message("Verification code resent")
  .error_fallback("Could not resend code")
}

pub fn forgot_password(ctx: &AdminContext) -> Mutation<String, FlowToken> {
  session_mutation(ctx, |api, session, email: String| async move {
    let envelope = api
      .call(endpoints::forgot_password(&EmailAddress { email }))
      .await?;
    if let Some(flow) = envelope.payload() {
      store(
        session.set_one_time(OneTimeToken::PasswordReset, &flow.token),
        "reset token",
      )?;
    }
    Ok::<_, ApiError>(envelope)
  })
  .success_message("Password reset code sent to your email")
  .error_fallback("Could not start password reset")
  .navigate_to(RESET_ROUTE)
}

pub fn reset_password(ctx: &AdminContext) -> Mutation<String, ()> {
  session_mutation(ctx, |api, session, password: String| async move {
    let token = stored(&session, OneTimeToken::PasswordReset, "password reset")?;
    let envelope = api
      .call(endpoints::reset_password(&PasswordReset { token, password }))
      .await?;
    if envelope.is_success() {
      tidy(
        session.remove_one_time(OneTimeToken::PasswordReset),
        "reset token",
      );
    }
    Ok::<_, ApiError>(envelope)
  })
  .success_message("Password updated, please sign in")
  .error_fallback("Could not reset password")
  .navigate_to(LOGIN_ROUTE)
}

pub fn change_email(ctx: &AdminContext) -> Mutation<String, FlowToken> {
  session_mutation(ctx, |api, session, email: String| async move {
    let envelope = api
      .call(endpoints::change_email(&EmailAddress { email }))
      .await?;
    if let Some(flow) = envelope.payload() {
      store(
        session.set_one_time(OneTimeToken::EmailChange, &flow.token),
        "email change token",
      )?;
    }
    Ok::<_, ApiError>(envelope)
  })
  .success_message("Verification code sent to your new email")
  .error_fallback("Could not change email")
}

pub fn confirm_email_change(ctx: &AdminContext) -> Mutation<String, Profile> {
  session_mutation(ctx, |api, session, otp: String| async move {
    let token = stored(&session, OneTimeToken::EmailChange, "email change")?;
    let envelope = api
      .call(endpoints::confirm_email_change(&OtpVerification { token, otp }))
      .await?;
    if envelope.is_success() {
      tidy(
        session.remove_one_time(OneTimeToken::EmailChange),
        "email change token",
      );
    }
    Ok::<_, ApiError>(envelope)
  })
  .invalidates(QueryTag::Profile)
  .success_message("Email updated")
  .error_fallback("Invalid or expired code")
}

pub fn change_password(ctx: &AdminContext) -> Mutation<PasswordChange, ()> {
  mutation(ctx, |change: PasswordChange| endpoints::change_password(&change))
    .success_message("Password changed")
    .error_fallback("Could not change password")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::serve;
  use crate::context::testing::{context, context_with};
  use crate::notify::Level;
  use crate::session::{Scope, SessionStorage};

  const LOGIN: &str = r#"{"success":true,"data":{"token":"jwt","user":{"_id":"u1","name":"Ada","role":"merchant"}}}"#;

  #[tokio::test]
  async fn test_login_stores_session_and_navigates() {
    let server = serve(vec![(200, LOGIN)]).await;
    let (ctx, recorder) = context(&server.base_url);

    login(&ctx)
      .mutate(Credentials {
        email: "ada@example.com".to_string(),
        password: "secret".to_string(),
      })
      .await
      .unwrap();

    assert_eq!(ctx.session.token().unwrap().as_deref(), Some("jwt"));
    assert_eq!(ctx.session.user().unwrap().unwrap().id, "u1");
    assert_eq!(recorder.routes(), vec![HOME_ROUTE.to_string()]);
    let recorded = &server.requests()[0];
    assert_eq!(recorded.request_line(), "POST /auth/login HTTP/1.1");
    assert_eq!(recorded.header("x-access-token"), None);
  }

  #[tokio::test]
  async fn test_failed_login_keeps_session_empty() {
    let server = serve(vec![(
      401,
      r#"{"statusCode":401,"message":"Invalid credentials"}"#,
    )])
    .await;
    let (ctx, recorder) = context(&server.base_url);

    let result = login(&ctx)
      .mutate(Credentials {
        email: "ada@example.com".to_string(),
        password: "wrong".to_string(),
      })
      .await;

    assert_eq!(result.unwrap_err().status(), Some(401));
    assert_eq!(ctx.session.token().unwrap(), None);
    assert_eq!(
      recorder.notes(),
      vec![(Level::Error, "Invalid credentials".to_string())]
    );
    assert!(recorder.routes().is_empty());
  }

  /// Storage that reads nothing and refuses every write.
  struct ReadOnlyStorage;

  impl SessionStorage for ReadOnlyStorage {
    fn get(&self, _: Scope, _: &str) -> Result<Option<String>, SessionError> {
      Ok(None)
    }

    fn set(&self, _: Scope, _: &str, _: &str) -> Result<(), SessionError> {
      Err(SessionError::Storage("disk full".to_string()))
    }

    fn remove(&self, _: Scope, _: &str) -> Result<(), SessionError> {
      Ok(())
    }

    fn remove_all(&self, _: &[(Scope, &str)]) -> Result<(), SessionError> {
      Ok(())
    }
  }

  #[tokio::test]
  async fn test_login_fails_when_session_cannot_be_stored() {
    let server = serve(vec![(200, LOGIN)]).await;
    let (ctx, recorder) = context_with(&server.base_url, Session::new(ReadOnlyStorage));

    let result = login(&ctx)
      .mutate(Credentials {
        email: "ada@example.com".to_string(),
        password: "secret".to_string(),
      })
      .await;

    assert!(matches!(result, Err(ApiError::Session(_))));
    assert_eq!(ctx.session.token().unwrap(), None);
    let notes = recorder.notes();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, Level::Error);
    assert!(recorder.routes().is_empty());
  }

  #[tokio::test]
  async fn test_forgot_password_fails_when_token_cannot_be_kept() {
    let server = serve(vec![(200, r#"{"success":true,"data":{"resetToken":"r-1"}}"#)]).await;
    let (ctx, recorder) = context_with(&server.base_url, Session::new(ReadOnlyStorage));

    let result = forgot_password(&ctx)
      .mutate("ada@example.com".to_string())
      .await;

    assert!(matches!(result, Err(ApiError::Session(_))));
    assert!(recorder.routes().is_empty());
    assert_eq!(recorder.notes()[0].0, Level::Error);
  }

  #[tokio::test]
  async fn test_signup_then_verify_consumes_activation_token() {
    let server = serve(vec![
      (200, r#"{"success":true,"data":{"activationToken":"act-1"}}"#),
      (200, LOGIN),
    ])
    .await;
    let (ctx, _) = context(&server.base_url);

    signup(&ctx)
      .mutate(SignupForm {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password: "secret".to_string(),
        shop_name: "Ada's".to_string(),
        vertical: crate::api::types::Vertical::FoodMart,
      })
      .await
      .unwrap();
    assert_eq!(
      ctx.session.one_time(OneTimeToken::SignupActivation).unwrap().as_deref(),
      Some("act-1")
    );
    assert_eq!(
      ctx.session.get_json::<OtpResend>(SessionKey::OtpResend).unwrap(),
      Some(OtpResend {
        email: "ada@example.com".to_string(),
        token: "act-1".to_string(),
      })
    );

    verify_signup(&ctx).mutate("123456".to_string()).await.unwrap();

    let body: serde_json::Value = serde_json::from_str(&server.requests()[1].body).unwrap();
    assert_eq!(body["token"], "act-1");
    assert_eq!(body["otp"], "123456");
    assert_eq!(ctx.session.token().unwrap().as_deref(), Some("jwt"));
    assert_eq!(ctx.session.one_time(OneTimeToken::SignupActivation).unwrap(), None);
    assert_eq!(
      ctx.session.get_json::<OtpResend>(SessionKey::OtpResend).unwrap(),
      None
    );
  }

  #[tokio::test]
  async fn test_reset_without_stored_token_never_hits_the_network() {
    let server = serve(vec![(200, r#"{"success":true}"#)]).await;
    let (ctx, recorder) = context(&server.base_url);

    let result = reset_password(&ctx).mutate("new-secret".to_string()).await;

    assert!(matches!(result, Err(ApiError::Session(_))));
    assert!(server.requests().is_empty());
    assert_eq!(recorder.notes().len(), 1);
    assert!(recorder.routes().is_empty());
  }

  #[tokio::test]
  async fn test_reset_password_clears_token_and_returns_to_login() {
    let server = serve(vec![(200, r#"{"success":true,"message":"Password reset"}"#)]).await;
    let (ctx, recorder) = context(&server.base_url);
    ctx
      .session
      .set_one_time(OneTimeToken::PasswordReset, "reset-1")
      .unwrap();

    reset_password(&ctx).mutate("new-secret".to_string()).await.unwrap();

    assert_eq!(ctx.session.one_time(OneTimeToken::PasswordReset).unwrap(), None);
    assert_eq!(recorder.routes(), vec![LOGIN_ROUTE.to_string()]);
  }

  #[tokio::test]
  async fn test_logout_navigates_to_login() {
    let (ctx, recorder) = context("http://127.0.0.1:9/");
    ctx.session.set_token("jwt").unwrap();

    logout(&ctx).unwrap();

    assert_eq!(ctx.session.token().unwrap(), None);
    assert_eq!(recorder.routes(), vec![LOGIN_ROUTE.to_string()]);
  }
}
