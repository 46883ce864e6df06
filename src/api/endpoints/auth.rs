use crate::api::request::{Endpoint, Request};
use crate::api::types::{
  Credentials, EmailAddress, FlowToken, LoginResponse, OtpResend, OtpVerification, PasswordChange,
  PasswordReset, Profile, SignupForm,
};

pub fn login(credentials: &Credentials) -> Endpoint<LoginResponse> {
  Endpoint::new(Request::post("/auth/login").public().json(credentials))
}

pub fn signup(form: &SignupForm) -> Endpoint<FlowToken> {
  Endpoint::new(Request::post("/auth/signup").public().json(form))
}

pub fn verify_signup(verification: &OtpVerification) -> Endpoint<LoginResponse> {
  Endpoint::new(Request::post("/auth/verify-otp").public().json(verification))
}

pub fn resend_otp(payload: &OtpResend) -> Endpoint<FlowToken> {
  Endpoint::new(Request::post("/auth/resend-otp").public().json(payload))
}

pub fn forgot_password(email: &EmailAddress) -> Endpoint<FlowToken> {
  Endpoint::new(Request::post("/auth/forgot-password").public().json(email))
}

pub fn reset_password(reset: &PasswordReset) -> Endpoint<()> {
  Endpoint::new(Request::post("/auth/reset-password").public().json(reset))
}

pub fn profile() -> Endpoint<Profile> {
  Endpoint::new(Request::get("/auth/profile"))
}

pub fn change_email(email: &EmailAddress) -> Endpoint<FlowToken> {
  Endpoint::new(Request::post("/auth/change-email").json(email))
}

pub fn confirm_email_change(verification: &OtpVerification) -> Endpoint<Profile> {
  Endpoint::new(Request::post("/auth/confirm-email-change").json(verification))
}

pub fn change_password(change: &PasswordChange) -> Endpoint<()> {
  Endpoint::new(Request::put("/auth/password").json(change))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::request::Access;

  #[test]
  fn test_login_is_public_post() {
    let request = login(&Credentials {
      email: "a@b.test".to_string(),
      password: "pw".to_string(),
    })
    .into_request();

    assert_eq!(request.to_string(), "POST /auth/login");
    assert_eq!(request.access, Access::Public);
  }

  #[test]
  fn test_account_routes_require_session() {
    assert_eq!(profile().request().access, Access::Authenticated);
    assert_eq!(
      change_email(&EmailAddress {
        email: "new@b.test".to_string()
      })
      .request()
      .access,
      Access::Authenticated
    );
  }
}
