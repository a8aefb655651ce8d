//! Authentication primitives: credentials, issued tokens, and sign-up input.
//!
//! Secrets are held in [`Zeroizing`] buffers and never rendered by `Debug`.

use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;
use zeroize::Zeroizing;

/// Login or sign-up input rejected before any remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("email must not be empty")]
    EmptyEmail,
}

fn required(value: &str, missing: LoginValidationError) -> Result<&str, LoginValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(missing)
    } else {
        Ok(trimmed)
    }
}

fn secret(value: &str) -> Result<Zeroizing<String>, LoginValidationError> {
    if value.is_empty() {
        return Err(LoginValidationError::EmptyPassword);
    }
    Ok(Zeroizing::new(value.to_owned()))
}

/// Username/password pair submitted to the token endpoint.
///
/// The username is trimmed; the password is kept exactly as typed, surrounding
/// whitespace included, and only rejected when empty.
///
/// # Examples
/// ```
/// use client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada@example.com ", " pw ").unwrap();
/// assert_eq!(creds.username(), "ada@example.com");
/// assert_eq!(creds.password(), " pw ");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Validate raw form input.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        Ok(Self {
            username: required(username, LoginValidationError::EmptyUsername)?.to_owned(),
            password: secret(password)?,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Bearer credential injected into authorised gateway calls.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wrap a raw bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Borrow the raw token for header construction.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Token set issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<AccessToken>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl AuthTokens {
    /// Token set holding only an access token.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: AccessToken::new(access_token),
            refresh_token: None,
            token_type: Some("bearer".to_owned()),
            expires_in: None,
            created_at: None,
        }
    }
}

/// Values collected by the sign-up form.
#[derive(Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    username: String,
    email: String,
    password: Zeroizing<String>,
    birthday: Option<NaiveDate>,
}

impl SignUpRequest {
    /// Validate sign-up input.
    ///
    /// # Examples
    /// ```
    /// use client::domain::SignUpRequest;
    ///
    /// let request = SignUpRequest::try_new("ada", "ada@example.com", "secret", None).unwrap();
    /// assert_eq!(request.login_credentials().unwrap().username(), "ada@example.com");
    /// ```
    pub fn try_new(
        username: &str,
        email: &str,
        password: &str,
        birthday: Option<NaiveDate>,
    ) -> Result<Self, LoginValidationError> {
        let username = required(username, LoginValidationError::EmptyUsername)?;
        let email = required(email, LoginValidationError::EmptyEmail)?;
        let password = secret(password)?;
        Ok(Self {
            username: username.to_owned(),
            email: email.to_owned(),
            password,
            birthday,
        })
    }

    /// Display name requested for the new account.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Email address for the new account.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Plaintext password for the new account.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Optional date of birth.
    pub fn birthday(&self) -> Option<NaiveDate> {
        self.birthday
    }

    /// Credentials for the login that follows a successful sign-up.
    ///
    /// The original email and password are reused as typed.
    pub fn login_credentials(&self) -> Result<LoginCredentials, LoginValidationError> {
        LoginCredentials::try_from_parts(&self.email, self.password())
    }
}

impl fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("birthday", &self.birthday)
            .finish_non_exhaustive()
    }
}
