//! Authentication module for PetMarket
//!
//! Email/password login with an OTP challenge step, registration, and
//! Google sign-in (OAuth2 device flow whose Google token is exchanged at
//! the backend for a PetMarket session).

pub mod google;
pub mod login;
pub mod tokens;
pub mod validate;

pub use login::{login, logout, register, status};
pub use tokens::{StoredToken, TokenStore};

/// Google OAuth client configuration (public installed-app credentials)
pub struct GoogleAuthConfig {
    /// OAuth2 client ID
    pub client_id: &'static str,
    /// Installed-app client secret (not actually secret for device flow)
    pub client_secret: &'static str,
}

impl GoogleAuthConfig {
    pub fn installed() -> Self {
        Self {
            client_id: "832401673885-7h2rq1b8gdm4ue6c3p1nq0f5j9k2v8st.apps.googleusercontent.com",
            client_secret: "GOCSPX-petmarket-cli-installed-app",
        }
    }
}

impl Default for GoogleAuthConfig {
    fn default() -> Self {
        Self::installed()
    }
}
