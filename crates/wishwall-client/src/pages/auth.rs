use std::sync::Arc;

use tracing::{info, warn};

use wishwall_types::api::{AuthResponse, MIN_PASSWORD_LEN, normalize_email};

use crate::backend::Backend;
use crate::error::ClientError;
use crate::router::Route;
use crate::storage::{KvStore, save_session};

/// State shared by the sign-up and sign-in forms.
struct AuthForm {
    backend: Arc<dyn Backend>,
    store: Arc<dyn KvStore>,
    email: String,
    password: String,
    loading: bool,
    error: Option<String>,
}

impl AuthForm {
    fn new(backend: Arc<dyn Backend>, store: Arc<dyn KvStore>) -> Self {
        Self {
            backend,
            store,
            email: String::new(),
            password: String::new(),
            loading: false,
            error: None,
        }
    }

    fn check(&self) -> Result<String, String> {
        let email = normalize_email(&self.email).ok_or_else(|| "Please enter a valid email address".to_string())?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!("Password must be at least {MIN_PASSWORD_LEN} characters"));
        }
        Ok(email)
    }

    fn finish(&mut self, result: Result<AuthResponse, ClientError>, context: &str) -> Option<Route> {
        self.loading = false;
        match result {
            Ok(auth) => {
                save_session(self.store.as_ref(), &auth.token);
                self.password.clear();
                info!("signed in as {}", auth.email);
                Some(Route::Wall(auth.wall_id))
            }
            Err(e) => {
                warn!("{}: {}", context, e);
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

macro_rules! auth_page {
    ($name:ident) => {
        impl $name {
            pub fn new(backend: Arc<dyn Backend>, store: Arc<dyn KvStore>) -> Self {
                Self {
                    form: AuthForm::new(backend, store),
                }
            }

            pub fn set_email(&mut self, email: impl Into<String>) {
                self.form.email = email.into();
            }

            pub fn set_password(&mut self, password: impl Into<String>) {
                self.form.password = password.into();
            }

            pub fn email(&self) -> &str {
                &self.form.email
            }

            pub fn loading(&self) -> bool {
                self.form.loading
            }

            pub fn error(&self) -> Option<&str> {
                self.form.error.as_deref()
            }

            pub fn back(&self) -> Route {
                Route::Landing
            }
        }
    };
}

/// "Create Account": registers and lands the user on their new wall.
pub struct SignUpPage {
    form: AuthForm,
}

auth_page!(SignUpPage);

impl SignUpPage {
    /// Returns where to navigate on success; on failure `error()` says why.
    pub async fn submit(&mut self) -> Option<Route> {
        if self.form.loading {
            return None;
        }
        self.form.error = None;
        let email = match self.form.check() {
            Ok(email) => email,
            Err(msg) => {
                self.form.error = Some(msg);
                return None;
            }
        };

        self.form.loading = true;
        let result = self.form.backend.sign_up(&email, &self.form.password).await;
        self.form.finish(result, "Failed to create account")
    }

    pub fn go_to_sign_in(&self) -> Route {
        Route::SignIn
    }
}

/// "Welcome Back": signs in and opens the user's wall.
pub struct SignInPage {
    form: AuthForm,
}

auth_page!(SignInPage);

impl SignInPage {
    pub async fn submit(&mut self) -> Option<Route> {
        if self.form.loading {
            return None;
        }
        self.form.error = None;
        let Some(email) = normalize_email(&self.form.email) else {
            self.form.error = Some("Please enter a valid email address".into());
            return None;
        };
        if self.form.password.is_empty() {
            self.form.error = Some("Please enter your password".into());
            return None;
        }

        self.form.loading = true;
        let result = self.form.backend.sign_in(&email, &self.form.password).await;
        self.form.finish(result, "Failed to sign in")
    }

    pub fn go_to_sign_up(&self) -> Route {
        Route::SignUp
    }
}
