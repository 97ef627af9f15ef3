use crate::app::AppState;
use crate::gpa::SemesterRecord;
use crate::store::Store;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

/// User data structure representing a registered student account
///
/// This is the user document stored in the users collection, including the
/// academic identifiers collected at signup and the semester records appended
/// from the performance page.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// Email address (unique key for the account)
    pub email: String,

    /// Display name
    pub name: String,

    /// Password, stored and compared in plaintext. Known security gap kept
    /// from the original system; do not treat this store as trusted.
    pub password: String,

    /// University roll number
    pub roll_no: String,

    /// University id
    pub university_id: String,

    /// Department name
    pub department: String,

    /// Semester records in submission order
    #[serde(default)]
    pub semesters: Vec<SemesterRecord>,
}

/// Signup form data
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub roll_no: String,
    pub university_id: String,
    pub department: String,
}

/// Login form data
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// User session data
///
/// Represents an authenticated user session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Email of the authenticated user
    pub email: String,

    /// Time when the session expires
    pub expires_at: SystemTime,
}

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[A-Za-z0-9]+@[a-z]+\.[a-z]{3}$").unwrap();
}

const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Active session storage
///
/// Thread-safe map of session ids to sessions, owned by the application
/// state and passed into the handlers that need it rather than living in a
/// process-global.
#[derive(Debug, Default)]
pub struct Sessions {
    active: RwLock<HashMap<String, Session>>,
}

impl Sessions {
    /// Create a new user session
    ///
    /// # Returns
    /// * `String` - A unique session ID to place in the session cookie
    pub fn create(&self, email: &str) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let expires_at = SystemTime::now() + Duration::from_secs(SESSION_DURATION);

        let session = Session {
            email: email.to_string(),
            expires_at,
        };

        let mut sessions = self.active.write().unwrap();
        sessions.insert(session_id.clone(), session);

        session_id
    }

    /// Validate a session
    ///
    /// # Returns
    /// * `Option<String>` - The email for the session if valid and unexpired
    pub fn validate(&self, session_id: &str) -> Option<String> {
        let sessions = self.active.read().unwrap();

        if let Some(session) = sessions.get(session_id) {
            if session.expires_at > SystemTime::now() {
                return Some(session.email.clone());
            }
        }

        None
    }

    /// Drop a session, e.g. on logout
    pub fn remove(&self, session_id: &str) {
        let mut sessions = self.active.write().unwrap();
        sessions.remove(session_id);
    }
}

/// Check an email address against the accepted format
pub fn valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Register a new user
///
/// Validates the signup form and inserts the user document. The password is
/// stored as-is; see the note on [`User::password`].
///
/// # Errors
/// * Returns an error if any required field is empty
/// * Returns an error if the email is malformed
/// * Returns an error if the email is already registered
pub fn register_user(store: &Store, form: &SignupForm) -> Result<(), String> {
    if form.name.is_empty() || form.email.is_empty() || form.password.is_empty() {
        return Err("Name, email and password cannot be empty".to_string());
    }

    if !valid_email(&form.email) {
        return Err("Invalid email format! Please enter a valid email.".to_string());
    }

    store.insert_user(User {
        email: form.email.clone(),
        name: form.name.clone(),
        password: form.password.clone(),
        roll_no: form.roll_no.clone(),
        university_id: form.university_id.clone(),
        department: form.department.clone(),
        semesters: Vec::new(),
    })
}

/// Verify user credentials
///
/// # Returns
/// * `Result<bool, String>` - True if the email exists and the password
///   matches, false otherwise, or an error if the store cannot be read
pub fn verify_user(store: &Store, email: &str, password: &str) -> Result<bool, String> {
    match store.get_user(email)? {
        Some(user) => Ok(user.password == password),
        None => Ok(false),
    }
}

// Web handler functions below

/// Handle user registration
///
/// Processes signup form submissions and creates a new user account, then
/// sends the user to the login page with a flash-style message.
pub async fn handle_signup(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Redirect {
    match register_user(&state.store, &form) {
        Ok(()) => {
            log::info!("new signup: {}", form.email);
            Redirect::to("/login?success=Sign-Up+Successful%21+Please+login.")
        }
        Err(e) => {
            // Duplicate emails bounce to login like the original; everything
            // else re-displays the signup form with the message.
            if e.starts_with("Email already exists") {
                Redirect::to(&format!("/login?error={}", urlencoding::encode(&e)))
            } else {
                Redirect::to(&format!("/signup?error={}", urlencoding::encode(&e)))
            }
        }
    }
}

/// Handle user login requests
///
/// Validates credentials and creates a session cookie on success.
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if !valid_email(&form.email) {
        return Redirect::to("/login?error=Invalid+email+format%21+Please+enter+a+valid+email.")
            .into_response();
    }

    match verify_user(&state.store, &form.email, &form.password) {
        Ok(true) => {
            let session_id = state.sessions.create(&form.email);
            let cookie = Cookie::new("session", session_id);
            log::info!("login: {}", form.email);
            (jar.add(cookie), Redirect::to("/dashboard")).into_response()
        }
        Ok(false) => {
            Redirect::to("/login?error=Login+failed.+Check+your+email+or+password.")
                .into_response()
        }
        Err(e) => {
            log::error!("login failed against the store: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error").into_response()
        }
    }
}

/// Handle user logout
///
/// Drops the server-side session and clears the cookie.
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get("session") {
        state.sessions.remove(cookie.value());
    }

    let cookie = Cookie::new("session", "");
    (jar.add(cookie), Redirect::to("/"))
}

/// Authentication middleware
///
/// Checks the session cookie against the shared session map and, when valid,
/// injects the authenticated email into request extensions for downstream
/// handlers. Requests without a valid session are redirected to the login
/// page with a message.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    if let Some(session_cookie) = jar.get("session") {
        if let Some(email) = state.sessions.validate(session_cookie.value()) {
            request.extensions_mut().insert(AuthedUser(email));
            return next.run(request).await;
        }
    }

    Redirect::to("/login?error=You+need+to+log+in+first.").into_response()
}

/// Authenticated user identity, inserted by [`require_auth`] and extracted by
/// handlers behind it.
#[derive(Debug, Clone)]
pub struct AuthedUser(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.init().unwrap();
        (dir, store)
    }

    fn signup(email: &str) -> SignupForm {
        SignupForm {
            name: "Kai Iyer".to_string(),
            email: email.to_string(),
            password: "hunter2".to_string(),
            roll_no: "21CS100".to_string(),
            university_id: "U-4471".to_string(),
            department: "CSE".to_string(),
        }
    }

    #[test]
    fn email_format_matches_the_original_pattern() {
        assert!(valid_email("kai123@uni.edu"));
        assert!(!valid_email("kai@uni.e"));
        assert!(!valid_email("kai.iyer@uni.edu")); // dot in local part not accepted
        assert!(!valid_email("kai@UNI.edu"));
        assert!(!valid_email("kai@uni.info")); // TLD must be exactly three letters
        assert!(!valid_email(""));
    }

    #[test]
    fn register_then_verify_round_trip() {
        let (_dir, store) = test_store();
        register_user(&store, &signup("kai@uni.edu")).unwrap();

        assert_eq!(verify_user(&store, "kai@uni.edu", "hunter2"), Ok(true));
        assert_eq!(verify_user(&store, "kai@uni.edu", "wrong"), Ok(false));
        assert_eq!(verify_user(&store, "nobody@uni.edu", "hunter2"), Ok(false));
    }

    #[test]
    fn registration_rejects_bad_input() {
        let (_dir, store) = test_store();

        let mut form = signup("kai@uni.edu");
        form.password = String::new();
        assert!(register_user(&store, &form).is_err());

        let form = signup("not-an-email");
        assert!(register_user(&store, &form).is_err());

        register_user(&store, &signup("kai@uni.edu")).unwrap();
        assert!(register_user(&store, &signup("kai@uni.edu")).is_err());
        assert_eq!(store.users().unwrap().len(), 1);
    }

    #[test]
    fn sessions_resolve_to_their_email() {
        let sessions = Sessions::default();
        let session_id = sessions.create("kai@uni.edu");
        assert_eq!(sessions.validate(&session_id), Some("kai@uni.edu".to_string()));
        assert_eq!(sessions.validate("not-a-session"), None);

        sessions.remove(&session_id);
        assert_eq!(sessions.validate(&session_id), None);
    }
}
