use std::net::SocketAddr;

use axum::{Extension, Router, response::Redirect, routing::get};
use time::Duration;
use tower_cookie_state::{
    Authentication, CookieSettings, CookieStateConfig, CookieStateLayer, EncryptionKey, Flash,
    SameSite, Session, SigningKey, codec,
};
use tower_cookies::Cookies;

async fn index(
    Extension(cookies): Extension<Cookies>,
    Extension(config): Extension<CookieStateConfig>,
    mut session: Session,
    authentication: Authentication,
    flash: Flash,
) -> String {
    let n: usize = session
        .get("n")
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);
    session.put("n", (n + 1).to_string());
    match codec::session_cookie(&config, &session) {
        Ok(cookie) => cookies.add(cookie),
        Err(err) => tracing::error!(err = %err, "session cookie encode failed"),
    }
    if flash.is_discard() {
        cookies.add(config.removal_cookie(config.flash().name()));
    }

    format!(
        "n={n} user={} flash={}",
        authentication.authenticated_user().unwrap_or("-"),
        flash.get("success").unwrap_or("-"),
    )
}

async fn login(
    Extension(cookies): Extension<Cookies>,
    Extension(config): Extension<CookieStateConfig>,
    mut authentication: Authentication,
) -> Redirect {
    authentication.login("demo", false);
    let mut flash = Flash::new();
    flash.set_success("Logged in");

    match (
        codec::authentication_cookie(&config, &authentication),
        codec::flash_cookie(&config, &flash, None),
    ) {
        (Ok(authentication), Ok(flash)) => {
            cookies.add(authentication);
            cookies.add(flash);
        }
        (Err(err), _) | (_, Err(err)) => {
            tracing::error!(err = %err, "login cookie encode failed");
        }
    }

    Redirect::to("/")
}

#[tokio::main]
async fn main() {
    let sign_key = SigningKey::generate();
    let config = CookieStateConfig::new(sign_key.clone())
        // Default: "session", 1 day, signed only
        .with_session(
            CookieSettings::new("session", sign_key.clone())
                .with_encryption(EncryptionKey::generate())
                .with_ttl(Duration::hours(1)),
        )
        // Default: "authentication", 1 hour
        .with_authentication(CookieSettings::new("authentication", sign_key))
        // Default: SameSite::Strict
        .with_same_site(SameSite::Lax)
        // Default: true (set to false for local HTTP development)
        .with_secure(false)
        // Default: "/"
        .with_path("/")
        // Default: None
        .without_domain();

    let app = Router::new()
        .route("/", get(index))
        .route("/login", get(login))
        .layer(Extension(config.clone()))
        .layer(CookieStateLayer::new(config));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("tcp listener binds successfully");
    let local_addr = listener.local_addr().expect("local address is available");
    println!("listening at http://{local_addr}");

    axum::serve(listener, app)
        .await
        .expect("server runs successfully");
}
