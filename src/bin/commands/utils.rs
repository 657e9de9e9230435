use std::env;
use std::rc::Rc;
use std::sync::Arc;
use top5_client::{
    ClientConfig, SessionContext, SessionPersistence, SharedEventBroadcaster, SongApiClient,
    SongBoard,
};

/// Build a board from the environment, restoring any saved session.
pub fn build_board() -> Result<SongBoard, Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let broadcaster = Arc::new(SharedEventBroadcaster::new());

    let http_client = http_client::native::NativeClient::new();
    let api = SongApiClient::with_broadcaster(Box::new(http_client), &config, broadcaster.clone());

    let store = SessionPersistence::default_location()?;
    let session = SessionContext::restore(store, broadcaster.clone());

    Ok(SongBoard::with_session(
        Rc::new(api),
        config,
        session,
        broadcaster,
    ))
}

/// Get email and password from environment variables
pub fn get_credentials() -> Result<(String, String), Box<dyn std::error::Error>> {
    let email = env::var("TOP5_EMAIL").map_err(|_| "TOP5_EMAIL environment variable not set")?;
    let password =
        env::var("TOP5_PASSWORD").map_err(|_| "TOP5_PASSWORD environment variable not set")?;
    Ok((email, password))
}
