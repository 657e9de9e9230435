use super::utils::get_credentials;
use std::env;
use top5_client::SongBoard;

pub async fn handle_login(board: &SongBoard) -> Result<(), Box<dyn std::error::Error>> {
    let (email, password) = get_credentials()?;
    println!("🔐 Logging in as {email}...");
    let user = board.login(&email, &password).await?;
    println!("✅ Welcome, {}! Session saved.", user.name);
    Ok(())
}

pub async fn handle_register(board: &SongBoard, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (email, password) = get_credentials()?;
    let confirmation = env::var("TOP5_PASSWORD_CONFIRMATION").unwrap_or_else(|_| password.clone());
    println!("📝 Creating account for {email}...");
    let user = board.register(name, &email, &password, &confirmation).await?;
    println!("✅ Welcome, {}! Session saved.", user.name);
    Ok(())
}

pub async fn handle_logout(board: &SongBoard) -> Result<(), Box<dyn std::error::Error>> {
    if !board.is_authenticated() {
        println!("👤 Not logged in");
        return Ok(());
    }
    board.logout().await?;
    println!("👋 Logged out");
    Ok(())
}
