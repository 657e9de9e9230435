use super::list::require_login;
use top5_client::SongBoard;

pub async fn handle_suggest(board: &SongBoard, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let song = board.suggest(url).await?;
    println!("✅ Suggested \"{}\" ({})", song.title, song.display_status());
    println!("   It will show up once an administrator approves it.");
    Ok(())
}

pub async fn handle_approve(board: &SongBoard, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    require_login(board)?;
    board.approve(id).await?;
    println!("✅ Approved song {id}");
    Ok(())
}

pub async fn handle_reject(board: &SongBoard, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    require_login(board)?;
    board.reject(id).await?;
    println!("🚫 Rejected song {id}");
    Ok(())
}

pub async fn handle_edit(
    board: &SongBoard,
    id: &str,
    title: Option<&str>,
    url: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    require_login(board)?;
    board.update(id, title, url).await?;
    println!("✏️  Updated song {id}");
    if let Some(title) = title {
        println!("   Title: {title}");
    }
    if let Some(url) = url {
        println!("   URL:   {url}");
    }
    Ok(())
}

pub async fn handle_delete(board: &SongBoard, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    require_login(board)?;
    board.delete(id).await?;
    println!("🗑️  Deleted song {id}");
    Ok(())
}
