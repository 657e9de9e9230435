use super::output::{print_page_footer, print_ranked, print_song_row};
use top5_client::SongBoard;

pub async fn handle_top(board: &SongBoard) -> Result<(), Box<dyn std::error::Error>> {
    println!("🏆 Top 5");
    let songs = board.top_five().await?;
    print_ranked(&songs);
    Ok(())
}

pub async fn handle_songs(
    board: &SongBoard,
    page: u32,
    viewport_width_px: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let listing = board.go_to_page(page).await?;
    let pages = board.pagination();

    if page != pages.current_page() {
        println!(
            "⚠️  Page {page} is out of range, showing page {}",
            pages.current_page()
        );
    }

    if listing.songs.is_empty() {
        println!("No songs found.");
    }
    for song in &listing.songs {
        print_song_row(song);
    }
    println!();
    print_page_footer(&pages, viewport_width_px);
    Ok(())
}

pub async fn handle_pending(board: &SongBoard) -> Result<(), Box<dyn std::error::Error>> {
    require_login(board)?;
    let songs = board.pending().await?;
    if songs.is_empty() {
        println!("✅ Nothing waiting for review");
        return Ok(());
    }
    println!("📋 {} song(s) waiting for review:", songs.len());
    for song in &songs {
        print_song_row(song);
        println!("   {}", song.youtube_url);
    }
    Ok(())
}

pub async fn handle_dashboard(board: &SongBoard) -> Result<(), Box<dyn std::error::Error>> {
    require_login(board)?;
    let stats = board.dashboard_stats().await?;
    println!("📊 Dashboard");
    println!("  Pending:  {}", stats.pending);
    println!("  Approved: {}", stats.approved);
    println!("  Total:    {}", stats.total);
    Ok(())
}

pub(super) fn require_login(board: &SongBoard) -> Result<(), Box<dyn std::error::Error>> {
    if board.is_authenticated() {
        Ok(())
    } else {
        Err("not logged in, run `top5 login` first".into())
    }
}
