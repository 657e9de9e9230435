use top5_client::{PageItem, PaginationController, Song};

pub fn print_ranked(songs: &[Song]) {
    if songs.is_empty() {
        println!("No approved songs yet.");
        return;
    }
    for (rank, song) in songs.iter().enumerate() {
        println!(
            "{}. {} ({} views)",
            rank + 1,
            song.title,
            song.display_views()
        );
        println!("   {}", song.youtube_url);
    }
}

pub fn print_song_row(song: &Song) {
    let suggested_by = song
        .user
        .as_ref()
        .map(|user| format!(" by {}", user.name))
        .unwrap_or_default();
    println!(
        "[{}] {} - {} ({} views){}",
        song.id,
        song.title,
        song.display_status(),
        song.display_views(),
        suggested_by
    );
}

/// Page selector, e.g. `« 1 … 4 [5] 6 … 10 »`
pub fn format_page_selector(pages: &PaginationController, viewport_width_px: u32) -> String {
    let mut parts = Vec::new();
    if pages.has_previous() {
        parts.push("«".to_string());
    }
    for item in pages.window(viewport_width_px) {
        parts.push(match item {
            PageItem::Page(n) if n == pages.current_page() => format!("[{n}]"),
            PageItem::Page(n) => n.to_string(),
            PageItem::Gap => "…".to_string(),
        });
    }
    if pages.has_next() {
        parts.push("»".to_string());
    }
    parts.join(" ")
}

pub fn print_page_footer(pages: &PaginationController, viewport_width_px: u32) {
    if let Some((first, last, total)) = pages.showing() {
        if total > 0 {
            println!("Showing {first} to {last} of {total} songs");
        }
    }
    if pages.is_visible() {
        println!("{}", format_page_selector(pages, viewport_width_px));
    }
}
