pub mod auth;
pub mod list;
pub mod moderate;
pub mod output;
pub mod utils;

use clap::Subcommand;
use top5_client::SongBoard;

#[derive(Subcommand)]
pub enum Commands {
    /// Show the public top five
    Top,

    /// Browse the full song listing one page at a time
    ///
    /// Usage examples:
    /// # First page
    /// top5 songs
    ///
    /// # Third page, with the compact page selector used on phones
    /// top5 songs --page 3 --width 375
    Songs {
        /// Page to show (clamped to the available pages)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Viewport width in pixels, which decides how many page links are shown
        #[arg(long, default_value = "1024")]
        width: u32,
    },

    /// List songs waiting for review (requires login)
    Pending,

    /// Show review counts (requires login)
    Dashboard,

    /// Suggest a song by its YouTube link
    ///
    /// Usage examples:
    /// top5 suggest "https://www.youtube.com/watch?v=s9kVG2ZaTS4"
    /// top5 suggest "https://youtu.be/s9kVG2ZaTS4"
    Suggest {
        /// YouTube URL of the song
        url: String,
    },

    /// Approve a pending song (requires login)
    Approve {
        /// Song id
        id: String,
    },

    /// Reject a pending song (requires login)
    Reject {
        /// Song id
        id: String,
    },

    /// Change a song's title or YouTube link (requires login)
    ///
    /// Usage examples:
    /// top5 edit 12 --title "Rei do Gado"
    /// top5 edit 12 --url "https://youtu.be/abc123"
    Edit {
        /// Song id
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New YouTube URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Delete a song (requires login)
    Delete {
        /// Song id
        id: String,
    },

    /// Log in with TOP5_EMAIL and TOP5_PASSWORD and save the session
    Login,

    /// Create an account with TOP5_EMAIL and TOP5_PASSWORD and save the session
    Register {
        /// Display name for the new account
        #[arg(long)]
        name: String,
    },

    /// Revoke and forget the saved session
    Logout,
}

pub async fn execute_command(
    command: Commands,
    board: &SongBoard,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Top => list::handle_top(board).await,
        Commands::Songs { page, width } => list::handle_songs(board, page, width).await,
        Commands::Pending => list::handle_pending(board).await,
        Commands::Dashboard => list::handle_dashboard(board).await,
        Commands::Suggest { url } => moderate::handle_suggest(board, &url).await,
        Commands::Approve { id } => moderate::handle_approve(board, &id).await,
        Commands::Reject { id } => moderate::handle_reject(board, &id).await,
        Commands::Edit { id, title, url } => {
            moderate::handle_edit(board, &id, title.as_deref(), url.as_deref()).await
        }
        Commands::Delete { id } => moderate::handle_delete(board, &id).await,
        Commands::Login => auth::handle_login(board).await,
        Commands::Register { name } => auth::handle_register(board, &name).await,
        Commands::Logout => auth::handle_logout(board).await,
    }
}
