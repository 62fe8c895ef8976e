use anyhow::{Context, Result};
use tracing::debug;

use crate::league::Member;

/// Open a URL in the user's default browser
///
/// # Errors
/// Returns error if browser cannot be opened (e.g., no browser available)
pub fn open_url(url: &str) -> Result<()> {
    debug!(url, "opening browser");
    webbrowser::open(url).with_context(|| format!("Failed to open browser for URL: {}", url))
}

/// Open a manager's season history on the FPL site
pub fn open_member(member: &Member) -> Result<()> {
    open_url(&member.profile_url())
}
