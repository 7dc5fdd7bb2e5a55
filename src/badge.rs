/// Toolbar badge and management-page refresh notices
use crate::config::Config;
use crate::detector::duplicate_count;
use crate::host::{BrowserHost, HostError};

/// Badge text for a duplicate count; empty hides the badge.
pub fn badge_text(count: usize) -> String {
    if count > 0 {
        count.to_string()
    } else {
        String::new()
    }
}

pub fn badge_color(count: usize, config: &Config) -> &str {
    if count > 0 {
        &config.badge_alert_color
    } else {
        &config.badge_clear_color
    }
}

async fn publish<H: BrowserHost>(host: &H, config: &Config) -> Result<usize, HostError> {
    let count = duplicate_count(host).await?;
    host.set_badge_text(&badge_text(count)).await?;
    host.set_badge_color(badge_color(count, config)).await?;
    log::debug!("Badge updated. Total duplicate tabs: {}", count);
    Ok(count)
}

/// Recount duplicates, update the badge and ask open management pages to
/// refresh. Never fails: a badge error falls back to clearing the text.
pub async fn refresh<H: BrowserHost>(host: &H, config: &Config) -> Option<usize> {
    let count = match publish(host, config).await {
        Ok(count) => Some(count),
        Err(e) => {
            log::error!("Error updating duplicate count badge: {}", e);
            if let Err(clear_error) = host.set_badge_text("").await {
                log::error!("Error clearing badge text: {}", clear_error);
            }
            None
        }
    };

    // Nobody listening just means no management page is open.
    if let Err(e) = host.broadcast_refresh().await {
        log::debug!("No management page took the refresh notice: {}", e);
    }

    count
}
