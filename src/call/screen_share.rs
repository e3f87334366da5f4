use crate::error::{ClientError, Result};
use crate::media::{MediaEngine, TrackKind};

pub const SCREEN_SHARE_DENIED: &str =
    "Could not start screen sharing. Please check browser permissions.";

/// Swap the camera for a screen track.
///
/// Only one outgoing video stream at a time: the camera is unpublished
/// first and put back if screen capture cannot be started.
pub async fn start_screen_share(media: &dyn MediaEngine) -> Result<()> {
    let camera_was_published = media.is_published(TrackKind::Camera);
    if camera_was_published {
        media.unpublish(TrackKind::Camera).await?;
    }

    let started = async {
        media.create_track(TrackKind::Screen).await?;
        media.publish(TrackKind::Screen).await
    }
    .await;

    if let Err(e) = started {
        tracing::error!(error = %e, "Screen share error");
        let _ = media.close_track(TrackKind::Screen).await;
        if camera_was_published {
            if let Err(e) = media.publish(TrackKind::Camera).await {
                tracing::warn!(error = %e, "Failed to restore camera after screen share error");
            }
        }
        return Err(ClientError::Media(SCREEN_SHARE_DENIED.to_string()));
    }

    tracing::info!("Screen share started");
    Ok(())
}

/// Drop the screen track and bring the camera back
pub async fn stop_screen_share(media: &dyn MediaEngine) -> Result<()> {
    if media.is_published(TrackKind::Screen) {
        media.unpublish(TrackKind::Screen).await?;
    }
    media.close_track(TrackKind::Screen).await?;

    if media.has_track(TrackKind::Camera) && !media.is_published(TrackKind::Camera) {
        media.publish(TrackKind::Camera).await?;
    }

    tracing::info!("Screen share stopped");
    Ok(())
}
