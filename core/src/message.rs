//! Events delivered to the audio system and notices it emits

use crate::reverb::RegionKey;

/// Identifies whoever sent an [`AudioEvent::Ping`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverId(pub u32);

/// Inbound events, handled by [`AudioSystem::handle_event`](crate::AudioSystem::handle_event)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioEvent {
    /// Asks whether audio is up. Answered with [`AudioNotice::ActivateTo`]
    /// once the listener is initialized.
    Ping { sender: ReceiverId },
    /// Unmute, optionally fading in from silence
    UnmuteAll { fade_in: bool },
    /// Finish a pending deactivation
    Destroy,
    /// An age finished loading (`true`) or started unloading (`false`)
    AgeLoaded { loaded: bool },
    RegionAttached(RegionKey),
    RegionDetached(RegionKey),
}

/// Outbound notices drained by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioNotice {
    /// Broadcast: the audio system became active
    Activate,
    /// Reply to a ping
    ActivateTo(ReceiverId),
    /// Broadcast: the audio system is going down
    Deactivate,
}
