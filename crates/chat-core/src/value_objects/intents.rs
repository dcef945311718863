//! Gateway intents bitflags
//!
//! Declares which event categories a gateway session subscribes to.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Gateway intent flags sent with Identify
    ///
    /// Serialized as a plain integer in the Identify payload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u64 {
        /// Guild create/update/delete, roles, channels, threads
        const GUILDS                    = 1 << 0;
        /// Member add/update/remove (privileged)
        const GUILD_MEMBERS             = 1 << 1;
        /// Ban add/remove
        const GUILD_BANS                = 1 << 2;
        /// Emoji and sticker updates
        const GUILD_EMOJIS_AND_STICKERS = 1 << 3;
        const GUILD_INTEGRATIONS        = 1 << 4;
        const GUILD_WEBHOOKS            = 1 << 5;
        const GUILD_INVITES             = 1 << 6;
        const GUILD_VOICE_STATES        = 1 << 7;
        /// Presence updates (privileged)
        const GUILD_PRESENCES           = 1 << 8;
        const GUILD_MESSAGES            = 1 << 9;
        const GUILD_MESSAGE_REACTIONS   = 1 << 10;
        const GUILD_MESSAGE_TYPING      = 1 << 11;
        const DIRECT_MESSAGES           = 1 << 12;
        const DIRECT_MESSAGE_REACTIONS  = 1 << 13;
        const DIRECT_MESSAGE_TYPING     = 1 << 14;
        const GUILD_SCHEDULED_EVENTS    = 1 << 16;

        /// Everything except presences and typing (14079)
        const DEFAULT = Self::GUILDS.bits()
            | Self::GUILD_MEMBERS.bits()
            | Self::GUILD_BANS.bits()
            | Self::GUILD_EMOJIS_AND_STICKERS.bits()
            | Self::GUILD_INTEGRATIONS.bits()
            | Self::GUILD_WEBHOOKS.bits()
            | Self::GUILD_INVITES.bits()
            | Self::GUILD_VOICE_STATES.bits()
            | Self::GUILD_MESSAGES.bits()
            | Self::GUILD_MESSAGE_REACTIONS.bits()
            | Self::DIRECT_MESSAGES.bits()
            | Self::DIRECT_MESSAGE_REACTIONS.bits();

        /// Intents that must be enabled for the application before use
        const PRIVILEGED = Self::GUILD_MEMBERS.bits() | Self::GUILD_PRESENCES.bits();
    }
}

impl Intents {
    /// Check whether any privileged intent is requested
    #[inline]
    pub fn is_privileged(&self) -> bool {
        self.intersects(Intents::PRIVILEGED)
    }

    /// Parse from a decimal string, dropping unknown bits
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        s.trim().parse::<u64>().map(Intents::from_bits_truncate)
    }
}

impl Default for Intents {
    fn default() -> Self {
        Intents::DEFAULT
    }
}

impl fmt::Display for Intents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl Serialize for Intents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(Intents::from_bits_truncate(bits))
    }
}

impl From<u64> for Intents {
    fn from(bits: u64) -> Self {
        Intents::from_bits_truncate(bits)
    }
}

impl From<Intents> for u64 {
    fn from(intents: Intents) -> Self {
        intents.bits()
    }
}
