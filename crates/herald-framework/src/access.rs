//! Access control: exposure and permission levels.
//!
//! Exposure is checked first (is this the right kind of conversation?),
//! then permission. A denied command is simply not dispatched; nothing is
//! reported to the caller.

use herald_core::{Client, Message};

use crate::command::CommandDefinition;

/// Minimum privilege tier a caller needs to run a command.
///
/// Variants are ordered from least to most privileged, so a caller whose
/// highest tier is at least the required one is allowed:
///
/// | Caller is         | Highest tier |
/// |-------------------|--------------|
/// | bot owner         | `Owner`      |
/// | channel owner     | `Admin`      |
/// | moderator         | `Moderator`  |
/// | anyone else       | `User`       |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    /// No restriction.
    #[default]
    User,
    /// Moderators, channel owners and the bot owner.
    Moderator,
    /// Channel owners and the bot owner.
    Admin,
    /// Only the bot owner.
    Owner,
}

impl PermissionLevel {
    /// The highest tier the author of `message` can demonstrate.
    pub fn of_caller(client: &dyn Client, message: &dyn Message) -> Self {
        if client.is_bot_owner(message) {
            Self::Owner
        } else if client.is_channel_owner(message) {
            Self::Admin
        } else if client.is_moderator(message) {
            Self::Moderator
        } else {
            Self::User
        }
    }

    /// Whether the author of `message` satisfies this level.
    pub fn permits(self, client: &dyn Client, message: &dyn Message) -> bool {
        self == Self::User || Self::of_caller(client, message) >= self
    }
}

/// Which kind of conversation a command may be used in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExposureLevel {
    /// Public channels and private conversations.
    #[default]
    Everywhere,
    /// Public channels only.
    Public,
    /// Private conversations only.
    Private,
}

impl ExposureLevel {
    /// Whether `message` was posted in a context this level allows.
    pub fn permits(self, client: &dyn Client, message: &dyn Message) -> bool {
        match self {
            Self::Everywhere => true,
            Self::Public => !client.is_private(message),
            Self::Private => client.is_private(message),
        }
    }
}

/// Whether `definition` may be dispatched for `message`.
pub fn allow(definition: &CommandDefinition, message: &dyn Message, client: &dyn Client) -> bool {
    definition.exposure_level.permits(client, message)
        && definition.permission_level.permits(client, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::mock::{MockClient, MockMessage};

    fn client() -> MockClient {
        MockClient::new("bot")
            .owner("owner")
            .channel_owner("admin")
            .moderator("mod")
            .private_channel("dm")
    }

    fn from(user: &str) -> MockMessage {
        MockMessage::new("general", user, "?x")
    }

    #[test]
    fn test_caller_tier() {
        let client = client();
        assert_eq!(PermissionLevel::of_caller(&client, &from("owner")), PermissionLevel::Owner);
        assert_eq!(PermissionLevel::of_caller(&client, &from("admin")), PermissionLevel::Admin);
        assert_eq!(PermissionLevel::of_caller(&client, &from("mod")), PermissionLevel::Moderator);
        assert_eq!(PermissionLevel::of_caller(&client, &from("nobody")), PermissionLevel::User);
    }

    #[test]
    fn test_moderator_level_cascades_to_channel_owner() {
        let client = client();
        let level = PermissionLevel::Moderator;
        assert!(level.permits(&client, &from("mod")));
        assert!(level.permits(&client, &from("admin")));
        assert!(level.permits(&client, &from("owner")));
        assert!(!level.permits(&client, &from("nobody")));
    }

    #[test]
    fn test_admin_level() {
        let client = client();
        let level = PermissionLevel::Admin;
        assert!(!level.permits(&client, &from("mod")));
        assert!(level.permits(&client, &from("admin")));
        assert!(level.permits(&client, &from("owner")));
    }

    #[test]
    fn test_owner_level_is_exclusive() {
        let client = MockClient::new("bot")
            .owner("owner")
            .channel_owner("both")
            .moderator("both");
        let level = PermissionLevel::Owner;
        assert!(level.permits(&client, &from("owner")));
        assert!(!level.permits(&client, &from("both")));
    }

    #[test]
    fn test_user_level_always_passes() {
        let client = MockClient::new("bot");
        assert!(PermissionLevel::User.permits(&client, &from("anyone")));
    }

    #[test]
    fn test_exposure() {
        let client = client();
        let public = MockMessage::new("general", "u", "?x");
        let private = MockMessage::new("dm", "u", "?x");

        assert!(ExposureLevel::Everywhere.permits(&client, &public));
        assert!(ExposureLevel::Everywhere.permits(&client, &private));
        assert!(ExposureLevel::Public.permits(&client, &public));
        assert!(!ExposureLevel::Public.permits(&client, &private));
        assert!(ExposureLevel::Private.permits(&client, &private));
        assert!(!ExposureLevel::Private.permits(&client, &public));
    }

    #[test]
    fn test_allow_checks_exposure_before_permission() {
        let client = client();
        let definition = CommandDefinition::new("secret")
            .trigger("secret")
            .exposure(ExposureLevel::Private)
            .permission(PermissionLevel::Owner);

        assert!(allow(&definition, &MockMessage::new("dm", "owner", "?secret"), &client));
        assert!(!allow(&definition, &MockMessage::new("general", "owner", "?secret"), &client));
        assert!(!allow(&definition, &MockMessage::new("dm", "mod", "?secret"), &client));
    }
}
