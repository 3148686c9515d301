//! Static catalog of supported publishing platforms.
//!
//! The table is the single source of truth for which credential fields each
//! platform requires; validation and the workflow store both consult it.

use crate::{
    PubflowError, Result,
    model::{FieldDescriptor, FieldType, Platform, PlatformDescriptor},
};

const fn field(
    key: &'static str,
    label: &'static str,
    field_type: FieldType,
) -> FieldDescriptor {
    FieldDescriptor {
        key,
        label,
        field_type,
        required: true,
    }
}

static PLATFORMS: &[Platform] = &[
    Platform {
        id: "twitter",
        descriptor: PlatformDescriptor {
            name: "X/Twitter",
            icon: "𝕏",
            fields: &[
                field("apiKey", "API Key", FieldType::Password),
                field("apiSecret", "API Secret", FieldType::Password),
                field("accessToken", "Access Token", FieldType::Password),
                field("accessTokenSecret", "Access Token Secret", FieldType::Password),
            ],
        },
    },
    Platform {
        id: "telegram",
        descriptor: PlatformDescriptor {
            name: "Telegram",
            icon: "✈️",
            fields: &[
                field("botToken", "Bot Token", FieldType::Password),
                field("channelId", "Channel ID", FieldType::Text),
            ],
        },
    },
    Platform {
        id: "youtube",
        descriptor: PlatformDescriptor {
            name: "YouTube",
            icon: "▶️",
            fields: &[
                field("clientId", "Client ID", FieldType::Password),
                field("clientSecret", "Client Secret", FieldType::Password),
                field("refreshToken", "Refresh Token", FieldType::Password),
            ],
        },
    },
    Platform {
        id: "bunny",
        descriptor: PlatformDescriptor {
            name: "Bunny Stream",
            icon: "🐰",
            fields: &[
                field("apiKey", "API Key", FieldType::Password),
                field("libraryId", "Library ID", FieldType::Text),
            ],
        },
    },
];

/// All registered platforms, in display order.
pub fn list_platforms() -> &'static [Platform] {
    PLATFORMS
}

pub fn get_descriptor(platform_id: &str) -> Result<&'static PlatformDescriptor> {
    PLATFORMS
        .iter()
        .find(|p| p.id == platform_id)
        .map(|p| &p.descriptor)
        .ok_or_else(|| PubflowError::NotFound(format!("platform '{}' not found", platform_id)))
}

pub fn contains(platform_id: &str) -> bool {
    PLATFORMS.iter().any(|p| p.id == platform_id)
}
