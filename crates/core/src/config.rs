// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk JSON schemas (§6 "JSON schemas").
//!
//! Every config blob carries `type` and `version` fields. Unknown fields
//! are preserved through a `#[serde(flatten)] extra` bag so a
//! read-modify-write cycle never drops data written by a newer binary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A schema version that didn't match what this binary understands.
#[derive(Debug, thiserror::Error)]
#[error("unsupported schema version for {type_tag}: got {got}, expected <= {max_supported}")]
pub struct UnsupportedSchemaVersion {
    pub type_tag: String,
    pub got: u32,
    pub max_supported: u32,
}

/// Validate that a parsed `type`/`version` pair matches what's expected.
pub fn validate_schema(
    type_tag: &str,
    expected_type: &str,
    version: u32,
    max_supported: u32,
) -> Result<(), UnsupportedSchemaVersion> {
    if type_tag != expected_type || version > max_supported {
        return Err(UnsupportedSchemaVersion {
            type_tag: type_tag.to_string(),
            got: version,
            max_supported,
        });
    }
    Ok(())
}

/// `mayor/town.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TownConfig {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub version: u32,
    pub name: String,
    pub owner: String,
    pub created_at: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TownConfig {
    pub const TYPE_TAG: &'static str = "town";
    pub const MAX_VERSION: u32 = 1;

    pub fn new(name: impl Into<String>, owner: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            type_tag: Self::TYPE_TAG.to_string(),
            version: Self::MAX_VERSION,
            name: name.into(),
            owner: owner.into(),
            created_at: created_at.into(),
            extra: HashMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), UnsupportedSchemaVersion> {
        validate_schema(&self.type_tag, Self::TYPE_TAG, self.version, Self::MAX_VERSION)
    }
}

/// A single entry in `mayor/rigs.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigRegistryEntry {
    pub git_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_reference_repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_prefix: Option<String>,
}

/// `mayor/rigs.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigsConfig {
    #[serde(rename = "type", default = "rigs_type_tag")]
    pub type_tag: String,
    #[serde(default = "rigs_max_version")]
    pub version: u32,
    #[serde(default)]
    pub rigs: HashMap<String, RigRegistryEntry>,
}

fn rigs_type_tag() -> String {
    RigsConfig::TYPE_TAG.to_string()
}

fn rigs_max_version() -> u32 {
    RigsConfig::MAX_VERSION
}

impl RigsConfig {
    pub const TYPE_TAG: &'static str = "rigs";
    pub const MAX_VERSION: u32 = 1;

    pub fn validate(&self) -> Result<(), UnsupportedSchemaVersion> {
        validate_schema(&self.type_tag, Self::TYPE_TAG, self.version, Self::MAX_VERSION)
    }
}

/// `<rig>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub version: u32,
    pub git_url: String,
    pub default_branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_prefix: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl RigConfig {
    pub const TYPE_TAG: &'static str = "rig";
    pub const MAX_VERSION: u32 = 1;

    pub fn new(git_url: impl Into<String>, default_branch: impl Into<String>) -> Self {
        Self {
            type_tag: Self::TYPE_TAG.to_string(),
            version: Self::MAX_VERSION,
            git_url: git_url.into(),
            default_branch: default_branch.into(),
            issue_prefix: None,
            extra: HashMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), UnsupportedSchemaVersion> {
        validate_schema(&self.type_tag, Self::TYPE_TAG, self.version, Self::MAX_VERSION)
    }
}

/// A named list/queue/announce/channel entry in `config/messaging.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(rename = "type", default = "messaging_type_tag")]
    pub type_tag: String,
    #[serde(default = "messaging_max_version")]
    pub version: u32,
    #[serde(default)]
    pub lists: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub queues: HashMap<String, QueueConfig>,
    #[serde(default)]
    pub announces: HashMap<String, AnnounceConfig>,
    #[serde(default)]
    pub channels: HashMap<String, ChannelConfig>,
}

fn messaging_type_tag() -> String {
    MessagingConfig::TYPE_TAG.to_string()
}

fn messaging_max_version() -> u32 {
    MessagingConfig::MAX_VERSION
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnounceConfig {
    pub retain_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub subscribers: Vec<String>,
    #[serde(default)]
    pub closed: bool,
}

impl MessagingConfig {
    pub const TYPE_TAG: &'static str = "messaging";
    pub const MAX_VERSION: u32 = 1;

    pub fn validate(&self) -> Result<(), UnsupportedSchemaVersion> {
        validate_schema(&self.type_tag, Self::TYPE_TAG, self.version, Self::MAX_VERSION)
    }
}

/// `settings/escalation.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EscalationConfig {
    #[serde(rename = "type", default = "escalation_type_tag")]
    pub type_tag: String,
    #[serde(default = "escalation_max_version")]
    pub version: u32,
    #[serde(default)]
    pub notify: Vec<String>,
}

fn escalation_type_tag() -> String {
    EscalationConfig::TYPE_TAG.to_string()
}

fn escalation_max_version() -> u32 {
    EscalationConfig::MAX_VERSION
}

impl EscalationConfig {
    pub const TYPE_TAG: &'static str = "escalation";
    pub const MAX_VERSION: u32 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn town_config_round_trips_unknown_fields() {
        let json = serde_json::json!({
            "type": "town",
            "version": 1,
            "name": "gastown",
            "owner": "alice",
            "created_at": "2026-07-26T00:00:00Z",
            "future_field": "kept",
        });
        let cfg: TownConfig = serde_json::from_value(json).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.extra.get("future_field").unwrap(), "kept");
        let back = serde_json::to_value(&cfg).unwrap();
        assert_eq!(back["future_field"], "kept");
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let cfg = TownConfig { version: 99, ..TownConfig::new("t", "o", "now") };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn wrong_type_tag_is_rejected() {
        let mut cfg = TownConfig::new("t", "o", "now");
        cfg.type_tag = "rig".to_string();
        assert!(cfg.validate().is_err());
    }
}
