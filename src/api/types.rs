//! Resource identity, status, and snapshot types shared by the API client and
//! the reconciliation engine.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps the provided value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrows the inner string.
            #[must_use]
            pub const fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

newtype!(
    /// Provider identifier of a resource (the `metadata.id` field).
    ResourceId
);

/// Kinds of remote resource the provider manages.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResourceKind {
    /// Compute instance served by the compute service.
    Instance,
    /// Compute cluster served by the compute service (list lookup only).
    ComputeCluster,
    /// Virtual network served by the region service.
    Network,
    /// Security group served by the region service.
    SecurityGroup,
    /// File storage served by the region service.
    FileStorage,
}

impl ResourceKind {
    /// Title-cased label used in user-facing summaries.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Instance => "Instance",
            Self::ComputeCluster => "Compute Cluster",
            Self::Network => "Network",
            Self::SecurityGroup => "Security Group",
            Self::FileStorage => "File Storage",
        }
    }

    /// Lower-case label used inside sentences.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::ComputeCluster => "compute cluster",
            Self::Network => "network",
            Self::SecurityGroup => "security group",
            Self::FileStorage => "file storage",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a single remote resource.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ResourceTarget {
    /// Resource kind, which selects the endpoint.
    pub kind: ResourceKind,
    /// Provider identifier.
    pub id: ResourceId,
}

impl ResourceTarget {
    /// Builds a target from a kind and identifier.
    #[must_use]
    pub fn new(kind: ResourceKind, id: impl Into<ResourceId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.name(), self.id)
    }
}

/// Lifecycle status reported by the control plane for a resource.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum ProvisioningStatus {
    /// Status not yet known; also used for resources not yet visible.
    #[default]
    Unknown,
    /// Provisioning is in progress.
    Provisioning,
    /// Provisioning completed.
    Provisioned,
    /// Teardown is in progress.
    Deprovisioning,
    /// Provisioning failed.
    Error,
    /// Any value this client does not recognise, kept verbatim.
    Other(String),
}

impl ProvisioningStatus {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "unknown",
            Self::Provisioning => "provisioning",
            Self::Provisioned => "provisioned",
            Self::Deprovisioning => "deprovisioning",
            Self::Error => "error",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<&str> for ProvisioningStatus {
    fn from(value: &str) -> Self {
        match value {
            "unknown" => Self::Unknown,
            "provisioning" => Self::Provisioning,
            "provisioned" => Self::Provisioned,
            "deprovisioning" => Self::Deprovisioning,
            "error" => Self::Error,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for ProvisioningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProvisioningStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProvisioningStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from(value.as_str()))
    }
}

/// A single name/value tag attached to a resource.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key.
    pub name: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Builds a tag from a name and value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The subset of a resource's `metadata` block the engine observes.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    /// Provider identifier.
    pub id: String,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Current lifecycle status.
    #[serde(default)]
    pub provisioning_status: ProvisioningStatus,
    /// Tags, absent when the resource carries none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

/// A resource as currently reported by the control plane.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceSnapshot {
    /// Decoded metadata used for reconciliation.
    pub metadata: ResourceMetadata,
    /// Raw JSON body, kept for the caller's own mapping.
    pub body: serde_json::Value,
}

impl ResourceSnapshot {
    /// Builds a snapshot from metadata alone, synthesising a minimal body.
    #[must_use]
    pub fn from_metadata(metadata: ResourceMetadata) -> Self {
        let body = serde_json::json!({ "metadata": &metadata });
        Self { metadata, body }
    }

    /// Decodes a snapshot from a resource body carrying a `metadata` object.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] when `metadata` is
    /// missing or malformed.
    pub fn from_body(body: serde_json::Value) -> Result<Self, serde_json::Error> {
        let raw = body
            .get("metadata")
            .ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("metadata"))?;
        let metadata = ResourceMetadata::deserialize(raw)?;
        Ok(Self { metadata, body })
    }

    /// Provider identifier of the resource.
    #[must_use]
    pub fn id(&self) -> &str {
        self.metadata.id.as_str()
    }

    /// Current provisioning status.
    #[must_use]
    pub const fn status(&self) -> &ProvisioningStatus {
        &self.metadata.provisioning_status
    }

    /// Tags carried by the resource, if any.
    #[must_use]
    pub fn tags(&self) -> Option<&[Tag]> {
        self.metadata.tags.as_deref()
    }
}
