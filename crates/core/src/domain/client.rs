use std::fmt;

use serde::{Deserialize, Serialize};

use super::{loose_i64, user::UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(#[serde(deserialize_with = "loose_i64")] pub i64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: ClientId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ruc: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// Contact card of the agent that owns a client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentContact {
    #[serde(rename = "nombre", default)]
    pub first_name: Option<String>,
    #[serde(rename = "apellido", default)]
    pub last_name: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipReason {
    #[serde(rename = "cliente_de_otro_asesor")]
    OwnedByOtherAgent,
    #[serde(rename = "cliente_no_registrado")]
    NotRegistered,
    #[serde(other)]
    Other,
}

/// Answer of the ownership check for a tax id and the calling agent's number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipCheck {
    #[serde(default)]
    pub allowed: bool,
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub reason: Option<OwnershipReason>,
    #[serde(rename = "cliente", default)]
    pub client: Option<ClientRecord>,
    #[serde(rename = "asesor", default)]
    pub agent: Option<AgentContact>,
}

/// Existing client found by tax id, with its owning agent when assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientLookup {
    #[serde(rename = "cliente")]
    pub client: ClientRecord,
    #[serde(rename = "asesor", default)]
    pub agent: Option<AgentContact>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub ruc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub assigned_user_id: UserId,
}

impl NewClient {
    pub fn new(ruc: &str, assigned_user_id: UserId) -> Self {
        Self {
            ruc: normalize_ruc(ruc),
            name: None,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            address: None,
            assigned_user_id,
        }
    }
}

/// Tax ids are sent to the backend as digits only.
pub fn normalize_ruc(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
