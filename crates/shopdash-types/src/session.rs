use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which shops a chat session (and its requests) is scoped to.
///
/// Serializes untagged: `null` for all shops, a number for one shop,
/// an array for several.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShopScope {
    #[default]
    All,
    Single(i64),
    Many(Vec<i64>),
}

impl ShopScope {
    /// Shop ids to send on the wire; `None` means no filter.
    pub fn shop_ids(&self) -> Option<Vec<i64>> {
        match self {
            ShopScope::All => None,
            ShopScope::Single(id) => Some(vec![*id]),
            ShopScope::Many(ids) => Some(ids.clone()),
        }
    }

    pub fn from_ids(ids: Vec<i64>) -> Self {
        match ids.as_slice() {
            [] => ShopScope::All,
            [id] => ShopScope::Single(*id),
            _ => ShopScope::Many(ids),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ShopScope::All => "all shops".to_string(),
            ShopScope::Single(id) => format!("shop {}", id),
            ShopScope::Many(ids) => {
                let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                format!("shops {}", ids.join(", "))
            }
        }
    }
}

/// Body of the session-creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_ids: Option<Vec<i64>>,
}

impl SessionRequest {
    pub fn for_scope(scope: &ShopScope) -> Self {
        match scope {
            ShopScope::All => Self { shop_id: None, shop_ids: None },
            ShopScope::Single(id) => Self { shop_id: Some(*id), shop_ids: None },
            ShopScope::Many(ids) => Self { shop_id: None, shop_ids: Some(ids.clone()) },
        }
    }
}

/// Session metadata as returned by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    #[serde(default, alias = "shop_id", skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<i64>,
    #[serde(default, alias = "allowed_shops")]
    pub allowed_shops: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Anything else the backend attaches
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the session endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    #[serde(default)]
    pub metadata: SessionMetadata,
}

/// A chat session. Immutable once created; the id is opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub scope: ShopScope,
    pub metadata: SessionMetadata,
}

impl ChatSession {
    pub fn from_response(response: SessionResponse, scope: ShopScope) -> Self {
        Self {
            id: response.session_id,
            scope,
            metadata: response.metadata,
        }
    }
}
