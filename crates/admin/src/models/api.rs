//! JSON envelopes exchanged between the admin API and its client.

use after10_core::{Item, ResponseStatus, Section};
use serde::{Deserialize, Serialize};

use crate::db::SectionDeletion;

/// `{ "sections": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionsEnvelope {
    pub sections: Vec<Section>,
    #[serde(default)]
    pub success: bool,
}

/// `{ "section": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionEnvelope {
    pub section: Section,
}

/// `{ "items": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsEnvelope {
    pub items: Vec<Item>,
}

/// `{ "item": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEnvelope {
    pub item: Item,
}

/// Create or rename a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionInput {
    pub name: String,
}

/// Delete response: `{ status, message, data }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEnvelope<T> {
    pub status: ResponseStatus,
    pub message: String,
    pub data: T,
}

impl<T> DeleteEnvelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data,
        }
    }
}

/// Payload of a single item delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDeleted {
    pub item_deleted: bool,
}

/// Payload of a bulk delete of a section's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsDeleted {
    pub deleted_count: u64,
}

/// Cascading section delete, as sent over the wire.
pub type SectionDeleteEnvelope = DeleteEnvelope<SectionDeletion>;

/// `{ "success": true, "url": "..." }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_delete_envelope_shape() {
        let envelope = DeleteEnvelope::success(
            "Items deleted successfully",
            ItemsDeleted { deleted_count: 3 },
        );
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "status": "success",
                "message": "Items deleted successfully",
                "data": { "deletedCount": 3 }
            })
        );
    }

    #[test]
    fn test_section_delete_envelope_parses() {
        let envelope: SectionDeleteEnvelope = serde_json::from_value(json!({
            "status": "success",
            "message": "Section and associated items deleted successfully",
            "data": { "sectionDeleted": true, "itemsDeletedCount": 2 }
        }))
        .unwrap();
        assert_eq!(envelope.data.items_deleted_count, 2);
    }
}
