#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use strata_data::{Entity, EntityMetadata};
use strata_macros::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Option<String>,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub created_by_id: Option<String>,
    pub updated_by_id: Option<String>,
}

impl Entity for User {
    fn metadata() -> EntityMetadata {
        EntityMetadata::builder("User")
            .table("users")
            .created_by("createdById")
            .updated_by("updatedById")
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity)]
#[serde(rename_all = "camelCase")]
#[entity(table = "orders", scope(deletedAt_eq = null))]
pub struct Order {
    #[entity(id)]
    pub id: Option<String>,
    pub status: Option<String>,
    #[entity(updated_by)]
    pub updated_by_id: Option<String>,
    #[entity(soft_delete)]
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Option<String>,
    pub title: Option<String>,
    pub created_by_id: Option<String>,
    pub updated_by_id: Option<String>,
    pub deleted_at: Option<String>,
    pub version: Option<i64>,
}

impl Entity for Note {
    fn metadata() -> EntityMetadata {
        EntityMetadata::basic("Note").table("notes").build()
    }
}
