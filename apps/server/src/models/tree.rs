//! Hierarchical group tree shapes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Flat projection row: one group, optionally carrying one case.
///
/// Groups without cases appear exactly once with `case_id = None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TreeRow {
    pub group_id: Uuid,
    pub group_name: String,
    pub parent_group_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    pub case_title: Option<String>,
    /// Authoring status in the project tree, execution status in a run tree
    pub case_status: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_name: Option<String>,
}

impl TreeRow {
    /// Row for a group that carries no case.
    pub fn group_only(group_id: Uuid, group_name: String, parent_group_id: Option<Uuid>) -> Self {
        Self {
            group_id,
            group_name,
            parent_group_id,
            case_id: None,
            case_title: None,
            case_status: None,
            assigned_to: None,
            assigned_to_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CaseLeaf {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GroupNode {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub cases: Vec<CaseLeaf>,
    #[schema(no_recursion)]
    pub children: Vec<GroupNode>,
}
