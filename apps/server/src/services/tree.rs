//! Builds the nested group hierarchy from flat projection rows.
//!
//! The build runs in two passes: first every group gets a node and its case
//! leaves, then each node is attached to its parent. Nesting is assembled
//! with an explicit post-order stack so depth never grows the call stack.

use std::collections::HashMap;

use tracing::warn;
use uuid::Uuid;

use crate::models::{CaseLeaf, GroupNode, TreeRow};

/// Build the forest of root groups from flat rows.
///
/// Row order does not matter. Roots and siblings come out in the order their
/// group was first seen; cases keep their row order. A group whose parent is
/// not among the rows is promoted to a root.
pub fn build_tree<I>(rows: I) -> Vec<GroupNode>
where
    I: IntoIterator<Item = TreeRow>,
{
    // Pass 1: one node per distinct group, with its cases.
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut nodes: Vec<GroupNode> = Vec::new();

    for row in rows {
        let idx = *index.entry(row.group_id).or_insert_with(|| {
            nodes.push(GroupNode {
                id: row.group_id,
                name: row.group_name.clone(),
                parent_id: row.parent_group_id,
                cases: Vec::new(),
                children: Vec::new(),
            });
            nodes.len() - 1
        });

        if let Some(case_id) = row.case_id {
            let node = &mut nodes[idx];
            if node.cases.iter().any(|c| c.id == case_id) {
                continue;
            }
            node.cases.push(CaseLeaf {
                id: case_id,
                title: row.case_title.unwrap_or_default(),
                status: row.case_status.unwrap_or_default(),
                assigned_to: row.assigned_to,
                assigned_to_name: row.assigned_to_name,
            });
        }
    }

    // Pass 2: link children to parents.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (idx, node) in nodes.iter().enumerate() {
        match node.parent_id {
            None => roots.push(idx),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent) if parent != idx => children[parent].push(idx),
                _ => {
                    warn!(
                        "Group {} references missing parent {}, promoting to root",
                        node.id, parent_id
                    );
                    roots.push(idx);
                }
            },
        }
    }

    let mut visited = vec![false; nodes.len()];
    let mut built: Vec<Option<GroupNode>> = (0..nodes.len()).map(|_| None).collect();
    let mut slots: Vec<Option<GroupNode>> = nodes.into_iter().map(Some).collect();

    let mut order = roots.clone();
    assemble(&roots, &children, &mut visited, &mut slots, &mut built);

    // Groups caught in a parent cycle are never reached from a root.
    for idx in 0..visited.len() {
        if !visited[idx] {
            if let Some(node) = slots[idx].as_ref() {
                warn!("Group {} is part of a parent cycle, promoting to root", node.id);
            }
            assemble(&[idx], &children, &mut visited, &mut slots, &mut built);
            order.push(idx);
        }
    }

    order.into_iter().filter_map(|idx| built[idx].take()).collect()
}

/// Post-order assembly of the subtrees rooted at `starts`.
fn assemble(
    starts: &[usize],
    children: &[Vec<usize>],
    visited: &mut [bool],
    slots: &mut [Option<GroupNode>],
    built: &mut [Option<GroupNode>],
) {
    let mut stack: Vec<(usize, bool)> = starts.iter().rev().map(|&idx| (idx, false)).collect();

    while let Some((idx, expanded)) = stack.pop() {
        if expanded {
            let Some(mut node) = slots[idx].take() else {
                continue;
            };
            node.children = children[idx]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[idx] = Some(node);
            continue;
        }

        if visited[idx] {
            continue;
        }
        visited[idx] = true;
        stack.push((idx, true));
        for &child in children[idx].iter().rev() {
            if !visited[child] {
                stack.push((child, false));
            }
        }
    }
}
