use crate::error::Error;
use crate::storage::models::{scopes, Resource};
use crate::storage::queries::{find_resource, resource_from_row, RESOURCE_COLUMNS};
use ahash::AHashSet;
use rusqlite::{params, Connection};
use std::collections::VecDeque;

/// Load a resource, failing with `ResourceNotFound` when it does not exist.
pub fn get_resource(conn: &Connection, id: i64) -> Result<Resource, Error> {
    find_resource(conn, id)?.ok_or(Error::ResourceNotFound(id))
}

/// Every project below `root_id` at any depth, breadth-first. Directories and
/// files are not included, nor is the root itself.
pub fn get_descendant_projects(conn: &Connection, root_id: i64) -> Result<Vec<Resource>, Error> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM projects WHERE root_id = ?1 AND scope = ?2 ORDER BY id",
        RESOURCE_COLUMNS
    ))?;

    let mut projects = Vec::new();
    let mut seen = AHashSet::new();
    seen.insert(root_id);
    let mut queue = VecDeque::from([root_id]);

    while let Some(parent_id) = queue.pop_front() {
        let children = stmt
            .query_map(params![parent_id, scopes::PROJECT], resource_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for child in children {
            if seen.insert(child.id) {
                queue.push_back(child.id);
                projects.push(child);
            }
        }
    }
    Ok(projects)
}

/// The root project followed by all of its descendant projects.
pub fn load_project_tree(conn: &Connection, root_id: i64) -> Result<Vec<Resource>, Error> {
    let mut projects = vec![get_resource(conn, root_id)?];
    projects.extend(get_descendant_projects(conn, root_id)?);
    Ok(projects)
}

/// Ids of the projects directly attached to `root_id`.
pub fn select_project_ids_by_root_id(conn: &Connection, root_id: i64) -> Result<Vec<i64>, Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM projects WHERE root_id = ?1 AND scope = ?2 ORDER BY id",
    )?;
    let ids = stmt
        .query_map(params![root_id, scopes::PROJECT], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

/// Ids of every resource attached to `root_id`, with `root_id` itself last.
pub fn select_resource_ids_by_root_id(conn: &Connection, root_id: i64) -> Result<Vec<i64>, Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM projects WHERE root_id = ?1 OR id = ?1 \
         ORDER BY CASE WHEN id = ?1 THEN 1 ELSE 0 END, id",
    )?;
    let ids = stmt
        .query_map(params![root_id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

/// Project ids of the subtree rooted at `root_id`, every project listed
/// after all of its descendants.
pub fn project_ids_bottom_up(conn: &Connection, root_id: i64) -> Result<Vec<i64>, Error> {
    let mut preorder = Vec::new();
    let mut seen = AHashSet::new();
    let mut stack = vec![root_id];

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        preorder.push(id);
        stack.extend(select_project_ids_by_root_id(conn, id)?);
    }

    preorder.reverse();
    Ok(preorder)
}
