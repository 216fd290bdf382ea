//! Category grouping of created files
//!
//! Domain convention: a content path containing the marker segment puts a
//! file into a two-level category, named by the two segments right after
//! the marker. Grouped files leave the top-level entity set; they stay
//! reachable through their group dataset.

use indexmap::IndexMap;

/// Path segment that marks a categorized file.
pub const GROUP_MARKER: &str = "grouped";

/// One created FileObject, by id and content path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedFile {
    /// Repository id
    pub id: String,
    /// Content path the file was transferred from
    pub content_path: String,
}

/// One category group and its member files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// `coarse/fine` category name
    pub name: String,
    /// Member FileObject ids, in creation order
    pub member_ids: Vec<String>,
}

/// Coarse and fine category of a content path, when the marker is present
/// and followed by at least two segments.
fn group_key(content_path: &str) -> Option<(String, String)> {
    let segments: Vec<&str> = content_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let marker = segments.iter().position(|segment| *segment == GROUP_MARKER)?;
    let coarse = segments.get(marker + 1)?;
    let fine = segments.get(marker + 2)?;
    Some(((*coarse).to_string(), (*fine).to_string()))
}

/// Partition files into category groups and a top-level remainder.
///
/// Groups come out in first-encounter order; members keep creation order.
#[must_use]
pub fn partition_files(files: &[CreatedFile]) -> (Vec<Group>, Vec<CreatedFile>) {
    let mut groups: IndexMap<(String, String), Vec<String>> = IndexMap::new();
    let mut top_level = Vec::new();

    for file in files {
        match group_key(&file.content_path) {
            Some(key) => groups.entry(key).or_default().push(file.id.clone()),
            None => top_level.push(file.clone()),
        }
    }

    let groups = groups
        .into_iter()
        .map(|((coarse, fine), member_ids)| Group {
            name: format!("{coarse}/{fine}"),
            member_ids,
        })
        .collect();
    (groups, top_level)
}
