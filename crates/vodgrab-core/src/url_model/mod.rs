//! Local file names for staged segments.
//!
//! A segment is stored under the final path component of its URL. Because
//! the assembler relies on one file per playlist entry, names that are
//! unusable or already taken by an earlier entry are made unique with the
//! segment's index.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_file_name;

use std::collections::HashSet;

/// File name for a single segment URL, falling back to `segment-{index:05}.ts`.
pub fn segment_file_name(url: &str, index: usize) -> String {
    let name = filename_from_url_path(url)
        .map(|n| sanitize_file_name(&n))
        .unwrap_or_default();
    if name.is_empty() || name.ends_with(crate::staging::PART_SUFFIX) {
        format!("segment-{:05}.ts", index)
    } else {
        name
    }
}

/// One distinct file name per URL, in input order.
///
/// # Examples
///
/// - `["https://x/a.ts", "https://y/a.ts"]` → `["a.ts", "00001-a.ts"]`
pub fn plan_segment_file_names(urls: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(urls.len());
    urls.iter()
        .enumerate()
        .map(|(index, url)| {
            let mut name = segment_file_name(url, index);
            while taken.contains(&name) {
                name = format!("{:05}-{}", index, name);
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}
