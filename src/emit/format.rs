use crate::visibility::TrackedSatellite;

/// `"{id}: {label}, {id}: {label}"` sorted by id, or `None` when nothing is overhead.
pub fn format_line(overhead: &[TrackedSatellite]) -> Option<String> {
    if overhead.is_empty() {
        return None;
    }
    let mut sorted: Vec<&TrackedSatellite> = overhead.iter().collect();
    sorted.sort_by_key(|s| s.norad_id);

    let line = sorted
        .iter()
        .map(|s| format!("{}: {}", s.norad_id, s.label))
        .collect::<Vec<_>>()
        .join(", ");
    Some(line)
}
