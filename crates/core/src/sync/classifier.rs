//! Change classification against prior state

use std::collections::BTreeMap;

use calrelay_domain::{ChangeItem, DiffEvent, DiffKind, ResourceId};

/// Decide which diff, if any, an incoming item represents.
///
/// `prior` is the last reported marker for the item, `None` if untracked.
pub fn classify(prior: Option<&str>, item: &ChangeItem, emit_unchanged: bool) -> Option<DiffKind> {
    if item.is_cancelled() {
        return prior.map(|_| DiffKind::Deleted);
    }

    match prior {
        None => Some(DiffKind::Created),
        Some(marker) if marker != item.marker => Some(DiffKind::Updated),
        Some(_) if emit_unchanged => Some(DiffKind::Updated),
        Some(_) => None,
    }
}

/// Apply one page of incremental changes to `items`, in page order.
///
/// Returns the diffs implied by the page. Repeated ids within a page resolve
/// last-write-wins.
pub fn apply_changes(
    resource: &ResourceId,
    items: &mut BTreeMap<String, String>,
    changes: &[ChangeItem],
    emit_unchanged: bool,
) -> Vec<DiffEvent> {
    let mut events = Vec::new();

    for change in changes {
        let kind = classify(items.get(&change.id).map(String::as_str), change, emit_unchanged);

        if change.is_cancelled() {
            if items.remove(&change.id).is_some() {
                events.push(DiffEvent::deleted(resource, change.id.clone()));
            }
            continue;
        }

        items.insert(change.id.clone(), change.marker.clone());
        if let Some(kind) = kind {
            events.push(DiffEvent::from_item(resource, kind, change));
        }
    }

    events
}

/// Fold baseline items into `items`, skipping cancelled ones.
pub fn collect_baseline(items: &mut BTreeMap<String, String>, page: &[ChangeItem]) {
    for item in page.iter().filter(|item| !item.is_cancelled()) {
        items.insert(item.id.clone(), item.marker.clone());
    }
}
