use fleetdesk_core::pagination::PageInfo;
use serde::Serialize;

/// One page of a list query, serialized as `{items, pagination}`.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}
