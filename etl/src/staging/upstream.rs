use std::fmt;
use std::future::Future;

use chrono::{NaiveDateTime, TimeDelta, Utc};

use crate::error::EtlResult;
use crate::types::Document;

/// Order in which the upstream API sorts a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Range of document timestamps requested from the upstream API.
///
/// Offsets only address a stable sequence while the window stays fixed, so a
/// window is chosen once per copy and shared by all of its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl TimeWindow {
    /// The `days` long window ending now.
    pub fn trailing_days(days: u32) -> TimeWindow {
        let to = Utc::now().naive_utc();

        TimeWindow {
            from: to - TimeDelta::days(i64::from(days)),
            to,
        }
    }
}

/// One page of a collection, addressed by offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub collection: String,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub window: TimeWindow,
    pub limit: usize,
    pub offset: usize,
}

/// A paginated source of documents.
pub trait UpstreamProvider {
    /// Fetches one page, an empty page means there is nothing past `offset`.
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl Future<Output = EtlResult<Vec<Document>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_windows_end_now() {
        let before = Utc::now().naive_utc();
        let window = TimeWindow::trailing_days(7);

        assert!(window.to >= before);
        assert_eq!(window.to - window.from, TimeDelta::days(7));
    }
}
