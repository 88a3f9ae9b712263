use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 50;

/// Offset-cursor pagination parameters, shared by every listing endpoint.
/// The cursor is the integer offset of the next page; the client hands it
/// back verbatim.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub cursor: Option<i64>,
}

impl PageParams {
    pub fn limit(&self) -> i64 {
        match self.limit {
            Some(v) if v > 0 && v <= MAX_PAGE_SIZE => v,
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    pub fn offset(&self) -> i64 {
        match self.cursor {
            Some(v) if v > 0 => v,
            _ => 0,
        }
    }
}

#[derive(Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<i64>,
}

/// Builds a page from a `limit + 1` probe query: the extra row only tells us
/// whether another page exists and is never returned.
pub fn paginate<T>(mut rows: Vec<T>, limit: i64, offset: i64) -> Page<T> {
    let next_cursor = if rows.len() as i64 > limit {
        rows.truncate(limit as usize);
        Some(offset + limit)
    } else {
        None
    };
    Page {
        items: rows,
        next_cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<i64>, cursor: Option<i64>) -> PageParams {
        PageParams { limit, cursor }
    }

    #[test]
    fn defaults_apply_when_params_missing_or_bogus() {
        assert_eq!(params(None, None).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params(Some(0), None).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params(Some(-3), None).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params(Some(MAX_PAGE_SIZE + 1), None).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params(None, Some(-10)).offset(), 0);
        assert_eq!(params(None, Some(24)).offset(), 24);
    }

    #[test]
    fn full_probe_page_advances_the_cursor() {
        let page = paginate(vec![1, 2, 3, 4], 3, 6);
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.next_cursor, Some(9));
    }

    #[test]
    fn short_page_ends_the_stream() {
        let page = paginate(vec![1, 2], 3, 0);
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn exact_page_without_probe_row_ends_the_stream() {
        let page = paginate(vec![1, 2, 3], 3, 3);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn cursor_walk_never_skips_or_repeats_for_a_stable_set() {
        let rows: Vec<i64> = (0..10).collect();
        let limit = 3;
        let mut offset = 0;
        let mut seen = Vec::new();
        loop {
            let window: Vec<i64> = rows
                .iter()
                .cloned()
                .skip(offset as usize)
                .take(limit as usize + 1)
                .collect();
            let page = paginate(window, limit, offset);
            seen.extend(page.items);
            match page.next_cursor {
                Some(next) => offset = next,
                None => break,
            }
        }
        assert_eq!(seen, rows);
    }
}
