use serde::{Deserialize, Serialize};

/// Offset-window pagination context shared by every listing action. Actions
/// fetch one page of rows plus a windowed total and wrap them here.
#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: Option<i64>,
    pub prev_offset: Option<i64>,
    pub page_count: i64,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }

        let page_count = (total_rows + page_size - 1) / page_size;

        let next_offset = if current_offset + page_size < total_rows {
            Some(current_offset + page_size)
        } else {
            None
        };
        let prev_offset = if current_offset > 0 {
            Some((current_offset - page_size).max(0))
        } else {
            None
        };

        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
            page_count,
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: None,
            prev_offset: None,
            page_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_has_no_prev() {
        let page = PageContext::from_rows(vec![1, 2, 3], 9, 3, 0);
        assert_eq!(page.prev_offset, None);
        assert_eq!(page.next_offset, Some(3));
        assert_eq!(page.page_count, 3);
    }

    #[test]
    fn last_page_has_no_next() {
        let page = PageContext::from_rows(vec![7, 8, 9], 9, 3, 6);
        assert_eq!(page.next_offset, None);
        assert_eq!(page.prev_offset, Some(3));
    }

    #[test]
    fn partial_last_page_counts_as_full_page() {
        let page = PageContext::from_rows(vec![1], 7, 3, 6);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.next_offset, None);
    }

    #[test]
    fn empty_result_set() {
        let page: PageContext<i32> = PageContext::from_rows(vec![], 0, 3, 0);
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.page_count, 0);
    }
}
