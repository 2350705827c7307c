//! Fixed-size pages over the id-ordered list of books.

/// Number of books on one page.
pub const BOOKS_PER_SHELF: usize = 8;

/// Returns the items of page `page` (1-based) of `items`.
///
/// Pages start at `(page - 1) * BOOKS_PER_SHELF`. A page that starts past the end of `items`,
/// or a page number below 1, is empty.
pub fn paginate<T: Clone>(items: &[T], page: i64) -> Vec<T> {
    let Some(start) = page_start(page) else {
        return Vec::new();
    };

    items
        .iter()
        .skip(start)
        .take(BOOKS_PER_SHELF)
        .cloned()
        .collect()
}

fn page_start(page: i64) -> Option<usize> {
    let index = usize::try_from(page.checked_sub(1)?).ok()?;

    index.checked_mul(BOOKS_PER_SHELF)
}
