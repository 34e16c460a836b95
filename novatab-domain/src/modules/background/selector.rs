//! Choosing the next image from a pool.

use rand::Rng;

use crate::settings::types::OrderPolicy;

/// The image picked from a pool and the cursor to store afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub index: usize,
    pub image: &'a str,
    /// Always `< images.len()`.
    pub next_cursor: usize,
}

/// Picks the next image.
///
/// `Sequential` shows the image under `cursor` and advances it, wrapping at
/// the end. `Random` draws uniformly from the whole pool (the image on screen
/// may come up again) and leaves the cursor where it was. A cursor past the
/// end of a shrunken pool restarts at 0. An empty pool yields `None`.
pub fn select_next<'a, R>(images: &'a [String], order: OrderPolicy, cursor: usize, rng: &mut R) -> Option<Selection<'a>>
where
    R: Rng + ?Sized,
{
    if images.is_empty() {
        return None;
    }
    let cursor = clamp_cursor(cursor, images.len());
    let (index, next_cursor) = match order {
        OrderPolicy::Sequential => (cursor, (cursor + 1) % images.len()),
        OrderPolicy::Random => (rng.gen_range(0..images.len()), cursor),
    };
    Some(Selection { index, image: &images[index], next_cursor })
}

/// The image under the cursor, without advancing.
pub fn current<'a>(images: &'a [String], cursor: usize) -> Option<Selection<'a>> {
    if images.is_empty() {
        return None;
    }
    let index = clamp_cursor(cursor, images.len());
    Some(Selection { index, image: &images[index], next_cursor: index })
}

fn clamp_cursor(cursor: usize, len: usize) -> usize {
    if cursor >= len {
        0
    } else {
        cursor
    }
}
