//! ASCII occupancy view for debugging
//!
//! ```text
//!            W
//! |=====|==========|~~~~~---------------------
//! R
//! ```
//!
//! `|` marks an item header, `=` a closed payload, `~` the open item and `-`
//! free space. Rendering borrows the ring immutably.

use alloc::string::String;
use alloc::vec;

use crate::ring::RingLog;

/// Default number of columns in the occupancy bar
pub const DEFAULT_WIDTH: usize = 100;

/// Render the write marker, the occupancy bar and the read marker
///
/// Offsets are scaled to `width` columns, so several small items can share a
/// column on a large ring.
pub fn render<S: AsRef<[u8]> + AsMut<[u8]>>(ring: &RingLog<S>, width: usize) -> String {
    let width = width.max(1);
    let capacity = ring.capacity();
    let column = |offset: usize| width * offset / capacity;

    let mut bar = vec!['-'; width];
    for item in ring.items() {
        let start = column(item.offset());
        // Measured before wrapping, so an item filling the ring spans every column.
        let span = (column(item.offset() + item.footprint()) - start).clamp(1, width);
        let fill = if item.is_open() { '~' } else { '=' };

        for step in 0..span {
            bar[(start + step) % width] = fill;
        }
        bar[start] = '|';
    }

    let mut out = String::with_capacity(3 * (width + 1));
    push_marker(&mut out, column(ring.write_cursor()), 'W');
    out.push('\n');
    out.extend(bar);
    out.push('\n');
    push_marker(&mut out, column(ring.read_cursor()), 'R');
    out
}

fn push_marker(out: &mut String, col: usize, marker: char) {
    out.extend(core::iter::repeat(' ').take(col));
    out.push(marker);
}
