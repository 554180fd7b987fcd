//! Random table content

use crate::table::{Pair, Row, Table};
use rand::Rng;

/// Lowest character used in generated text (`!`)
pub const MIN_CHAR: u8 = 33;
/// Highest character used in generated text (`~`)
pub const MAX_CHAR: u8 = 126;
/// Length of every generated key and value
pub const TOKEN_LEN: usize = 3;

/// A random string of printable, non-space ASCII characters
pub fn random_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..TOKEN_LEN)
        .map(|_| char::from(rng.gen_range(MIN_CHAR..=MAX_CHAR)))
        .collect()
}

/// `count` pairs with independently generated keys and values
pub fn random_pairs<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Pair> {
    (0..count)
        .map(|_| {
            let key = random_token(rng);
            let value = random_token(rng);
            Pair::new(key, value)
        })
        .collect()
}

/// A `rows` x `cols` table of random pairs
pub fn random_table<R: Rng + ?Sized>(rng: &mut R, rows: usize, cols: usize) -> Table {
    Table::from_rows(
        (0..rows)
            .map(|_| Row::from_cells(random_pairs(rng, cols)))
            .collect(),
    )
}
