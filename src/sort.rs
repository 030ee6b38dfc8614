//! Sort controller for rendered tables.

use std::cmp::Ordering;

use crate::render::{Column, Row, Table};

/// Index of the first column declared with `key`, or `0` if none matches.
pub fn column_index(columns: &[Column], key: &str) -> usize {
    columns.iter().position(|c| c.key == key).unwrap_or(0)
}

/// Reorders the table's current rows by the trimmed text of the `key` column.
///
/// Only row order changes; the sort is stable so rows that compare equal keep
/// their previous relative order.
pub fn sort_table(table: &mut Table, key: &str) {
    let index = column_index(table.columns, key);
    table
        .rows
        .sort_by(|a, b| natural_cmp(&cell_content(a, index), &cell_content(b, index)));
}

fn cell_content(row: &Row, index: usize) -> String {
    row.cells
        .get(index)
        .map(|cell| cell.content())
        .unwrap_or_default()
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

/// Splits a string into alternating runs of ASCII digits and other characters.
fn chunks(s: &str) -> impl Iterator<Item = Chunk<'_>> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map_or(rest.len(), |(i, _)| i);
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(if digits {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    })
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Case-insensitive comparison that orders embedded numbers by value, so
/// `"2"` sorts before `"10"` and `"port2"` before `"port10"`.
///
/// This approximates a locale collation: text runs compare by lowercase code
/// point, digit runs always sort before text, and signs are plain text, so
/// `"-1"` sorts after `"1"`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Chunk::Digits(x)), Some(Chunk::Digits(y))) => cmp_digits(x, y),
            (Some(Chunk::Digits(_)), Some(Chunk::Text(_))) => Ordering::Less,
            (Some(Chunk::Text(_)), Some(Chunk::Digits(_))) => Ordering::Greater,
            (Some(Chunk::Text(x)), Some(Chunk::Text(y))) => cmp_text(x, y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}
