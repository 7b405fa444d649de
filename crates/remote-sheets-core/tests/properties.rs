//! Property tests for index resolution, slicing and A1 notation

use proptest::prelude::*;
use remote_sheets_core::{resolve_index, A1Range, CellAddress, GridBounds, Slice};

proptest! {
    #[test]
    fn negative_index_mirrors_positive(len in 1usize..64, offset in 0usize..64) {
        prop_assume!(offset < len);
        let negative = -(offset as isize) - 1;
        prop_assert_eq!(resolve_index(negative, len), Some(len - offset - 1));
    }

    #[test]
    fn resolved_index_is_in_bounds(len in 0usize..64, index in -128isize..128) {
        if let Some(i) = resolve_index(index, len) {
            prop_assert!(i < len);
        }
    }

    #[test]
    fn slice_is_clamped(
        len in 0usize..64,
        start in proptest::option::of(-128isize..128),
        stop in proptest::option::of(-128isize..128),
    ) {
        let range = Slice::new(start, stop).indices(len).unwrap();
        prop_assert!(range.start <= range.end);
        prop_assert!(range.end <= len);
    }

    #[test]
    fn slice_matches_vec_slicing(len in 0usize..32, start in 0isize..40, stop in 0isize..40) {
        let items: Vec<usize> = (0..len).collect();
        let range = Slice::range(start, stop).indices(len).unwrap();
        let expected: Vec<usize> = items
            .iter()
            .copied()
            .filter(|&i| (i as isize) >= start && (i as isize) < stop)
            .collect();
        prop_assert_eq!(items[range].to_vec(), expected);
    }

    #[test]
    fn column_letters_roundtrip(col in 0usize..20_000) {
        let letters = CellAddress::column_to_letters(col);
        prop_assert_eq!(CellAddress::letters_to_column(&letters).unwrap(), col);
    }

    #[test]
    fn quoted_titles_parse_back(
        title in "[A-Za-z0-9 '!]{1,12}",
        rows in 0usize..50,
        cols in 0usize..50,
        height in 1usize..10,
        width in 1usize..10,
    ) {
        let bounds = GridBounds::new(rows, rows + height, cols, cols + width);
        let notation = A1Range::new(title.clone(), bounds).to_a1_notation().unwrap();
        let parsed = A1Range::parse(&notation).unwrap();
        prop_assert_eq!(parsed.sheet.as_deref(), Some(title.as_str()));
        prop_assert_eq!(parsed.bounds, bounds);
    }
}
