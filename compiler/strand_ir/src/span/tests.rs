use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_span_basic() {
    let span = Span::new(10, 20);
    assert_eq!(span.len(), 10);
    assert!(!span.is_empty());
    assert_eq!(span.to_range(), 10..20);
}

#[test]
fn test_span_merge() {
    let merged = Span::new(10, 20).merge(Span::new(15, 30));
    assert_eq!(merged, Span::new(10, 30));
}

#[test]
fn test_span_try_from_range_too_large() {
    let too_big = (u32::MAX as usize) + 1;
    assert_eq!(
        Span::try_from_range(0..too_big),
        Err(SpanError::EndTooLarge(too_big))
    );
}

#[test]
fn test_line_index_first_line() {
    let index = LineIndex::new("abc\ndef");
    assert_eq!(index.line_col(0), LineCol { line: 1, column: 1 });
    assert_eq!(index.line_col(2), LineCol { line: 1, column: 3 });
}

#[test]
fn test_line_index_after_newline() {
    let index = LineIndex::new("abc\ndef\n\nx");
    assert_eq!(index.line_col(4), LineCol { line: 2, column: 1 });
    assert_eq!(index.line_col(6), LineCol { line: 2, column: 3 });
    assert_eq!(index.line_col(9), LineCol { line: 4, column: 1 });
}

#[test]
fn test_line_col_display() {
    assert_eq!(LineCol { line: 3, column: 7 }.to_string(), "3:7");
}
