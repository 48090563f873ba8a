pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// `'it''s'`, `"a""b"` and `[a]]b]` escape the closing delimiter by doubling it.
pub(super) fn is_doubled(bytes: &[u8], idx: usize, delimiter: u8) -> bool {
    bytes.get(idx + 1) == Some(&delimiter)
}
