use std::collections::HashMap;
use std::io;

use log::{debug, error, trace, warn};

use crate::huffman::{EOF_SYMBOL, FrequencyTable, HuffmanTree, NodeId};

pub type CodeTable = HashMap<u16, String>;

const HEADER_ENTRY_SIZE: usize = 1 + 8;

/// Downward child view rebuilt from the tree's parent links. The tree
/// itself carries no child references; this is the packer's own
/// parallel structure. Slot order follows arena id order, which fixes
/// the 0/1 branch assignment for both encode and decode.
fn child_view(tree: &HuffmanTree) -> Vec<[Option<NodeId>; 2]> {
    let mut children = vec![[None, None]; tree.node_count()];
    for id in 0..tree.node_count() {
        if let Some(parent) = tree.parent(id) {
            let slots = &mut children[parent];
            if slots[0].is_none() {
                slots[0] = Some(id);
            } else {
                slots[1] = Some(id);
            }
        }
    }
    children
}

pub fn build_code_table(tree: &HuffmanTree) -> CodeTable {
    let children = child_view(tree);
    let mut table = CodeTable::new();

    for (symbol, leaf) in tree.symbols() {
        let mut bits = Vec::new();
        let mut id = leaf;
        while let Some(parent) = tree.parent(id) {
            bits.push(if children[parent][0] == Some(id) { '0' } else { '1' });
            id = parent;
        }
        let code: String = bits.iter().rev().collect();
        trace!("Code for symbol {}: '{}'", symbol, code);
        table.insert(symbol, code);
    }

    debug!("Code table built, {} entries", table.len());
    table
}

/// Header layout: entry count (u16 BE), then one (symbol, count u64 BE)
/// pair per nonzero byte symbol. The end-of-stream symbol is implicit.
pub fn encode_frequencies(freq: &FrequencyTable) -> Vec<u8> {
    let mut bytes = Vec::new();
    let entries: Vec<(u16, u64)> = freq.nonzero().collect();

    bytes.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    for (symbol, count) in entries {
        bytes.push(symbol as u8);
        bytes.extend_from_slice(&count.to_be_bytes());
    }

    debug!("Header generated, {} bytes", bytes.len());
    bytes
}

/// Parses the frequency header; returns the table and the number of
/// bytes consumed.
pub fn decode_frequencies(encoded: &[u8]) -> io::Result<(FrequencyTable, usize)> {
    if encoded.len() < 2 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "missing frequency header",
        ));
    }

    let entry_count = usize::from(u16::from_be_bytes([encoded[0], encoded[1]]));
    let header_len = 2 + entry_count * HEADER_ENTRY_SIZE;
    if entry_count > 256 || header_len > encoded.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "frequency header truncated or corrupt",
        ));
    }

    let mut freq = FrequencyTable::new();
    for i in 0..entry_count {
        let at = 2 + i * HEADER_ENTRY_SIZE;
        let symbol = u16::from(encoded[at]);
        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&encoded[at + 1..at + 9]);
        let count = u64::from_be_bytes(count_bytes);
        if count == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "zero count in frequency header",
            ));
        }
        freq.set(symbol, count);
    }

    debug!(
        "Reconstructed frequency table, {} entries, {} header bytes",
        entry_count, header_len
    );
    Ok((freq, header_len))
}

/// Emits each input byte's code followed by the end-of-stream code,
/// zero-padded to a byte boundary, bits packed MSB-first.
pub fn encode_data(data: &[u8], table: &CodeTable) -> Vec<u8> {
    let mut bits: Vec<u8> = Vec::with_capacity(data.len() * 8);

    for &byte in data {
        match table.get(&u16::from(byte)) {
            Some(code) => {
                for c in code.chars() {
                    bits.push(if c == '1' { 1 } else { 0 });
                }
            }
            None => error!("Symbol {:#04x} found in data but not in code table!", byte),
        }
    }

    // End-of-stream marker, then padding
    if let Some(code) = table.get(&EOF_SYMBOL) {
        for c in code.chars() {
            bits.push(if c == '1' { 1 } else { 0 });
        }
    }
    while bits.len() % 8 != 0 {
        bits.push(0);
    }

    let mut bytes = Vec::with_capacity(bits.len() / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for &bit in chunk {
            byte = (byte << 1) | bit;
        }
        bytes.push(byte);
    }
    bytes
}

/// Walks the child view from the root bit-by-bit, emitting a symbol at
/// each leaf, until the end-of-stream symbol is reached.
pub fn decode_data(encoded: &[u8], tree: &HuffmanTree) -> Vec<u8> {
    let children = child_view(tree);
    let symbol_of: HashMap<NodeId, u16> = tree.symbols().map(|(s, id)| (id, s)).collect();

    let mut decoded = Vec::new();
    let mut id = tree.root();

    if symbol_of.get(&id) == Some(&EOF_SYMBOL) {
        // Lone-root tree: the stream was empty
        return decoded;
    }

    for &byte in encoded {
        for shift in (0..8).rev() {
            let bit = usize::from((byte >> shift) & 1);
            id = match children[id][bit] {
                Some(next) => next,
                None => {
                    warn!("Bitstream walked off the tree, stopping");
                    return decoded;
                }
            };
            if let Some(&symbol) = symbol_of.get(&id) {
                if symbol == EOF_SYMBOL {
                    debug!("End-of-stream reached, {} bytes decoded", decoded.len());
                    return decoded;
                }
                decoded.push(symbol as u8);
                id = tree.root();
            }
        }
    }

    warn!("Bitstream ended without end-of-stream marker");
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_for(data: &[u8]) -> HuffmanTree {
        HuffmanTree::build(&FrequencyTable::from_bytes(data))
    }

    #[test]
    fn test_table_lengths_match_tree_depths() {
        let tree = tree_for(b"abracadabra");
        let table = build_code_table(&tree);
        for (&symbol, code) in &table {
            assert_eq!(code.len() as u32, tree.code_length(symbol).unwrap());
        }
    }

    #[test]
    fn test_codes_are_prefix_free() {
        let tree = tree_for(b"she sells sea shells by the sea shore");
        let table = build_code_table(&tree);
        for (&a, code_a) in &table {
            for (&b, code_b) in &table {
                if a != b {
                    assert!(
                        !code_a.starts_with(code_b.as_str()),
                        "code of {} is prefixed by code of {}",
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn test_header_round_trip() {
        let freq = FrequencyTable::from_bytes(b"abracadabra");
        let header = encode_frequencies(&freq);
        let (decoded, consumed) = decode_frequencies(&header).unwrap();

        assert_eq!(consumed, header.len());
        for symbol in 0..256u16 {
            assert_eq!(decoded.count(symbol), freq.count(symbol));
        }
    }

    #[test]
    fn test_truncated_header_is_rejected() {
        assert!(decode_frequencies(&[]).is_err());
        assert!(decode_frequencies(&[0]).is_err());

        let freq = FrequencyTable::from_bytes(b"hello");
        let header = encode_frequencies(&freq);
        assert!(decode_frequencies(&header[..header.len() - 1]).is_err());
    }

    #[test]
    fn test_stream_round_trip() {
        let data = b"abracadabra".as_slice();
        let freq = FrequencyTable::from_bytes(data);
        let tree = HuffmanTree::build(&freq);
        let table = build_code_table(&tree);

        let encoded = encode_data(data, &table);
        assert_eq!(decode_data(&encoded, &tree), data);
    }

    #[test]
    fn test_single_symbol_round_trip() {
        let data = [b'z'; 40];
        let tree = tree_for(&data);
        let table = build_code_table(&tree);

        let encoded = encode_data(&data, &table);
        // one bit per byte plus the end marker, padded
        assert!(encoded.len() <= 6);
        assert_eq!(decode_data(&encoded, &tree), data);
    }

    #[test]
    fn test_empty_input_round_trip() {
        let tree = tree_for(b"");
        let table = build_code_table(&tree);
        assert_eq!(table.get(&EOF_SYMBOL).map(String::as_str), Some(""));

        let encoded = encode_data(b"", &table);
        assert!(encoded.is_empty());
        assert_eq!(decode_data(&encoded, &tree), b"");
    }

    #[test]
    fn test_padding_is_ignored_after_end_marker() {
        let data = b"hello world".as_slice();
        let tree = tree_for(data);
        let table = build_code_table(&tree);

        let mut encoded = encode_data(data, &table);
        // trailing garbage past the end marker must not change the output
        encoded.push(0xFF);
        assert_eq!(decode_data(&encoded, &tree), data);
    }
}
