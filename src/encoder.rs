mod huffman;
mod pack;
mod pqueue;

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::process;
use std::time::Instant;

use log::{debug, error, info};

use crate::huffman::{FrequencyTable, HuffmanTree, entropy_from_freq};
use crate::pack::{build_code_table, encode_data, encode_frequencies};

fn print_symbol_report(freq: &FrequencyTable, tree: &HuffmanTree) {
    for symbol in 0..256u16 {
        let count = freq.count(symbol);
        if count == 0 {
            continue;
        }
        let bits = u64::from(tree.code_length(symbol).unwrap_or(0));

        let byte = symbol as u8;
        if byte.is_ascii_graphic() {
            print!("{}", byte as char);
        } else {
            print!("{:03o}", byte);
        }
        println!(": {} x {} bits = {} bits", count, bits, count * bits);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <input_file> [output_file]", args[0]);
        eprintln!("  <input_file>:  path to the file to compress.");
        eprintln!("  [output_file]: optional, defaults to 'output.huff'.");
        process::exit(1);
    }

    let input_filepath = &args[1];
    let output_filepath = args.get(2).map_or("output.huff", |s| s.as_str());

    let raw_data = match fs::read(input_filepath) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to read input file {}: {}", input_filepath, e);
            process::exit(1);
        }
    };
    let original_len = raw_data.len() as u64;

    let start_time = Instant::now();

    let freq = FrequencyTable::from_bytes(&raw_data);
    let tree = HuffmanTree::build(&freq);
    let table = build_code_table(&tree);

    print_symbol_report(&freq, &tree);

    let encoded_freq = encode_frequencies(&freq);
    let encoded_data = encode_data(&raw_data, &table);
    debug!("Compression finished in {:.2?}", start_time.elapsed());

    info!("Writing compressed output to {}", output_filepath);
    let mut file = File::create(output_filepath).expect("cannot create output file");
    file.write_all(&encoded_freq).expect("could not write header");
    file.write_all(&encoded_data).expect("could not write data");

    let total_output_size = encoded_freq.len() + encoded_data.len();
    let file_entropy = entropy_from_freq(&freq);
    let compression_ratio = if original_len > 0 {
        100.0 * (1.0 - (total_output_size as f64) / (original_len as f64))
    } else {
        0.0
    };

    println!(
        "\r\n✅ Encoding successful.\n\
         📂 input:   {} ({} bytes)\n\
         💾 output:  {} ({} bytes)\n\
         ℹ️ entropy: {:.4} bits/symbol\n\
         🗜️ ratio:   {:.2}%",
        input_filepath, original_len, output_filepath, total_output_size, file_entropy,
        compression_ratio
    );
}
