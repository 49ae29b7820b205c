mod huffman;
mod pack;
mod pqueue;

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::process;
use std::time::Instant;

use log::{debug, error, info};

use crate::huffman::HuffmanTree;
use crate::pack::{decode_data, decode_frequencies};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input_file> <output_file>", args[0]);
        eprintln!("  <input_file>:  path to the compressed file.");
        eprintln!("  <output_file>: path to write the decompressed output.");
        process::exit(1);
    }

    let input_filepath = &args[1];
    let output_filepath = &args[2];

    let content = match fs::read(input_filepath) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to read compressed file {}: {}", input_filepath, e);
            process::exit(1);
        }
    };

    let (freq, header_len) = match decode_frequencies(&content) {
        Ok(res) => res,
        Err(e) => {
            error!("Failed to parse frequency header: {}", e);
            process::exit(1);
        }
    };
    debug!(
        "Header: {} bytes, data: {} bytes",
        header_len,
        content.len() - header_len
    );

    let start_time = Instant::now();

    // Rebuilding from the same table yields the same tree the encoder used
    let tree = HuffmanTree::build(&freq);
    let decoded_data = decode_data(&content[header_len..], &tree);
    debug!("Decompression finished in {:.2?}", start_time.elapsed());

    info!("Writing decompressed output to {}", output_filepath);
    let mut file = File::create(output_filepath).expect("cannot create output file");
    if let Err(e) = file.write_all(&decoded_data) {
        error!("Could not write decompressed data: {}", e);
        process::exit(1);
    }

    println!(
        "\r\n✅ Decoding successful.\n\
         📂 input:  {} ({} bytes)\n\
         💾 output: {} ({} bytes)",
        input_filepath,
        content.len(),
        output_filepath,
        decoded_data.len()
    );
}
