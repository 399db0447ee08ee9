//! Convert a tab-separated prompt/response text file into the JSONL
//! dataset the trainer consumes. Blank and malformed lines are skipped
//! with a count, so a hand-edited source file can be cleaned up in one
//! pass.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use aibou_core::dataset::TrainingExample;

fn main() -> anyhow::Result<()> {
    let input_path = "data/raw_pairs.txt";
    let output_path = "training_data.jsonl";

    if !Path::new(input_path).exists() {
        println!("Input file not found at {input_path}");
        return Ok(());
    }

    let file = File::open(input_path)?;
    let reader = BufReader::new(file);
    let mut out_file = File::create(output_path)?;

    let mut success_count = 0;
    let mut skipped = 0;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once('\t') {
            Some((prompt, response))
                if !prompt.trim().is_empty() && !response.trim().is_empty() =>
            {
                let example = TrainingExample {
                    prompt: prompt.trim().to_string(),
                    response: response.trim().to_string(),
                };
                let json = serde_json::to_string(&example)?;
                writeln!(out_file, "{json}")?;
                success_count += 1;
            }
            _ => skipped += 1,
        }
    }

    println!("Bootstrapped {success_count} examples to {output_path} ({skipped} skipped)");
    Ok(())
}
