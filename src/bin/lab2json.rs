//! CLI tool for lab report PDF to JSON conversion

use lab_report_extract::{process_report_with_template, TemplateConfig};
use std::env;
use std::fs;
use std::process;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <input.pdf> <output.json> [--template template.json]", program);
    eprintln!();
    eprintln!("Extracts patient information and lab results by page position.");
    process::exit(1);
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 && args.len() != 5 {
        usage(&args[0]);
    }

    let input_path = &args[1];
    if !input_path.to_lowercase().ends_with(".pdf") {
        eprintln!("Error: The input file must be a PDF file.");
        process::exit(1);
    }

    let output_path = &args[2];
    if !output_path.to_lowercase().ends_with(".json") {
        eprintln!("Error: The output file must be a JSON file.");
        process::exit(1);
    }

    let template = match args.get(3).map(|a| a.as_str()) {
        Some("--template") => match TemplateConfig::from_json_file(&args[4]) {
            Ok(template) => template,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Some(_) => usage(&args[0]),
        None => TemplateConfig::default(),
    };

    let json = process_report_with_template(input_path, &template).and_then(|r| r.to_json_pretty());
    match json {
        Ok(json) => {
            if let Err(e) = fs::write(output_path, json) {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
