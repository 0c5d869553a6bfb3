use lab_report_extract::template::Region;
use lab_report_extract::{extract_fragments, LayoutParams, TemplateConfig};
use std::env;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_fragments <pdf_path> [max_page | min-max]");
        std::process::exit(1);
    }

    let range = args.get(2).map(|s| s.as_str()).unwrap_or("1-3");
    let (min_page, max_page) = if let Some((a, b)) = range.split_once('-') {
        (a.parse().unwrap_or(1), b.parse().unwrap_or(3))
    } else {
        (1, range.parse().unwrap_or(3))
    };

    let template = TemplateConfig::default();
    let pages = extract_fragments(&args[1], &LayoutParams::default()).expect("Failed to extract");

    for page in pages.iter().filter(|p| p.page >= min_page && p.page <= max_page) {
        println!("=== PAGE {} ({} fragments) ===", page.page, page.fragments.len());
        for fragment in &page.fragments {
            let region = template.region_of(fragment.bottom_y);
            let band = match region {
                Region::Header => template.header_band(fragment.left_x),
                Region::Body => template.anchor_band(fragment.left_x),
                Region::Margin => None,
            };
            println!(
                "  x={:7.1} y={:7.1} {:<6} {:<12} text={:?}",
                fragment.left_x,
                fragment.bottom_y,
                format!("{:?}", region),
                band.map(|b| b.name.as_str()).unwrap_or("-"),
                fragment.text
            );
        }
        println!();
    }
}
