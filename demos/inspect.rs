fn main() {
    let args: Vec<String> = std::env::args().collect();
    let md = if args.len() > 1 {
        std::fs::read_to_string(&args[1]).expect("Failed to read file")
    } else {
        "# Overview\n\n1. first\n2. second\n   - nested\n\n[docs](https://example.com)".to_string()
    };

    // Load a stylesheet from the current directory
    let style = richmark::StyleSheet::load(std::path::Path::new("style.toml"));
    match richmark::render(&md, &style) {
        Ok(buf) => {
            for run in buf.runs() {
                println!("{:?} kind={:?}", run.text, run.attrs.kind);
            }
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}
