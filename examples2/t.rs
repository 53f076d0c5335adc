fn main() {
    use gumdrop::{Options, ParsingStyle};
    let args: Vec<String> = vec!["--etomo-directory".into(), "foo".into(), "--tilt-series-id".into(), "bar".into(), "--output-file".into(), "baz".into()];
    match tomo_tools::commands::alignment::Args::parse_args(&args, ParsingStyle::AllOptions) {
        Ok(a) => println!("ok"),
        Err(e) => println!("err: {}", e),
    }
}
