use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("palaver")
        .version("0.3.0")
        .about("Browse Hacker News from the terminal")
        .arg(clap::arg!([LISTING] "Listing to fetch (top, new, best, ask, show, jobs, active)").default_value("top"))
        .arg(clap::arg!(-p --page <N> "Listing page, 1-based").default_value("1"))
        .arg(clap::arg!(-s --story <ID> "Show the comment thread of an item (story or comment permalink)"))
        .arg(clap::arg!(--all "Fetch every comment page, not just the first"))
        .arg(
            clap::arg!(--from_file <FILE> "Parse a saved page instead of fetching")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--thread "Treat the saved page as an item page rather than a listing"))
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (text, json)")
                .value_name("FORMAT")
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(-v --verbose "Enable progress output"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "palaver", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "palaver", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "palaver", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "palaver", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
