use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use palaver_core::{
    ClientConfig, Fetch, HackerNews, PostType, Result as CoreResult, Story, load_thread,
    parse_listing, parse_story,
};

mod echo;
use echo::{format_size, print_banner, print_info, print_step, print_success};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for scraped content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: text, json", s)),
        }
    }
}

/// Browse Hacker News from the terminal
#[derive(Parser, Debug)]
#[command(name = "palaver")]
#[command(version = VERSION)]
#[command(about = "Browse Hacker News from the terminal", long_about = None)]
struct Args {
    /// Listing to fetch (top, new, best, ask, show, jobs, active)
    #[arg(value_name = "LISTING", default_value = "top")]
    listing: String,

    /// Listing page, 1-based
    #[arg(short, long, default_value = "1", value_name = "N")]
    page: u32,

    /// Show the comment thread of an item (story id or comment permalink id)
    #[arg(short, long, value_name = "ID")]
    story: Option<u64>,

    /// Fetch every comment page, not just the first
    #[arg(long)]
    all: bool,

    /// Parse a saved page instead of fetching
    #[arg(long, value_name = "FILE")]
    from_file: Option<PathBuf>,

    /// Treat the saved page as an item page rather than a listing
    #[arg(long)]
    thread: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable progress output
    #[arg(short, long)]
    verbose: bool,
}

/// Serves one saved page for every URL the pipeline asks for. Enough for
/// single-page offline parsing; pagination and permalink hops stay off.
struct FileFetcher {
    html: String,
}

impl Fetch for FileFetcher {
    async fn fetch(&self, _url: &str) -> CoreResult<String> {
        Ok(self.html.clone())
    }
}

enum Loaded {
    Stories(Vec<Story>),
    Thread(Story),
}

fn format_stories(stories: &[Story]) -> String {
    let mut out = String::new();
    for (i, story) in stories.iter().enumerate() {
        out.push_str(&format!("{:>2}. {}\n", i + 1, story.title));
        out.push_str(&format!("    {}\n", story.url));
        let mut meta = String::new();
        if story.score > 0 || !story.author.is_empty() {
            meta.push_str(&format!("{} points by {} ", story.score, story.author));
        }
        meta.push_str(&story.age_label);
        meta.push_str(&format!(" | {} comments", story.comment_count));
        if story.upvoted {
            meta.push_str(" | upvoted");
        }
        out.push_str(&format!("    {}\n\n", meta.trim()));
    }
    out
}

fn format_thread(story: &Story) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n{}\n", story.title, story.url));
    out.push_str(&format!(
        "{} points by {} {} | {} comments\n\n",
        story.score, story.author, story.age_label, story.comment_count
    ));

    for comment in story.comments.as_deref().unwrap_or_default() {
        let indent = "  ".repeat(comment.level as usize);
        out.push_str(&format!("{}{} ({}):\n", indent, comment.author, comment.age_label));
        for line in comment.rendered_text().plain_text().lines() {
            out.push_str(&format!("{}  {}\n", indent, line));
        }
        out.push('\n');
    }
    out
}

async fn load(args: &Args, kind: PostType) -> anyhow::Result<Loaded> {
    if let Some(path) = &args.from_file {
        let html =
            fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
        if args.verbose {
            print_step(1, 3, &format!("Read {} from {}", format_size(html.len()), path.display()));
        }

        if args.thread {
            let probe = parse_story(&html, kind).context("Failed to parse item page")?;
            let story = load_thread(&FileFetcher { html }, palaver_core::BASE_URL, probe.id, false)
                .await
                .context("Failed to extract comment thread")?;
            return Ok(Loaded::Thread(story));
        }
        let stories = parse_listing(&html, kind).context("Failed to parse listing page")?;
        return Ok(Loaded::Stories(stories));
    }

    let mut config = ClientConfig::builder().timeout(args.timeout);
    if let Some(ua) = &args.user_agent {
        config = config.user_agent(ua.clone());
    }
    let hn = HackerNews::with_config(config.build()).context("Failed to build HTTP client")?;

    if let Some(id) = args.story {
        if args.verbose {
            print_step(1, 3, &format!("Fetching thread for item {id}"));
        }
        let story = hn
            .story_with_comments(id, args.all)
            .await
            .with_context(|| format!("Failed to load item {id}"))?;
        Ok(Loaded::Thread(story))
    } else {
        if args.verbose {
            print_step(1, 3, &format!("Fetching {} page {}", kind.as_path(), args.page));
        }
        let stories = hn
            .stories(kind, args.page)
            .await
            .context("Failed to load listing")?;
        Ok(Loaded::Stories(stories))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        print_banner();
    }

    let kind = PostType::from_str(&args.listing).map_err(anyhow::Error::msg)?;
    let loaded = load(&args, kind).await?;

    if args.verbose {
        print_step(2, 3, "Formatting output");
        match &loaded {
            Loaded::Stories(stories) => print_info(&format!("{} stories", stories.len())),
            Loaded::Thread(story) => print_info(&format!(
                "{} comments",
                story.comments.as_deref().unwrap_or_default().len()
            )),
        }
    }

    let output = match (&loaded, args.format) {
        (Loaded::Stories(stories), OutputFormat::Text) => format_stories(stories),
        (Loaded::Thread(story), OutputFormat::Text) => format_thread(story),
        (Loaded::Stories(stories), OutputFormat::Json) => {
            serde_json::to_string_pretty(stories).context("Failed to serialize stories")?
        }
        (Loaded::Thread(story), OutputFormat::Json) => {
            serde_json::to_string_pretty(story).context("Failed to serialize thread")?
        }
    };

    if args.verbose {
        print_step(3, 3, "Writing output");
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display()));
        }
        None => {
            print!("{}", output);
        }
    }

    Ok(())
}
