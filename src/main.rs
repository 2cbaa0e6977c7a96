use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use agentmd::settings::{self, OutputFormat, Settings};
use agentmd::{
    chunk_by_size, extract_links, format_with_frontmatter, input, optimize, parser,
    split_sections, Chunk, MarkdownResult, Metadata,
};

#[derive(Parser)]
#[command(name = "agentmd", about = "Normalize extracted markdown for LLM agents")]
struct Cli {
    /// Config file (default: ./agentmd.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize markdown and wrap it with frontmatter
    Convert {
        /// Markdown file (stdin when omitted or "-")
        file: Option<PathBuf>,
        #[command(flatten)]
        meta: MetaArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Split raw markdown into size-bounded chunks, no optimization
    Chunk {
        file: Option<PathBuf>,
        /// Max characters per chunk (default: configured chunk_size)
        #[arg(short = 'n', long)]
        size: Option<usize>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Print the heading outline as JSON
    Sections { file: Option<PathBuf> },
    /// Print canonical links, one per line
    Links { file: Option<PathBuf> },
    /// Convert every *.md in a directory (uses <name>.meta.json sidecars)
    Batch {
        dir: PathBuf,
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Max characters per chunk; 0 disables chunking
    #[arg(long)]
    chunk_size: Option<usize>,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// Emit the body without a frontmatter block
    #[arg(long)]
    no_frontmatter: bool,
}

impl OutputArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(n) = self.chunk_size {
            settings.chunk_size = n;
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        if self.no_frontmatter {
            settings.frontmatter = false;
        }
    }
}

#[derive(Args)]
struct MetaArgs {
    /// JSON metadata file: {"kind": "document" | "social", ...}
    #[arg(long)]
    meta: Option<PathBuf>,
    /// Source URL
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    canonical: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    image: Option<String>,
    /// Publication date, passed through as given
    #[arg(long)]
    published: Option<String>,
    #[arg(long)]
    language: Option<String>,
}

impl MetaArgs {
    /// Sidecar metadata (or an empty document) with flag values layered on top.
    fn resolve(self) -> Result<Metadata> {
        let base = match &self.meta {
            Some(path) => input::read_metadata(path)?,
            None => Metadata::default(),
        };

        Ok(match base {
            Metadata::Document(mut doc) => {
                doc.source_url = self.url.or(doc.source_url);
                doc.canonical_url = self.canonical.or(doc.canonical_url);
                doc.title = self.title.or(doc.title);
                doc.description = self.description.or(doc.description);
                doc.author = self.author.or(doc.author);
                doc.image = self.image.or(doc.image);
                doc.published_at = self.published.or(doc.published_at);
                doc.language = self.language.or(doc.language);
                Metadata::Document(doc)
            }
            Metadata::Social(mut post) => {
                if self.title.is_some() || self.description.is_some() || self.canonical.is_some() {
                    warn!("--title/--description/--canonical are ignored for social posts");
                }
                post.source_url = self.url.or(post.source_url);
                post.author.name = self.author.or(post.author.name);
                post.image = self.image.or(post.image);
                post.published_at = self.published.or(post.published_at);
                post.language = self.language.or(post.language);
                Metadata::Social(post)
            }
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Convert {
            file,
            meta,
            output,
        } => {
            output.apply(&mut settings);
            let markdown = input::read_markdown(file.as_deref())?;
            let result = parser::process(&markdown, meta.resolve()?);
            println!("{}", render_output(&result, &settings)?);
        }
        Commands::Chunk {
            file,
            size,
            format,
        } => {
            let markdown = input::read_markdown(file.as_deref())?;
            let chunks = chunk_by_size(&markdown, size.unwrap_or(settings.chunk_size));
            match format.unwrap_or(settings.format) {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chunks)?),
                OutputFormat::Markdown => println!("{}", chunks_as_markdown(&chunks)),
            }
        }
        Commands::Sections { file } => {
            let markdown = input::read_markdown(file.as_deref())?;
            let sections = split_sections(&optimize(&markdown));
            println!("{}", serde_json::to_string_pretty(&sections)?);
        }
        Commands::Links { file } => {
            let markdown = input::read_markdown(file.as_deref())?;
            for link in extract_links(&optimize(&markdown)) {
                println!("{}", link);
            }
        }
        Commands::Batch { dir, out, output } => {
            output.apply(&mut settings);
            let counts = run_batch(&dir, &out, &settings)?;
            counts.print();
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

/// Final text for one result according to the output settings.
fn render_output(result: &MarkdownResult, settings: &Settings) -> Result<String> {
    let chunked = settings.chunk_size > 0;
    let chunks = || -> Vec<Chunk> {
        if settings.frontmatter {
            parser::render(result, settings.chunk_size)
        } else {
            chunk_by_size(&result.markdown, settings.chunk_size)
        }
    };

    Ok(match settings.format {
        OutputFormat::Json if chunked => serde_json::to_string_pretty(&chunks())?,
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Markdown if chunked => chunks_as_markdown(&chunks()),
        OutputFormat::Markdown if settings.frontmatter => format_with_frontmatter(result),
        OutputFormat::Markdown => result.markdown.clone(),
    })
}

fn chunks_as_markdown(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("<!-- chunk {}/{} -->\n{}", c.index + 1, c.total, c.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Default)]
struct BatchCounts {
    files: usize,
    errors: usize,
    sections: usize,
    links: usize,
    words: usize,
}

impl BatchCounts {
    fn print(&self) {
        println!(
            "Converted {} files ({} errors): {} sections, {} links, {} words.",
            self.files, self.errors, self.sections, self.links, self.words,
        );
    }
}

fn run_batch(dir: &Path, out: &Path, settings: &Settings) -> Result<BatchCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let files = input::markdown_files(dir)?;
    let mut counts = BatchCounts::default();
    if files.is_empty() {
        println!("No markdown files in {}", dir.display());
        return Ok(counts);
    }

    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;
    anyhow::ensure!(
        out.canonicalize()? != dir.canonicalize()?,
        "Output directory must differ from the input directory"
    );

    if settings.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let extension = match settings.format {
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    for group in files.chunks(500) {
        let results: Vec<_> = group
            .par_iter()
            .map(|path| convert_file(path, settings))
            .collect();

        for (path, outcome) in group.iter().zip(results) {
            let (result, rendered) = match outcome {
                Ok(converted) => converted,
                Err(e) => {
                    warn!(path = %path.display(), "Skipping file: {:#}", e);
                    counts.errors += 1;
                    continue;
                }
            };

            let Some(stem) = path.file_stem() else { continue };
            let target = out.join(stem).with_extension(extension);
            std::fs::write(&target, rendered)
                .with_context(|| format!("Failed to write {}", target.display()))?;

            counts.files += 1;
            counts.sections += result.structured.sections.len();
            counts.links += result.structured.links.len();
            counts.words += result.structured.word_count;
        }
        pb.inc(group.len() as u64);
    }

    pb.finish_and_clear();
    info!(
        files = counts.files,
        errors = counts.errors,
        "Batch finished in {}",
        out.display()
    );
    Ok(counts)
}

fn convert_file(path: &Path, settings: &Settings) -> Result<(MarkdownResult, String)> {
    let markdown = input::read_markdown(Some(path))?;
    let metadata = input::load_sidecar(path)?.unwrap_or_default();
    let result = parser::process(&markdown, metadata);
    let rendered = render_output(&result, settings)?;
    Ok((result, rendered))
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentmd::DocumentMetadata;

    fn sample() -> MarkdownResult {
        let meta = Metadata::Document(DocumentMetadata {
            title: Some("Sample".into()),
            ..Default::default()
        });
        parser::process("# One\n\nfirst\n\n| x | y |\n\n# Two\n\nsecond", meta)
    }

    #[test]
    fn markdown_output_variants() {
        let result = sample();
        let mut settings = Settings::default();
        let wrapped = render_output(&result, &settings).unwrap();
        assert!(wrapped.starts_with("---\ntitle: Sample\n"));
        assert!(wrapped.ends_with("# Two\n\nsecond"));

        settings.frontmatter = false;
        assert_eq!(
            render_output(&result, &settings).unwrap(),
            "# One\n\nfirst\n\n| x | y |\n\n# Two\n\nsecond"
        );

        settings.chunk_size = 24;
        let chunked = render_output(&result, &settings).unwrap();
        assert!(chunked.starts_with("<!-- chunk 1/2 -->\n# One\n\nfirst\n\n| x | y |\n\n<!--"));
        assert!(chunked.contains("<!-- chunk 2/2 -->\n# Two\n\nsecond"));
    }

    #[test]
    fn json_output_variants() {
        let result = sample();
        let mut settings = Settings {
            format: OutputFormat::Json,
            ..Default::default()
        };
        let value: serde_json::Value =
            serde_json::from_str(&render_output(&result, &settings).unwrap()).unwrap();
        assert_eq!(value["metadata"]["kind"], "document");
        assert_eq!(value["sections"].as_array().unwrap().len(), 2);

        settings.chunk_size = 10_000;
        let chunks: serde_json::Value =
            serde_json::from_str(&render_output(&result, &settings).unwrap()).unwrap();
        assert_eq!(chunks.as_array().unwrap().len(), 1);
        assert_eq!(chunks[0]["total"], 1);
    }

    #[test]
    fn meta_flags_override_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.meta.json");
        std::fs::write(&path, r#"{"kind":"document","title":"From file","language":"de"}"#).unwrap();

        let args = MetaArgs {
            meta: Some(path),
            url: None,
            canonical: None,
            title: Some("From flag".into()),
            description: None,
            author: None,
            image: None,
            published: None,
            language: None,
        };
        let Metadata::Document(doc) = args.resolve().unwrap() else { panic!("expected document") };
        assert_eq!(doc.title.as_deref(), Some("From flag"));
        assert_eq!(doc.language.as_deref(), Some("de"));
    }

    #[test]
    fn batch_writes_outputs() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        std::fs::write(input_dir.path().join("a.md"), "# A\n\nSee https://a.com/x?utm_source=z").unwrap();
        std::fs::write(input_dir.path().join("b.md"), "plain words only").unwrap();
        std::fs::write(
            input_dir.path().join("b.meta.json"),
            r#"{"kind":"social","platform":"x","sourceUrl":"https://x.com/u/status/7"}"#,
        )
        .unwrap();

        let counts = run_batch(input_dir.path(), out_dir.path(), &Settings::default()).unwrap();
        assert_eq!(counts.files, 2);
        assert_eq!(counts.errors, 0);
        assert_eq!(counts.links, 1);

        let b = std::fs::read_to_string(out_dir.path().join("b.md")).unwrap();
        assert!(b.starts_with("---\nplatform: x\n"));
        assert!(b.contains("post_id: 7\n"));
        assert!(b.ends_with("plain words only"));
    }

    #[test]
    fn batch_refuses_in_place_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "x").unwrap();
        assert!(run_batch(dir.path(), dir.path(), &Settings::default()).is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(std::time::Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }
}
