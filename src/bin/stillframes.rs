use std::{path::PathBuf, sync::Arc};

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use stillframes::{
    BatchConfig, BatchReport, ExtractOptions, FfmpegLogLevel, Job, JobOutcome, ProgressCallback,
    ProgressInfo, StreamInfo, VideoSource, run_batch,
};

const CLI_AFTER_HELP: &str = "Examples:\n  stillframes extract front.mp4 front.txt --out images/front\n  stillframes batch --source-dir video --output-root images --prefix front --prefix rear --progress\n  stillframes batch --job a.mp4 a.txt out/a --job b.mp4 b.txt out/b --json\n  stillframes probe front.mp4\n  stillframes completions zsh > _stillframes";

#[derive(Debug, Parser)]
#[command(
    name = "stillframes",
    version,
    about = "Write every decoded video frame as a JPEG named by a label list",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args, Clone)]
struct GlobalOptions {
    /// Show debug logging.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar per job.
    #[arg(long, global = true)]
    progress: bool,

    /// JPEG quality, 1-100 (100 = best).
    #[arg(
        long,
        global = true,
        default_value_t = 100,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    quality: u8,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    ffmpeg_log_level: Option<FfmpegLogLevel>,

    /// Print reports as JSON.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract frames from one video.
    #[command(after_help = "Examples:\n  stillframes extract front.mp4 front.txt --out images/front")]
    Extract {
        /// Video container.
        video: PathBuf,
        /// Label file, one output name per line.
        labels: PathBuf,
        /// Output directory (created if missing).
        #[arg(long)]
        out: PathBuf,
    },

    /// Extract frames from several videos, continuing past failures.
    #[command(
        after_help = "Examples:\n  stillframes batch --job a.mp4 a.txt out/a --job b.mp4 b.txt out/b\n  stillframes batch --source-dir video --output-root images --prefix front --prefix rear"
    )]
    Batch {
        /// An explicit job: video, label file, output directory.
        #[arg(
            long = "job",
            num_args = 3,
            value_names = ["VIDEO", "LABELS", "OUT_DIR"],
            action = ArgAction::Append
        )]
        jobs: Vec<PathBuf>,

        /// Directory holding `<prefix>.mp4` and `<prefix>.txt` files.
        #[arg(long, requires = "output_root")]
        source_dir: Option<PathBuf>,

        /// Directory receiving one `<prefix>/` folder per prefix.
        #[arg(long, requires = "source_dir")]
        output_root: Option<PathBuf>,

        /// Prefix to process from `--source-dir`.
        #[arg(long = "prefix", requires = "source_dir")]
        prefixes: Vec<String>,
    },

    /// Print the video stream that would be decoded.
    Probe {
        /// Video container.
        video: PathBuf,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Drives one progress bar, restarting it whenever a new job begins.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.frames_done == 1 {
            self.bar.reset();
            self.bar.set_length(info.frames_total);
        }
        self.bar.set_position(info.frames_done);
        self.bar.set_message(info.label.clone());
        if info.frames_done == info.frames_total {
            self.bar.finish_and_clear();
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn jobs_from_triples(values: &[PathBuf]) -> Vec<Job> {
    values
        .chunks_exact(3)
        .map(|triple| Job::new(&triple[0], &triple[1], &triple[2]))
        .collect()
}

fn stream_json(stream: &StreamInfo) -> Value {
    json!({
        "index": stream.index,
        "codec": stream.codec,
        "width": stream.width,
        "height": stream.height,
        "pixel_format": stream.pixel_format_name(),
    })
}

fn outcome_json(outcome: &JobOutcome) -> Value {
    let mut value = json!({
        "name": outcome.job.name(),
        "video": outcome.job.video.display().to_string(),
        "labels": outcome.job.labels.display().to_string(),
        "output_dir": outcome.job.output_dir.display().to_string(),
        "success": outcome.is_success(),
    });
    match &outcome.result {
        Ok(report) => {
            value["stream"] = stream_json(&report.stream);
            value["labels_total"] = json!(report.labels_total);
            value["frames_decoded"] = json!(report.frames_decoded);
            value["frames_written"] = json!(report.frames_written);
            value["frames_failed"] = json!(report.frames_failed);
            value["frames_dropped"] = json!(report.frames_dropped);
            value["packets_skipped"] = json!(report.packets_skipped);
            value["decode_errors"] = json!(report.decode_errors);
            value["read_error"] = json!(report.read_error);
        }
        Err(error) => {
            value["error"] = json!(error.to_string());
        }
    }
    value
}

fn print_report(report: &BatchReport, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if as_json {
        let payload = json!({
            "success": report.is_success(),
            "frames_written": report.frames_written(),
            "jobs": report.jobs.iter().map(outcome_json).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for outcome in &report.jobs {
        match &outcome.result {
            Ok(job_report) if outcome.is_success() => println!(
                "{} {}: {} frame(s) written to {}",
                "ok".green().bold(),
                outcome.job.name(),
                job_report.frames_written,
                outcome.job.output_dir.display(),
            ),
            Ok(job_report) => eprintln!(
                "{} {}: {} written, {} failed, {} decode error(s){}",
                "partial".yellow().bold(),
                outcome.job.name(),
                job_report.frames_written,
                job_report.frames_failed,
                job_report.decode_errors,
                job_report
                    .read_error
                    .as_deref()
                    .map(|reason| format!(", read stopped early: {reason}"))
                    .unwrap_or_default(),
            ),
            Err(error) => eprintln!(
                "{} {}: {error}",
                "failed".red().bold(),
                outcome.job.name()
            ),
        }
    }

    if report.is_success() {
        println!("{}", "All jobs completed successfully.".green());
    } else {
        eprintln!(
            "{}",
            "Some jobs failed; see the messages above for details.".red()
        );
    }
    Ok(())
}

fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Some(level) = cli.global.ffmpeg_log_level {
        stillframes::set_ffmpeg_log_level(level);
    }

    let mut options = ExtractOptions::new().with_quality(cli.global.quality);
    if cli.global.progress && !cli.global.json {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }

    let batch = match cli.command {
        Commands::Extract { video, labels, out } => {
            BatchConfig::default().with_job(Job::new(video, labels, out))
        }
        Commands::Batch {
            jobs,
            source_dir,
            output_root,
            prefixes,
        } => {
            let mut batch = BatchConfig::new(jobs_from_triples(&jobs));
            if let (Some(source_dir), Some(output_root)) = (source_dir, output_root) {
                batch
                    .jobs
                    .extend(BatchConfig::from_prefixes(source_dir, output_root, &prefixes).jobs);
            }
            if batch.jobs.is_empty() {
                return Err("no jobs given; use --job or --source-dir/--output-root/--prefix".into());
            }
            batch
        }
        Commands::Probe { video } => {
            let source = VideoSource::open(&video)?;
            if cli.global.json {
                println!("{}", serde_json::to_string_pretty(&stream_json(source.stream()))?);
            } else {
                println!("{}", source.stream());
            }
            return Ok(true);
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "stillframes", &mut std::io::stdout());
            return Ok(true);
        }
    };

    let report = run_batch(&batch, &options);
    print_report(&report, cli.global.json)?;
    Ok(report.is_success())
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, jobs_from_triples};

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn job_triples_are_grouped_in_order() {
        let values: Vec<PathBuf> = ["a.mp4", "a.txt", "out/a", "b.mp4", "b.txt", "out/b"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let jobs = jobs_from_triples(&values);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].video, PathBuf::from("b.mp4"));
        assert_eq!(jobs[1].labels, PathBuf::from("b.txt"));
        assert_eq!(jobs[1].output_dir, PathBuf::from("out/b"));
    }

    #[test]
    fn batch_accepts_repeated_jobs_and_global_flags() {
        let cli = Cli::try_parse_from([
            "stillframes",
            "batch",
            "--job",
            "a.mp4",
            "a.txt",
            "out/a",
            "--job",
            "b.mp4",
            "b.txt",
            "out/b",
            "--quality",
            "80",
        ])
        .unwrap();
        assert_eq!(cli.global.quality, 80);
        match cli.command {
            Commands::Batch { jobs, .. } => assert_eq!(jobs.len(), 6),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn quality_outside_range_is_rejected() {
        let result = Cli::try_parse_from(["stillframes", "probe", "in.mp4", "--quality", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn ffmpeg_log_level_parses_from_flag() {
        let cli = Cli::try_parse_from([
            "stillframes",
            "probe",
            "in.mp4",
            "--ffmpeg-log-level",
            "warn",
        ])
        .unwrap();
        assert_eq!(
            cli.global.ffmpeg_log_level,
            Some(stillframes::FfmpegLogLevel::Warning)
        );
    }
}
