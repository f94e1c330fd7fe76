use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::Parser;
use logseed_eval::RuleEvaluator;
use logseed_parser::{Config, parse_config_yaml, parse_rule_yaml};

#[derive(Parser)]
#[command(name = "logseed")]
#[command(about = "Generate seed queries for log generators from Sigma rules")]
#[command(version)]
struct Cli {
    /// Name or path of the rule file or directory to read
    #[arg(long, value_name = "PATH")]
    filepath: Option<PathBuf>,

    /// Path to the Sigma backend configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base64-encoded rule content (one blob per line for multiple rules)
    #[arg(long, value_name = "B64", conflicts_with = "filepath")]
    filecontent: Option<String>,

    /// Base64-encoded configuration content
    #[arg(long, value_name = "B64", conflicts_with = "config")]
    configcontent: Option<String>,

    /// Output directory; each rule is written to <title>.log
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Case sensitive mode: synthetic values keep the rule's casing
    #[arg(long)]
    case_sensitive: bool,

    /// Rule file or directory (positional alternative to --filepath)
    #[arg(value_name = "FILEPATH")]
    filepath_pos: Option<PathBuf>,

    /// Configuration file (positional alternative to --config)
    #[arg(value_name = "CONFIG")]
    config_pos: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let filepath = cli.filepath.or(cli.filepath_pos);
    let config_path = cli.config.or(cli.config_pos);

    if (filepath.is_none() && cli.filecontent.is_none())
        || (config_path.is_none() && cli.configcontent.is_none())
    {
        eprintln!(
            "Please provide either file paths or file contents, and either \
             config path or config content. See --help."
        );
        process::exit(2);
    }

    let rule_sources = match load_rule_sources(filepath.as_deref(), cli.filecontent.as_deref()) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("Error reading rules: {e}");
            process::exit(1);
        }
    };

    let config = match load_config(config_path.as_deref(), cli.configcontent.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error reading config: {e}");
            process::exit(1);
        }
    };

    for (name, content) in &rule_sources {
        let rule = match parse_rule_yaml(content) {
            Ok(rule) => rule,
            Err(e) => {
                eprintln!("Error parsing rule {name}: {e}");
                continue;
            }
        };

        let title = rule.title.clone();
        let mut evaluator = RuleEvaluator::for_rule(rule).with_config(config.clone());
        if cli.case_sensitive {
            evaluator = evaluator.case_sensitive();
        }

        let result = match evaluator.alters() {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Error converting rule {name}: {e}");
                continue;
            }
        };

        let mut output = String::new();
        for query in &result.queries {
            output.push_str(query);
            output.push('\n');
        }

        match &cli.output {
            Some(dir) => {
                let out_path = dir.join(format!("{title}.log"));
                if let Err(e) = std::fs::write(&out_path, &output) {
                    eprintln!("Error writing output to file: {e}");
                    continue;
                }
                println!(
                    "Output for rule '{title}' written to file: {}",
                    out_path.display()
                );
            }
            None => print!("{output}"),
        }
    }
}

/// Collect rule YAML sources as name → content. Accepts a single file, a
/// directory walked recursively for `.yml`/`.yaml` files, or newline-separated
/// base64 blobs.
fn load_rule_sources(
    filepath: Option<&Path>,
    filecontent: Option<&str>,
) -> std::io::Result<BTreeMap<String, String>> {
    let mut sources = BTreeMap::new();

    if let Some(path) = filepath {
        if path.is_dir() {
            walk_rules(path, &mut sources)?;
        } else {
            sources.insert(
                path.display().to_string(),
                std::fs::read_to_string(path)?,
            );
        }
    } else if let Some(content) = filecontent {
        for (i, line) in content.lines().filter(|l| !l.is_empty()).enumerate() {
            let decoded = BASE64
                .decode(line.trim())
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            let text = String::from_utf8_lossy(&decoded).into_owned();
            sources.insert(format!("filecontent[{i}]"), text);
        }
    }

    Ok(sources)
}

fn walk_rules(dir: &Path, sources: &mut BTreeMap<String, String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_rules(&path, sources)?;
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml" | "yaml")
        ) {
            sources.insert(path.display().to_string(), std::fs::read_to_string(&path)?);
        }
    }
    Ok(())
}

fn load_config(
    config_path: Option<&Path>,
    configcontent: Option<&str>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let yaml = if let Some(path) = config_path {
        std::fs::read_to_string(path)?
    } else if let Some(content) = configcontent {
        let decoded = BASE64.decode(content.trim())?;
        String::from_utf8_lossy(&decoded).into_owned()
    } else {
        String::new()
    };

    Ok(parse_config_yaml(&yaml)?)
}
