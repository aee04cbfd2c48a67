use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vinmap_scene::{report_markdown, BuildSummary, SceneConfig, ScenePipeline};

const DEFAULT_LOG_FILTER: &str = "vinmap=info,vinmap_scene=info,vinmap_storage=info";

#[derive(Debug, Parser)]
#[command(name = "vinmap")]
#[command(about = "Builds the Bourgogne wine map scene from enriched data")]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Overrides for `VINMAP_*` environment configuration.
#[derive(Debug, Clone, Default, Args)]
struct PathArgs {
    /// Workspace root; source and output directories resolve against it
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[arg(long, global = true)]
    source_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Geo tuning YAML (defaults to <root>/geo-tuning.yaml)
    #[arg(long, global = true)]
    tuning: Option<PathBuf>,
}

impl PathArgs {
    fn config(&self) -> SceneConfig {
        let mut config = match &self.root {
            Some(root) => SceneConfig::for_root(root),
            None => SceneConfig::from_env(),
        };
        if let Some(dir) = &self.source_dir {
            config.source_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(path) = &self.tuning {
            config.tuning_file = path.clone();
        }
        config
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build and write the scene document
    Build,
    /// Load and normalize every input without writing
    Check,
    /// Print a provenance report for a written scene
    Report {
        #[arg(long)]
        scene: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(verb: &str, summary: &BuildSummary) {
    let c = &summary.counts;
    println!(
        "{verb}: run_id={} wines={} producers={} sub_regions={} grapes={} points={} overrides={} polygons={} output={} sha256={}",
        summary.run_id,
        c.wines,
        c.producers,
        c.sub_regions,
        c.grapes,
        c.producer_grape_points,
        c.manual_override_producers,
        c.sub_region_polygons,
        summary.output_path.as_deref().unwrap_or("-"),
        summary.content_hash.as_deref().unwrap_or("-"),
    );
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.paths.config();
    debug!(?config, "resolved configuration");

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => {
            let summary = ScenePipeline::new(config)?.run_once()?;
            print_summary("scene built", &summary);
        }
        Commands::Check => {
            let summary = ScenePipeline::new(config)?.check()?;
            print_summary("scene check ok", &summary);
        }
        Commands::Report { scene } => {
            let scene_path = scene.unwrap_or_else(|| config.scene_path());
            println!("{}", report_markdown(&scene_path, &config.tuning_file)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_is_the_default_command() {
        let cli = Cli::try_parse_from(["vinmap"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn flags_override_root_layout() {
        let cli = Cli::try_parse_from([
            "vinmap",
            "check",
            "--root",
            "/srv/map",
            "--output-dir",
            "/tmp/out",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Some(Commands::Check)));
        let config = cli.paths.config();
        assert_eq!(config.workspace_root, PathBuf::from("/srv/map"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.tuning_file, PathBuf::from("/srv/map/geo-tuning.yaml"));
        assert!(config.source_dir.is_none());
    }

    #[test]
    fn report_accepts_scene_path() {
        let cli = Cli::try_parse_from(["vinmap", "report", "--scene", "scene.json"]).expect("parse");
        match cli.command {
            Some(Commands::Report { scene }) => assert_eq!(scene, Some(PathBuf::from("scene.json"))),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
