//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for geolens-cli.

use clap::Parser;
use std::path::PathBuf;

/// Geolens CLI - Estimate where a photograph was taken
#[derive(Parser, Debug, Clone)]
#[command(name = "geolens-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the image to analyze
    pub image: PathBuf,

    /// Run the deep forensic pass after the quick estimate
    #[arg(long)]
    pub deep: bool,

    /// Skip search corroboration even when a Tavily key is configured
    #[arg(long)]
    pub no_search: bool,

    /// Gemini API key (overrides settings and env vars)
    #[arg(long, env = "GEOLENS_API_KEY")]
    pub api_key: Option<String>,

    /// Output the final session as JSON (for scripting/parsing)
    #[arg(long)]
    pub json: bool,

    /// Suppress progress output
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_values() {
        let args = Args::parse_from(["geolens-cli", "photo.jpg"]);
        assert_eq!(args.image, PathBuf::from("photo.jpg"));
        assert!(!args.deep);
        assert!(!args.no_search);
        assert!(!args.json);
        assert!(!args.quiet);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_deep_and_no_search() {
        let args = Args::parse_from(["geolens-cli", "photo.jpg", "--deep", "--no-search"]);
        assert!(args.deep);
        assert!(args.no_search);
    }

    #[test]
    fn test_args_output_modes() {
        let args = Args::parse_from(["geolens-cli", "photo.jpg", "--json", "--quiet"]);
        assert!(args.json);
        assert!(args.quiet);
    }
}
