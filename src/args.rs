use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "geo-audit")]
#[command(about = "Scores a page for AI answer visibility and content quality")]
#[command(version)]
pub struct Args {
    /// HTML or plain text file to audit
    pub file: PathBuf,

    /// URL the page is served from (used for link classification)
    #[arg(short, long, default_value = "")]
    pub url: String,

    /// JSON engine configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Competitor text file for originality scoring (repeatable)
    #[arg(long = "competitor")]
    pub competitors: Vec<PathBuf>,

    /// Whether the tone matches the intended audience
    #[arg(long)]
    pub audience_match: Option<bool>,

    /// Apply the suggestions and print the application report instead
    #[arg(long)]
    pub apply: bool,

    /// Write the final markup here when applying
    #[arg(short, long, requires = "apply")]
    pub output: Option<PathBuf>,

    /// Print compact instead of pretty JSON
    #[arg(long)]
    pub compact: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "geo-audit",
            "page.html",
            "--url",
            "https://example.com/",
            "--competitor",
            "a.txt",
            "--competitor",
            "b.txt",
            "--audience-match",
            "true",
            "--apply",
            "-o",
            "out.html",
        ])
        .unwrap();
        assert_eq!(args.file, PathBuf::from("page.html"));
        assert_eq!(args.competitors.len(), 2);
        assert_eq!(args.audience_match, Some(true));
        assert!(args.apply);
        assert!(!args.compact);
    }

    #[test]
    fn test_output_requires_apply() {
        assert!(Args::try_parse_from(["geo-audit", "page.html", "-o", "out.html"]).is_err());
    }
}
