pub mod init;
pub mod score;
pub mod summarize;
pub mod validate;

use anyhow::Result;

/// Output formats shared by `score` and `summarize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
    Html,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            other => anyhow::bail!("unknown format '{other}' (expected text, json, markdown, html)"),
        }
    }
}
