//! # HTML Report
//!
//! Assembles the markup fragments of an [`AnalyzerResult`] into a standalone
//! page. Fragments are emitted in result order, each wrapped in a section
//! tagged with its chart type so a front end can pick a renderer.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::AnalyzerResult;
use crate::error::Result;
use crate::utils::escape_html;

const DEFAULT_TITLE: &str = "Visulog";

/// Title and inline styles of a generated page.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub title: Option<String>,
    /// Stylesheet contents, inlined in order.
    pub stylesheets: Vec<String>,
}

impl PageOptions {
    /// Read every stylesheet from disk.
    pub fn with_css_files(title: Option<String>, css: &[PathBuf]) -> Result<Self> {
        let stylesheets = css
            .iter()
            .map(std::fs::read_to_string)
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self { title, stylesheets })
    }

    fn title(&self) -> String {
        self.title
            .as_deref()
            .map(|t| t.replace('_', " "))
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }
}

/// Render a complete HTML document.
pub fn render_page(result: &AnalyzerResult, options: &PageOptions) -> String {
    let title = escape_html(&options.title());
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n"));
    for stylesheet in &options.stylesheets {
        html.push_str("<style>\n");
        html.push_str(stylesheet);
        html.push_str("\n</style>\n");
    }
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{title}</h1>\n"));

    for (kind, plugin) in result.iter() {
        html.push_str(&format!(
            "<section class=\"plugin\" id=\"{}\" data-chart=\"{}\">\n",
            kind.id(),
            plugin.chart_type()
        ));
        html.push_str(&plugin.as_markup_fragment());
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Write the page, creating parent directories as needed.
pub fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}
