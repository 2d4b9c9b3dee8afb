//! Source materialization
//!
//! Embeds submitted code into the language's wrapper template and writes the
//! resulting program into the workspace.

use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::config::{CODE_PLACEHOLDER, Language, WrapperConfig};
use crate::runner::RunnerError;
use crate::workspace::Workspace;

/// Render the full program text for `code`
///
/// Every line of `code` is prefixed with the wrapper's indent so it parses
/// as a function body. Only the template's own marker is replaced; a
/// `{code}` inside the submission is left alone.
pub fn render_source(wrapper: &WrapperConfig, code: &str) -> String {
    let body = code
        .lines()
        .map(|line| format!("{}{line}", wrapper.indent))
        .collect::<Vec<_>>()
        .join("\n");
    wrapper.template.replacen(CODE_PLACEHOLDER, &body, 1)
}

/// Write the wrapped program to `Solution.<ext>` in the workspace
#[instrument(skip(workspace, language, code), fields(language = %language.name))]
pub async fn materialize(
    workspace: &Workspace,
    language: &Language,
    code: &str,
) -> Result<PathBuf, RunnerError> {
    let source = render_source(&language.wrapper, code);
    let source_name = language.source_name();
    let path = workspace.write_file(&source_name, source.as_bytes()).await?;

    debug!(source_name, len = source.len(), "materialized source");

    Ok(path)
}
