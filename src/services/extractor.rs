use crate::protocol::Document;
use crate::services::DocumentExtractor;
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};

const TEXT_EXTENSIONS: [&str; 4] = ["txt", "md", "markdown", "text"];

/// Accepts inline text or base64-encoded UTF-8 text files.
///
/// Binary formats (PDF, DOCX) are rejected with an error naming the file
/// type; converting them is left to an extractor that understands them.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl DocumentExtractor for PlainTextExtractor {
    fn extract(&self, document: &Document) -> Result<String> {
        if let Some(text) = document.text.as_deref() {
            return non_empty(text);
        }

        let content = document
            .content
            .as_deref()
            .ok_or_else(|| anyhow!("document has neither `text` nor `content`"))?;

        if let Some(extension) = document
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
        {
            if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
                return Err(anyhow!("unsupported document type `.{}`", extension));
            }
        }

        let bytes = general_purpose::STANDARD
            .decode(content.trim())
            .context("content is not valid base64")?;
        let text = String::from_utf8(bytes).context("document is not UTF-8 text")?;
        non_empty(&text)
    }
}

fn non_empty(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(anyhow!("document is empty"))
    } else {
        Ok(trimmed.to_string())
    }
}
