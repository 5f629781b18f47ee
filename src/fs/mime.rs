use std::collections::HashMap;

/// Resolves a file extension to a MIME type.
pub trait MimeResolver: Send + Sync {
    /// `extension` may be given with or without its leading dot.
    fn lookup(&self, extension: &str) -> Option<String>;
}

/// Built-in extension table with optional user overrides.
#[derive(Debug, Clone, Default)]
pub struct ExtensionTable {
    overrides: HashMap<String, String>,
}

impl ExtensionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides take precedence over the built-in table. Keys are matched
    /// case-insensitively and may carry a leading dot.
    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self {
            overrides: overrides
                .into_iter()
                .map(|(ext, mime)| (normalize(&ext), mime))
                .collect(),
        }
    }

    fn builtin(ext: &str) -> Option<&'static str> {
        let mime = match ext {
            "txt" | "log" => "text/plain",
            "md" | "markdown" => "text/markdown",
            "rst" => "text/x-rst",
            "rs" => "text/x-rust",
            "py" => "text/x-python",
            "js" | "mjs" | "cjs" | "jsx" => "text/javascript",
            "ts" | "tsx" => "application/typescript",
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "scss" | "sass" => "text/x-scss",
            "json" => "application/json",
            "toml" => "application/toml",
            "yaml" | "yml" => "application/yaml",
            "xml" => "application/xml",
            "ini" | "cfg" => "text/plain",
            "sh" | "bash" | "zsh" | "fish" => "application/x-sh",
            "go" => "text/x-go",
            "java" => "text/x-java",
            "c" | "h" => "text/x-c",
            "cpp" | "cxx" | "cc" | "hpp" => "text/x-c++",
            "rb" => "text/x-ruby",
            "php" => "application/x-httpd-php",
            "lua" => "text/x-lua",
            "swift" => "text/x-swift",
            "kt" | "kts" => "text/x-kotlin",
            "sql" => "application/sql",
            "csv" => "text/csv",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "ico" => "image/vnd.microsoft.icon",
            "webp" => "image/webp",
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "ogg" => "audio/ogg",
            "flac" => "audio/flac",
            "mp4" => "video/mp4",
            "webm" => "video/webm",
            "mov" => "video/quicktime",
            "zip" => "application/zip",
            "gz" => "application/gzip",
            "tar" => "application/x-tar",
            "7z" => "application/x-7z-compressed",
            "pdf" => "application/pdf",
            "wasm" => "application/wasm",
            _ => return None,
        };
        Some(mime)
    }
}

fn normalize(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

impl MimeResolver for ExtensionTable {
    fn lookup(&self, extension: &str) -> Option<String> {
        let ext = normalize(extension);
        if ext.is_empty() {
            return None;
        }
        if let Some(mime) = self.overrides.get(&ext) {
            return Some(mime.clone());
        }
        Self::builtin(&ext).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup() {
        let table = ExtensionTable::new();
        assert_eq!(table.lookup("txt").as_deref(), Some("text/plain"));
        assert_eq!(table.lookup(".TXT").as_deref(), Some("text/plain"));
        assert_eq!(table.lookup("rs").as_deref(), Some("text/x-rust"));
        assert_eq!(table.lookup("unknownext"), None);
        assert_eq!(table.lookup(""), None);
        assert_eq!(table.lookup("."), None);
    }

    #[test]
    fn overrides_win() {
        let mut overrides = HashMap::new();
        overrides.insert(".TXT".to_string(), "text/x-notes".to_string());
        overrides.insert("tngl".to_string(), "application/x-tangle".to_string());
        let table = ExtensionTable::with_overrides(overrides);
        assert_eq!(table.lookup("txt").as_deref(), Some("text/x-notes"));
        assert_eq!(table.lookup("tngl").as_deref(), Some("application/x-tangle"));
        assert_eq!(table.lookup("md").as_deref(), Some("text/markdown"));
    }
}
