use crate::error::{Result, TemplateError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::consts;

/// kiln.toml schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Keep texts and renderers across renders
    #[serde(default = "default_enable_caching")]
    pub enable_caching: bool,
    /// Base directory for references that are not absolute
    #[serde(default = "default_template_root")]
    pub template_root: PathBuf,
    /// Appended to references without an extension
    #[serde(default = "default_template_extension")]
    pub template_extension: String,
    #[serde(default)]
    pub delimiters: Delimiters,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_caching: default_enable_caching(),
            template_root: default_template_root(),
            template_extension: default_template_extension(),
            delimiters: Delimiters::default(),
        }
    }
}

fn default_enable_caching() -> bool {
    true
}

fn default_template_root() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(consts::DEFAULT_TEMPLATE_DIR)
}

fn default_template_extension() -> String {
    consts::DEFAULT_TEMPLATE_EXTENSION.to_string()
}

impl EngineConfig {
    /// Parse a configuration from TOML text
    ///
    /// Missing keys take their defaults. The result is validated.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validated()
    }

    /// Read and parse a `kiln.toml` file
    ///
    /// A relative `template_root` is taken relative to the directory holding the file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if config.template_root.is_relative() {
            if let Some(dir) = path.parent() {
                config.template_root = dir.join(&config.template_root);
            }
        }
        Ok(config)
    }

    pub fn with_template_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.template_root = root.into();
        self
    }

    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.enable_caching = enabled;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.template_extension = extension.into();
        self
    }

    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Normalize the extension to carry a leading dot and check every field
    pub fn validated(mut self) -> Result<Self> {
        let extension = self.template_extension.trim();
        if extension.is_empty() || extension == "." {
            return Err(TemplateError::ConfigInvalid(
                "template_extension: must not be empty".to_string(),
            ));
        }
        self.template_extension = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{}", extension)
        };

        self.delimiters.validate()?;
        Ok(self)
    }
}

/// Directive marks
///
/// In TOML either `delimiters = { open = "<%", close = "%>" }` or
/// `delimiters = { sigil = "$" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Delimiters {
    /// Two-character open and close marks
    Pair { open: String, close: String },
    /// One character that both opens and closes a directive
    Sigil { sigil: char },
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::Pair {
            open: consts::delimiters::OPEN.to_string(),
            close: consts::delimiters::CLOSE.to_string(),
        }
    }
}

impl Delimiters {
    pub fn pair(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self::Pair {
            open: open.into(),
            close: close.into(),
        }
    }

    pub fn sigil(sigil: char) -> Self {
        Self::Sigil { sigil }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Delimiters::Pair { open, close } => {
                if open.chars().count() != 2 || close.chars().count() != 2 {
                    return Err(TemplateError::ConfigInvalid(format!(
                        "delimiters: open and close must be two characters each, got '{}' and '{}'",
                        open, close
                    )));
                }
                if open == close {
                    return Err(TemplateError::ConfigInvalid(format!(
                        "delimiters: open and close must differ, got '{}' twice (use sigil instead)",
                        open
                    )));
                }
                if open.chars().any(char::is_whitespace) || close.chars().any(char::is_whitespace)
                {
                    return Err(TemplateError::ConfigInvalid(
                        "delimiters: marks must not contain whitespace".to_string(),
                    ));
                }
            }
            Delimiters::Sigil { sigil } => {
                if sigil.is_whitespace() {
                    return Err(TemplateError::ConfigInvalid(
                        "delimiters: sigil must not be whitespace".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert!(config.enable_caching);
        assert_eq!(config.template_extension, ".kiln");
        assert_eq!(config.delimiters, Delimiters::pair("<%", "%>"));
        assert!(config.template_root.ends_with("views"));
    }

    #[test]
    fn test_parse_full_config() {
        let config = EngineConfig::from_toml_str(
            r#"
enable_caching = false
template_root = "/srv/site/templates"
template_extension = "html"
delimiters = { open = "{%", close = "%}" }
"#,
        )
        .unwrap();
        assert!(!config.enable_caching);
        assert_eq!(config.template_root, PathBuf::from("/srv/site/templates"));
        assert_eq!(config.template_extension, ".html");
        assert_eq!(config.delimiters, Delimiters::pair("{%", "%}"));
    }

    #[test]
    fn test_parse_sigil_delimiters() {
        let config = EngineConfig::from_toml_str(r#"delimiters = { sigil = "$" }"#).unwrap();
        assert_eq!(config.delimiters, Delimiters::sigil('$'));
    }

    #[test]
    fn test_reject_long_marks() {
        let result = EngineConfig::from_toml_str(r#"delimiters = { open = "<%%", close = "%>" }"#);
        assert!(matches!(result, Err(TemplateError::ConfigInvalid(_))));
    }

    #[test]
    fn test_reject_identical_marks() {
        let result = EngineConfig::from_toml_str(r###"delimiters = { open = "##", close = "##" }"###);
        assert!(matches!(result, Err(TemplateError::ConfigInvalid(_))));
    }

    #[test]
    fn test_reject_empty_extension() {
        let result = EngineConfig::from_toml_str(r#"template_extension = """#);
        assert!(matches!(result, Err(TemplateError::ConfigInvalid(_))));
    }

    #[test]
    fn test_reject_unknown_type() {
        let result = EngineConfig::from_toml_str("enable_caching = \"yes\"");
        assert!(matches!(result, Err(TemplateError::ConfigInvalid(_))));
    }

    #[test]
    fn test_load_resolves_relative_root_against_file() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("kiln.toml");
        std::fs::write(&file, "template_root = \"views\"\n").unwrap();

        let config = EngineConfig::load(&file).unwrap();
        assert_eq!(config.template_root, temp.path().join("views"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = EngineConfig::load(Path::new("/nonexistent/kiln.toml"));
        assert!(matches!(result, Err(TemplateError::Io { .. })));
    }
}
