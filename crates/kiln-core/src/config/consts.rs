//! Default values shared by the configuration model and the engine

/// Subdirectory of the working directory used as the template root
pub const DEFAULT_TEMPLATE_DIR: &str = "views";

/// Extension appended to references that have none
pub const DEFAULT_TEMPLATE_EXTENSION: &str = ".kiln";

/// Default directive marks
pub mod delimiters {
    pub const OPEN: &str = "<%";
    pub const CLOSE: &str = "%>";
}
