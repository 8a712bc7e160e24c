//! Tests for the template engine
//!
//! Organized into focused submodules; rendering tests run through [`Engine`]
//! over an in-memory source.

use super::*;
use crate::engine::Engine;
use crate::error::TemplateError;

// Test helper functions
mod helpers;


// Rendering tests
mod render_basic;
mod render_escaping;

// Error and edge case tests
mod errors;
