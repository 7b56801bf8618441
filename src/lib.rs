//! Transmark - i18n marker rewriter with on-demand machine translation
//!
//! Transmark rewrites `i18n.s('phrase', 'namespace')` marker calls in
//! JavaScript and TypeScript sources into `i18n.t('namespace:key')` key
//! references, translates phrases it has not seen before, and keeps a
//! source-language and a target-language locale file in sync.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (`build`, `sync`, `watch`, `init`)
//! - `config`: Configuration file loading and validation
//! - `core`: Rewriter, namespace index, translation coordinator and reconciler
//! - `error`: Error taxonomy shared by the core engines
//! - `translate`: Machine translation providers

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod translate;

pub use error::{Error, Result};
