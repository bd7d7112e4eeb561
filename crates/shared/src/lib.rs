//! Selection and resolution core for the mangrove layer dashboard.
//!
//! Two dependent selectors (mode, then year or year pair) resolve against
//! static catalogs into an asset reference plus its visualization and
//! legend. [`coordinator::RenderCoordinator`] drives the cycle and turns
//! each UI event into render instructions.

pub mod catalog;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod legend;
pub mod models;
pub mod render;
pub mod resolve;
pub mod view;

pub use catalog::Catalog;
pub use coordinator::{RenderCoordinator, RenderInstruction, UiEvent};
pub use error::{CatalogError, CoreError};
