//! Input/output helpers.
//!
//! - on-disk input layout (`layout`)
//! - JSON-lines record streams (`stream`)
//! - input validation (`ingest`)
//! - event assembly across inputs (`source`)
//! - result exports (JSON/CSV) (`export`)

pub mod export;
pub mod ingest;
pub mod layout;
pub mod source;
pub mod stream;

pub use export::*;
pub use ingest::*;
pub use layout::InputLayout;
pub use source::*;
pub use stream::*;
