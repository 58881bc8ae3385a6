//! Image operations: pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` (PNG codec) |
//! | **Alpha mask, flatten** | [`RustBackend`] on `image::RgbaImage` |
//! | **Engraving** | SVG overlay rasterised by `resvg` / `usvg` |
//! | **QR stamp** | `qrcode` module matrix, nearest-neighbour scaling |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for overlay geometry (unit testable)
//! - **Parameters**: Data structures describing decorator settings
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **Decorators**: [`engrave`] and [`stamp_qr`], applied after compositing

pub mod backend;
pub mod calculations;
pub mod engrave;
mod overlay;
mod params;
pub mod qr;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, RasterBackend};
pub use engrave::engrave;
pub use overlay::DecorationError;
pub use params::{EngravingParams, QrParams};
pub use qr::{render_qr, stamp_qr};
pub use rust_backend::{RustBackend, decode_png, encode_png};
