//! Mind-map canvas rendering.
//!
//! `build_frame` turns the working copy into a display list, `hit` answers
//! pointer queries against it, and `paint` lowers it to Vello.

pub mod connection;
pub mod frame;
pub mod hit;
pub mod paint;

pub use connection::{ConnectionCurve, curve_between};
pub use frame::{ConnectionSprite, FrameInput, NodeSprite, RenderFrame, build_frame};
pub use hit::{hit_test, hit_test_connection};
pub use paint::{PaintTheme, paint_frame, view_affine};
