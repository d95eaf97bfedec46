pub mod hit;
pub mod paint;

pub use hit::{hit_test, hit_test_handle};
pub use paint::{VelloSurface, paint_scene};
