pub mod cell_frame;
pub mod color;
pub mod frame;
pub mod palette;
