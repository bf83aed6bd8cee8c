pub mod allocator;
pub mod drive;
pub mod image;
