mod filename_allocator;

pub use filename_allocator::{Clock, FilenameAllocator, FixedClock, SystemClock};
