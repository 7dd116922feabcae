pub mod queue;
pub mod shared;

pub use queue::FrameQueue;
pub use shared::SharedDisplayState;
