pub mod source;
pub mod store;

pub use source::JsonMeetingPool;
pub use store::FilePendingStore;
