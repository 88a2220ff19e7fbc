pub mod prelude;

pub mod channel;
pub mod content_node;
