pub use super::channel::Entity as Channel;
pub use super::content_node::Entity as ContentNode;
