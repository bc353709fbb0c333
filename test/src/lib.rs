pub mod helpers;
pub mod story;
pub mod test_world;

pub use helpers::*;
pub use story::{story_procedures, StoryGame};
pub use test_world::{creature, TestWorld};
