// HTTP routes
pub mod health;
pub mod postings;
pub mod scrapes;
pub mod stream;

pub use health::*;
pub use postings::*;
pub use scrapes::*;
pub use stream::*;
