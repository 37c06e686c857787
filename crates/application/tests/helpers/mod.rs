#![allow(dead_code)]

mod builders;
mod mock_forwarder;

pub use builders::*;
pub use mock_forwarder::MockForwarder;
