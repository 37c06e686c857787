mod blacklist_matcher;
mod response_synthesizer;

pub use blacklist_matcher::BlacklistMatcher;
pub use response_synthesizer::ResponseSynthesizer;
