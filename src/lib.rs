//! Generate random strings from regular expressions.
//!
//! A pattern produces strings that match it. Placing the `\i` marker in a
//! pattern instead produces strings that must *not* match: one of the marked
//! pieces is chosen at random and made to break its own syntax while the rest
//! of the pattern is generated normally.
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let phone = regex_gen::generate("\\d{3}-\\d{4}", &mut rng).unwrap();
//! assert_eq!(phone.len(), 8);
//!
//! let pattern = regex_gen::Pattern::compile("[a-z]+@\\i[a-z]+").unwrap();
//! let bad = pattern.generate(&mut rng, &regex_gen::GenConfig::default()).unwrap();
//! assert!(!pattern.is_full_match(&bad));
//! ```

pub mod ast;
pub mod charset;
pub mod compiler;
pub mod config;
pub mod error;
pub mod generator;
pub mod parser;
pub mod posix;
pub mod regex_gen;
pub mod select;
pub mod vm;

pub use config::{BackrefMode, DEFAULT_REPEAT_SLACK, GenConfig};
pub use error::GenError;
pub use regex_gen::{Pattern, RegexGen, generate, generate_with};
