//! # Random Number Generation
//!
//! Every simulated path owns an independent random stream keyed by
//! `(seed, path_index)`. A path's draws therefore never depend on which
//! worker simulated it or on how many paths were simulated before it,
//! and a bumped rerun of the same path sees the same draws.
//!
//! ## Usage Example
//!
//! ```rust
//! use voltarget_pricing::rng::PathRng;
//!
//! let mut a = PathRng::for_path(42, 7);
//! let mut b = PathRng::for_path(42, 7);
//! assert_eq!(a.gen_normal(), b.gen_normal());
//! ```

pub mod prng;

pub use prng::PathRng;
