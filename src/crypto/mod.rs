pub mod kdf;

pub use self::kdf::{KdfAlgorithm, KeyDerivation};
