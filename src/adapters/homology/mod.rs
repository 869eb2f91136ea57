//! Homology backend adapters.

mod rips;

pub use rips::VietorisRips;
