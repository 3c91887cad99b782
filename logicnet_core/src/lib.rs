//! Core rust implementation of logicnet, a crate for turning biological pathways into logic
//! networks of elementary entity transformations.

pub mod configuration;
pub mod decompose;
pub mod io;
pub mod network;
pub mod optimize;
pub mod pathway;
