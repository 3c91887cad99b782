//! Module providing the pathway data model: entities, combinations, reactions and
//! reaction connections.

pub mod combination;
pub mod entity;
pub mod model;
pub mod reaction;
