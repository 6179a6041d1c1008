// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod backend;
pub mod filters;
pub mod format;
pub mod ids;
pub mod model;
pub mod pills;
pub mod projection;
pub mod state;

pub use backend::*;
pub use filters::*;
pub use ids::*;
pub use model::*;
pub use pills::*;
pub use projection::*;
pub use state::*;
