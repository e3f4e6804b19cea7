//! # Geometry Engine
//!
//! Turns a failure circle, a terrain profile, a stratum and an optional water
//! table into a [`SliceSet`] ready for the equilibrium solvers.
//!
//! - [`circle`] - `FailureCircle` and pointwise circle operations
//! - [`profile`] - `TerrainProfile` polyline and interpolation
//! - [`slices`] - `Slice`, `SliceSet` and the discretization itself

pub mod circle;
pub mod profile;
pub mod slices;

pub use circle::{arc_length, base_angle, circle_y, CircleBranch, FailureCircle};
pub use profile::{interpolate_terrain, TerrainProfile};
pub use slices::{build_slices, pore_pressure, slice_height, Slice, SliceGeometry, SliceSet, MIN_SLICES};
